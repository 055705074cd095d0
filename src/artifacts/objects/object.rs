use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub trait Packable {
    /// Serialize the object body, without the `<type> <size>\0` header
    fn serialize_body(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    /// Parse the object body; the loose-object header has already been read
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    /// Full loose-object form: header followed by the body
    fn serialize(&self) -> Result<Bytes> {
        let body = self.serialize_body()?;

        let mut object_bytes = Vec::with_capacity(body.len() + 16);
        let header = format!("{} {}\0", self.object_type().as_str(), body.len());
        object_bytes.write_all(header.as_bytes())?;
        object_bytes.write_all(&body)?;

        Ok(Bytes::from(object_bytes))
    }

    // TODO: Cache the object serialization and ID to avoid recomputing them
    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        Ok(hash_object(&content))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// SHA-1 of a full loose-object serialization
pub fn hash_object(content: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(content);
    ObjectId::from_raw(hasher.finalize().into())
}

/// SHA-1 of a body once the loose-object header is prepended
pub fn hash_body(object_type: ObjectType, body: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {}\0", object_type.as_str(), body.len()).as_bytes());
    hasher.update(body);
    ObjectId::from_raw(hasher.finalize().into())
}
