//! Git annotated tag object
//!
//! ## Format
//!
//! On disk:
//! ```text
//! tag <size>\0
//! object <target-sha>
//! type <target-type>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```

use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Tag {
    target: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Option<Author>,
    message: String,
}

impl Tag {
    pub fn target(&self) -> ObjectId {
        self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Packable for Tag {
    fn serialize_body(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(self.display()))
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        let mut lines = vec![
            format!("object {}", self.target),
            format!("type {}", self.target_type),
            format!("tag {}", self.name),
        ];
        if let Some(tagger) = &self.tagger {
            lines.push(format!("tagger {}", tagger.display()));
        }
        lines.push(String::new());
        lines.push(self.message.clone());

        lines.join("\n")
    }
}

/// The parts of a tag body the walker needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagHeader {
    pub target: ObjectId,
    pub target_type: ObjectType,
    pub name: String,
}

impl TagHeader {
    pub fn parse(body: &[u8]) -> anyhow::Result<Self> {
        let mut lines = body.split(|b| *b == b'\n');

        let target = lines
            .next()
            .and_then(|line| line.strip_prefix(b"object "))
            .context("Invalid tag object: missing object line")?;
        let target = ObjectId::try_parse_hex_bytes(target)
            .context("Invalid tag object: invalid object id")?;

        let target_type = lines
            .next()
            .and_then(|line| line.strip_prefix(b"type "))
            .context("Invalid tag object: missing type line")?;
        let target_type = ObjectType::try_from(std::str::from_utf8(target_type)?)?;

        let name = lines
            .next()
            .and_then(|line| line.strip_prefix(b"tag "))
            .context("Invalid tag object: missing tag line")?;
        let name = String::from_utf8(name.to_vec())?;

        Ok(TagHeader {
            target,
            target_type,
            name,
        })
    }
}
