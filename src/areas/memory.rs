use crate::areas::object_store::{ObjectStore, RawObject};
use crate::artifacts::objects::object::{hash_body, Object};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use std::collections::HashMap;

/// Object store kept entirely in memory
///
/// Used for tests and by embedders that already hold their objects.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    objects: HashMap<ObjectId, RawObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize and insert an object, returning its id
    pub fn insert(&mut self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let body = object.serialize_body()?;
        Ok(self.insert_raw(object.object_type(), body))
    }

    /// Insert an already serialized body under its content hash
    pub fn insert_raw(&mut self, object_type: ObjectType, body: impl Into<Bytes>) -> ObjectId {
        let body = body.into();
        let oid = hash_body(object_type, &body);
        self.objects.insert(oid, RawObject::new(object_type, body));
        oid
    }

    /// Store a body under an arbitrary id, bypassing the content hash
    ///
    /// Lets tests model corrupt or mislabelled objects.
    pub fn insert_unchecked(&mut self, oid: ObjectId, object_type: ObjectType, body: impl Into<Bytes>) {
        self.objects.insert(oid, RawObject::new(object_type, body.into()));
    }

    pub fn remove(&mut self, oid: &ObjectId) -> Option<RawObject> {
        self.objects.remove(oid)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryStore {
    fn load(&self, oid: &ObjectId) -> anyhow::Result<Option<RawObject>> {
        Ok(self.objects.get(oid).cloned())
    }

    fn contains(&self, oid: &ObjectId) -> anyhow::Result<bool> {
        Ok(self.objects.contains_key(oid))
    }
}
