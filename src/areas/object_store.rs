use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;

/// An object as handed out by a store: its type and its body, without the
/// `<type> <size>\0` header
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct RawObject {
    pub object_type: ObjectType,
    pub data: Bytes,
}

/// Read side of a content-addressed object store
///
/// The walker only ever reads through this trait; it never writes.
pub trait ObjectStore {
    /// Load an object, `Ok(None)` when the store has no such id
    fn load(&self, oid: &ObjectId) -> anyhow::Result<Option<RawObject>>;

    fn contains(&self, oid: &ObjectId) -> anyhow::Result<bool> {
        Ok(self.load(oid)?.is_some())
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn load(&self, oid: &ObjectId) -> anyhow::Result<Option<RawObject>> {
        (**self).load(oid)
    }

    fn contains(&self, oid: &ObjectId) -> anyhow::Result<bool> {
        (**self).contains(oid)
    }
}

impl std::fmt::Debug for dyn ObjectStore + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ObjectStore")
    }
}
