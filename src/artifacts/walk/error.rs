use crate::areas::object_store::ObjectStore;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;

/// Errors surfaced by the walkers
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("missing {} {oid}", .expected.map_or("object", |t| t.as_str()))]
    MissingObject {
        oid: ObjectId,
        expected: Option<ObjectType>,
    },

    #[error("object {oid} is a {actual}, expected a {expected}")]
    IncorrectType {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("corrupt {object_type} {oid}: {reason}")]
    CorruptObject {
        oid: ObjectId,
        object_type: ObjectType,
        reason: String,
    },

    #[error("no free flag left for {name:?}")]
    FlagsExhausted { name: String },

    #[error("walk already started; reset it first")]
    WalkStarted,

    #[error("unsupported filter combination: {0}")]
    UnsupportedFilter(String),

    #[error("object store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl WalkError {
    pub(crate) fn corrupt(oid: ObjectId, object_type: ObjectType, reason: impl std::fmt::Display) -> Self {
        WalkError::CorruptObject {
            oid,
            object_type,
            reason: reason.to_string(),
        }
    }
}

/// Non-local exits of a generator stage
///
/// `Stop` ends the walk early and never reaches callers; stages and the
/// façade turn it into end-of-output.
#[derive(Debug)]
pub(crate) enum Interrupt {
    Stop,
    Failed(WalkError),
}

impl From<WalkError> for Interrupt {
    fn from(err: WalkError) -> Self {
        Interrupt::Failed(err)
    }
}

/// Load an object that must exist with the given type, returning its body
pub(crate) fn load_expected(
    store: &dyn ObjectStore,
    oid: &ObjectId,
    expected: ObjectType,
) -> Result<Bytes, WalkError> {
    let raw = store.load(oid)?.ok_or(WalkError::MissingObject {
        oid: *oid,
        expected: Some(expected),
    })?;

    if raw.object_type != expected {
        return Err(WalkError::IncorrectType {
            oid: *oid,
            expected,
            actual: raw.object_type,
        });
    }

    Ok(raw.data)
}
