//! Persistent participant identity.
//!
//! # Invariants
//! - A participant id, once persisted, is reused by every later session
//!   opened on the same database until the entry is cleared.
//! - Display names are trimmed and never blank.

use crate::db::DbError;
use crate::model::participant::ParticipantId;
use crate::storage::kv::KvStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const PARTICIPANT_ID_KEY: &str = "stickysync.participant_id";
pub const DISPLAY_NAME_KEY: &str = "stickysync.display_name";

#[derive(Debug)]
pub enum IdentityError {
    /// Display name is blank after trim.
    BlankDisplayName,
    Db(DbError),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankDisplayName => write!(f, "display name must not be blank"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BlankDisplayName => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for IdentityError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Who the local participant is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub participant_id: ParticipantId,
    pub display_name: String,
}

/// Reads the persisted identity, if both keys are present.
pub fn load_identity(kv: &KvStore<'_>) -> Result<Option<Identity>, IdentityError> {
    let participant_id = kv.get(PARTICIPANT_ID_KEY)?;
    let display_name = kv.get(DISPLAY_NAME_KEY)?;
    Ok(match (participant_id, display_name) {
        (Some(id), Some(name)) => Some(Identity {
            participant_id: ParticipantId::new(id),
            display_name: name,
        }),
        _ => None,
    })
}

/// Reuses the persisted participant id (or creates one) and stores
/// `display_name` as the current name.
pub fn load_or_create_identity(
    kv: &KvStore<'_>,
    display_name: &str,
) -> Result<Identity, IdentityError> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(IdentityError::BlankDisplayName);
    }

    let participant_id = match kv.get(PARTICIPANT_ID_KEY)? {
        Some(existing) => ParticipantId::new(existing),
        None => {
            let created = ParticipantId::generate();
            kv.put(PARTICIPANT_ID_KEY, created.as_str())?;
            info!(
                "event=identity_create module=storage status=ok participant_id={}",
                created
            );
            created
        }
    };
    kv.put(DISPLAY_NAME_KEY, display_name)?;

    Ok(Identity {
        participant_id,
        display_name: display_name.to_string(),
    })
}

/// Removes the persisted identity (the "storage clear" path).
pub fn clear_identity(kv: &KvStore<'_>) -> Result<(), IdentityError> {
    kv.delete(PARTICIPANT_ID_KEY)?;
    kv.delete(DISPLAY_NAME_KEY)?;
    Ok(())
}
