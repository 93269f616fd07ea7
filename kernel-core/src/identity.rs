//! Identity types for kernel entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Trait for type-safe entity IDs.
///
/// Ensures IDs for different entity kinds cannot be accidentally mixed up.
pub trait EntityIdType:
    Copy
    + Clone
    + Eq
    + PartialEq
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr
    + Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const ENTITY_NAME: &'static str;

    fn new(uuid: Uuid) -> Self;
    fn as_uuid(&self) -> Uuid;

    fn nil() -> Self {
        Self::new(Uuid::nil())
    }

    /// Timestamp-sortable ID, used for every entity created at runtime.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }
}

/// Error parsing an entity ID from a string.
#[derive(Debug, Clone)]
pub struct EntityIdParseError {
    pub entity_name: &'static str,
    pub input: String,
    pub source: uuid::Error,
}

impl fmt::Display for EntityIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to parse {} ID from '{}': {}",
            self.entity_name, self.input, self.source
        )
    }
}

impl std::error::Error for EntityIdParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

macro_rules! define_entity_id {
    ($name:ident, $entity:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = EntityIdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self::new).map_err(|e| EntityIdParseError {
                    entity_name: Self::ENTITY_NAME,
                    input: s.to_string(),
                    source: e,
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Uuid::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

define_entity_id!(AssertionId, "assertion", "Type-safe ID for assertions.");
define_entity_id!(RuleId, "rule", "Type-safe ID for rules.");
define_entity_id!(NoteId, "note", "Type-safe ID for notes.");

/// Partition label for assertions. Four values are reserved by the kernel
/// (`global-kb`, `system`, `api-inbox`, `api-outbox`); every other `KbId`
/// names a per-note KB keyed by that note's ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KbId(pub String);

impl KbId {
    pub const GLOBAL: &'static str = "global-kb";
    pub const SYSTEM: &'static str = "system";
    pub const API_INBOX: &'static str = "api-inbox";
    pub const API_OUTBOX: &'static str = "api-outbox";

    pub fn global() -> Self {
        KbId(Self::GLOBAL.to_string())
    }

    pub fn system() -> Self {
        KbId(Self::SYSTEM.to_string())
    }

    pub fn api_inbox() -> Self {
        KbId(Self::API_INBOX.to_string())
    }

    pub fn api_outbox() -> Self {
        KbId(Self::API_OUTBOX.to_string())
    }

    pub fn for_note(note_id: &NoteId) -> Self {
        KbId(note_id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for KbId {
    fn from(s: &str) -> Self {
        KbId(s.to_string())
    }
}

impl From<String> for KbId {
    fn from(s: String) -> Self {
        KbId(s)
    }
}
