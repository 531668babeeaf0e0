use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Error returned when parsing an identifier from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was blank.
    #[error("identifier must not be empty")]
    Empty,
}

fn generate() -> String {
    // UUID version 7 keeps identifiers roughly sorted by creation time.
    Uuid::now_v7().to_string()
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(generate())
            }

            /// Borrow the textual form.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(IdError::Empty);
                }
                Ok(Self(trimmed.to_owned()))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                s.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(d: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a task group.
    GroupId
);
opaque_id!(
    /// Identifier of a task.
    TaskId
);
opaque_id!(
    /// Identifier of a subtask, unique within its parent task.
    SubtaskId
);
opaque_id!(
    /// Identifier of a description entry on a task.
    EntryId
);
opaque_id!(
    /// Identifier of a tag.
    TagId
);
opaque_id!(
    /// Identifier of a note.
    NoteId
);
opaque_id!(
    /// Identifier of a music mood.
    MoodId
);
opaque_id!(
    /// Identifier of a song.
    SongId
);
