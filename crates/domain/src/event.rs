//! Event: an immutable telemetry record emitted by a simulated device.
//!
//! Events serialize with `PascalCase` keys and a numeric `EventType`, which is
//! the shape the receiving API expects.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{CorrelationId, MessageId};
use crate::time::{self, Timestamp};
use crate::user::User;

/// Event name emitted when a token is presented at a reader.
pub const READ: &str = "Read";
/// Event name emitted when a portal is passed through.
pub const PORTAL_ENTRY_USED: &str = "PortalEntryUsed";

/// Well-known keys of [`Event::contents`].
pub mod fields {
    pub const PERSON_ID: &str = "PersonId";
    pub const TOKEN_ID: &str = "TokenId";
    pub const TOKEN_DATA: &str = "TokenData";
    pub const READER_ID: &str = "ReaderId";
    pub const RESULT: &str = "Result";

    pub const RESULT_SUCCESS: &str = "Success";
}

/// Classification of an event, sent on the wire as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EventType {
    #[default]
    Plain,
    CommandResponse,
    StateChange,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown event type code {0}")]
pub struct UnknownEventType(u8);

impl From<EventType> for u8 {
    fn from(value: EventType) -> Self {
        match value {
            EventType::Plain => 0,
            EventType::CommandResponse => 1,
            EventType::StateChange => 2,
        }
    }
}

impl TryFrom<u8> for EventType {
    type Error = UnknownEventType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Plain),
            1 => Ok(Self::CommandResponse),
            2 => Ok(Self::StateChange),
            other => Err(UnknownEventType(other)),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("Plain"),
            Self::CommandResponse => f.write_str("CommandResponse"),
            Self::StateChange => f.write_str("StateChange"),
        }
    }
}

/// Reference to the subject of an event, e.g. `Hardware.Reader:R1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef<'a> {
    Reader(&'a str),
    Portal(&'a str),
    User(&'a str),
    Token(&'a str),
}

impl fmt::Display for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader(id) => write!(f, "Hardware.Reader:{id}"),
            Self::Portal(id) => write!(f, "AccessControl.Portal:{id}"),
            Self::User(id) => write!(f, "AccessControl.User:{id}"),
            Self::Token(id) => write!(f, "AccessControl.Token:{id}"),
        }
    }
}

/// A single telemetry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    pub message_id: MessageId,
    pub correlation_id: CorrelationId,
    pub previous_message_id: Option<MessageId>,
    #[serde(rename = "TimeStamp")]
    pub timestamp: Timestamp,
    pub entity: String,
    pub event_name: String,
    pub diag_event: bool,
    pub event_type: EventType,
    pub contents: BTreeMap<String, String>,
}

impl Event {
    /// Create a plain event with fresh message and correlation ids.
    #[must_use]
    pub fn new(entity: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            message_id: MessageId::new(),
            correlation_id: CorrelationId::new(),
            previous_message_id: None,
            timestamp: time::now(),
            entity: entity.into(),
            event_name: event_name.into(),
            diag_event: false,
            event_type: EventType::Plain,
            contents: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_content(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.contents.insert(key.into(), value.into());
        self
    }

    /// Look up a content field by key.
    #[must_use]
    pub fn content(&self, key: &str) -> Option<&str> {
        self.contents.get(key).map(String::as_str)
    }

    /// A successful token read at `reader_id`.
    #[must_use]
    pub fn read(reader_id: &str, user: &User) -> Self {
        Self::new(EntityRef::Reader(reader_id).to_string(), READ).with_credential(user)
    }

    /// A successful entry through `portal_id` granted by `reader_id`.
    ///
    /// Carries its own correlation id; it is not linked to the preceding
    /// [`Event::read`].
    #[must_use]
    pub fn portal_entry_used(portal_id: &str, reader_id: &str, user: &User) -> Self {
        Self::new(EntityRef::Portal(portal_id).to_string(), PORTAL_ENTRY_USED)
            .with_credential(user)
            .with_content(fields::READER_ID, EntityRef::Reader(reader_id).to_string())
    }

    fn with_credential(self, user: &User) -> Self {
        self.with_content(fields::PERSON_ID, EntityRef::User(&user.user_id).to_string())
            .with_content(fields::TOKEN_ID, EntityRef::Token(&user.token_id).to_string())
            .with_content(fields::TOKEN_DATA, user.token_data.clone())
            .with_content(fields::RESULT, fields::RESULT_SUCCESS)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.entity, self.event_name, self.event_type)
    }
}
