use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned update sequence id.
///
/// `UpdateId(0)` doubles as "no acknowledgement yet" for the cursor.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UpdateId(pub i64);

impl UpdateId {
    pub const ZERO: UpdateId = UpdateId(0);

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The offset that asks the server for everything strictly after this id.
    ///
    /// Saturates at `i64::MAX` rather than overflowing on a corrupt stored offset.
    pub fn next(self) -> UpdateId {
        UpdateId(self.0.saturating_add(1))
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// User id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Message id, unique within a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);
