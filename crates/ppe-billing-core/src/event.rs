//! Billable event kinds and the price table.
//!
//! Event kinds are validated-string newtypes rather than open strings:
//! malformed identifiers are rejected at the wire boundary instead of
//! falling through accounting logic as perpetual "not found" lookups.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::money::Usd;

/// Identifier of a billable event kind (e.g. `"extract-default"`).
///
/// Non-empty ASCII alphanumerics plus `-`, `_` and `.`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventKind(String);

impl EventKind {
    /// Validate and create an event kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty or contains a character
    /// outside `[A-Za-z0-9._-]`.
    pub fn new(kind: impl Into<String>) -> Result<Self, EventKindError> {
        let kind = kind.into();
        if kind.is_empty() {
            return Err(EventKindError::Empty);
        }
        if let Some(ch) = kind
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(EventKindError::InvalidCharacter(ch));
        }
        Ok(Self(kind))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EventKind {
    type Err = EventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EventKind {
    type Error = EventKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.0
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKind({})", self.0)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when parsing an event kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventKindError {
    /// The identifier is empty.
    #[error("event kind must not be empty")]
    Empty,

    /// The identifier contains a disallowed character.
    #[error("event kind contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Price configuration for one registered event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPrice {
    /// Human-readable event title, carried into ledger entries.
    pub title: String,

    /// Price charged per unit of this event.
    pub price: Usd,
}

/// Immutable mapping from event kind to its price configuration.
///
/// Built once at initialization from the run snapshot. Only kinds present
/// here are billable; any other kind is unregistered and always free.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    events: HashMap<EventKind, EventPrice>,
}

impl PriceTable {
    /// Create a price table from registered events.
    #[must_use]
    pub fn new(events: HashMap<EventKind, EventPrice>) -> Self {
        Self { events }
    }

    /// An empty table: every event is unregistered and free.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up the price configuration for an event kind.
    #[must_use]
    pub fn get(&self, kind: &EventKind) -> Option<&EventPrice> {
        self.events.get(kind)
    }

    /// Whether the event kind is registered for billing.
    #[must_use]
    pub fn is_registered(&self, kind: &EventKind) -> bool {
        self.events.contains_key(kind)
    }

    /// Iterate over all registered events.
    pub fn iter(&self) -> impl Iterator<Item = (&EventKind, &EventPrice)> {
        self.events.iter()
    }

    /// Number of registered event kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<(EventKind, EventPrice)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (EventKind, EventPrice)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
