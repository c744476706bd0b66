#![forbid(unsafe_code)]

//! Inbound notifications from the remote store and the connection.

use std::fmt;

use lifeview_core::{AliveCell, Identity, Player, SimConfig, TableRow};

/// One row-level notification, carrying full rows.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent<T> {
    Insert(T),
    Update { old: T, new: T },
    Delete(T),
}

impl<T: TableRow> TableEvent<T> {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update { .. } => "update",
            Self::Delete(_) => "delete",
        }
    }
}

/// A notification routed to the table it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum TableUpdate {
    Cells(TableEvent<AliveCell>),
    Players(TableEvent<Player>),
    Config(TableEvent<SimConfig>),
}

impl TableUpdate {
    /// Remote table name.
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Cells(_) => AliveCell::TABLE,
            Self::Players(_) => Player::TABLE,
            Self::Config(_) => SimConfig::TABLE,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Cells(e) => e.kind(),
            Self::Players(e) => e.kind(),
            Self::Config(e) => e.kind(),
        }
    }
}

impl From<TableEvent<AliveCell>> for TableUpdate {
    fn from(event: TableEvent<AliveCell>) -> Self {
        Self::Cells(event)
    }
}

impl From<TableEvent<Player>> for TableUpdate {
    fn from(event: TableEvent<Player>) -> Self {
        Self::Players(event)
    }
}

impl From<TableEvent<SimConfig>> for TableUpdate {
    fn from(event: TableEvent<SimConfig>) -> Self {
        Self::Config(event)
    }
}

/// Ordered notifications committed together remotely.
///
/// Applied as one burst: at most one redraw follows, after the last event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub events: Vec<TableUpdate>,
}

impl TransactionUpdate {
    #[must_use]
    pub fn new(events: Vec<TableUpdate>) -> Self {
        Self { events }
    }

    pub fn push(&mut self, event: impl Into<TableUpdate>) {
        self.events.push(event.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Connection lifecycle as seen by the view.
///
/// Mirrors keep their last contents in every state; a disconnect shows stale
/// data rather than an empty board.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected { identity: Identity },
    Failed { error: String },
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Connected { identity } => Some(identity),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected { .. } => "connected",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { identity } => write!(f, "connected as {identity:?}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
            other => f.write_str(other.as_str()),
        }
    }
}
