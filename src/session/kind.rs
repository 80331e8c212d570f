//! Session kinds.
//!
//! Two kinds of session share one read/write surface:
//! - Common: Writes go straight to the store and are visible to everyone
//! - Dedicated: Writes are buffered privately until commit or rollback

use std::fmt;

use serde::{Deserialize, Serialize};

/// Session kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionKind {
    /// Shared session.
    ///
    /// Every write is applied to the store as soon as the call returns and
    /// is immediately visible to all other sessions. `commit` and `rollback`
    /// are no-ops.
    #[default]
    Common,

    /// Isolated, transactional session.
    ///
    /// Writes accumulate in a private overlay. This session reads the
    /// committed store plus its own overlay; every other session reads the
    /// committed store only. `commit` publishes the overlay, `rollback`
    /// discards it.
    Dedicated,
}

impl SessionKind {
    /// Check if writes in this kind of session are buffered.
    pub fn is_isolated(&self) -> bool {
        matches!(self, SessionKind::Dedicated)
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Common => write!(f, "COMMON"),
            SessionKind::Dedicated => write!(f, "DEDICATED"),
        }
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COMMON" | "SHARED" => Ok(SessionKind::Common),
            "DEDICATED" => Ok(SessionKind::Dedicated),
            _ => Err(format!("unknown session kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kind() {
        assert_eq!(SessionKind::default(), SessionKind::Common);
    }

    #[test]
    fn test_is_isolated() {
        assert!(!SessionKind::Common.is_isolated());
        assert!(SessionKind::Dedicated.is_isolated());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("common".parse::<SessionKind>().unwrap(), SessionKind::Common);
        assert_eq!("DEDICATED".parse::<SessionKind>().unwrap(), SessionKind::Dedicated);
        assert!("private".parse::<SessionKind>().is_err());
    }
}
