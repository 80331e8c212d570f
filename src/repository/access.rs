//! Repository access modes.
//!
//! The access mode decides what `initialize` does with the named store:
//! - RENEW: Drop whatever is there and start empty
//! - CREATE: Create the store, refusing to touch an existing one
//! - OPEN: Attach to an existing store, never create
//! - ACCESS: Attach, creating the store first if it is missing

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a repository handle attaches to its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessMode {
    /// Delete an existing store of the same name, then create it fresh.
    ///
    /// Delete and create are two separate catalog calls. Another client
    /// working with the same store sees it vanish and come back empty.
    #[serde(alias = "renew")]
    Renew,

    /// Create a new store. Fails if the name is taken.
    #[serde(alias = "create")]
    Create,

    /// Attach to an existing store. Fails if there is none.
    #[serde(alias = "open")]
    Open,

    /// Attach to the store, creating it when missing.
    #[serde(alias = "access")]
    Access,
}

impl AccessMode {
    /// Every mode, in declaration order.
    pub const ALL: [AccessMode; 4] = [
        AccessMode::Renew,
        AccessMode::Create,
        AccessMode::Open,
        AccessMode::Access,
    ];

    /// Check if federated sources can be configured under this mode.
    ///
    /// A federation is always a new store, so only modes that are
    /// guaranteed to create one qualify.
    pub fn allows_federation(&self) -> bool {
        matches!(self, AccessMode::Create | AccessMode::Renew)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Renew => write!(f, "RENEW"),
            AccessMode::Create => write!(f, "CREATE"),
            AccessMode::Open => write!(f, "OPEN"),
            AccessMode::Access => write!(f, "ACCESS"),
        }
    }
}

impl std::str::FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RENEW" => Ok(AccessMode::Renew),
            "CREATE" => Ok(AccessMode::Create),
            "OPEN" => Ok(AccessMode::Open),
            "ACCESS" => Ok(AccessMode::Access),
            _ => Err(format!("unknown access mode: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_access_mode() {
        assert_eq!("RENEW".parse::<AccessMode>().unwrap(), AccessMode::Renew);
        assert_eq!("create".parse::<AccessMode>().unwrap(), AccessMode::Create);
        assert_eq!(" Open ".parse::<AccessMode>().unwrap(), AccessMode::Open);
        assert_eq!("access".parse::<AccessMode>().unwrap(), AccessMode::Access);
        assert!("append".parse::<AccessMode>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for mode in AccessMode::ALL {
            assert_eq!(mode.to_string().parse::<AccessMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_value_equality() {
        // Modes built independently compare equal by value.
        let parsed: AccessMode = String::from("renew").parse().unwrap();
        assert_eq!(parsed, AccessMode::Renew);
        assert_ne!(parsed, AccessMode::Create);
    }

    #[test]
    fn test_federation_modes() {
        assert!(AccessMode::Create.allows_federation());
        assert!(AccessMode::Renew.allows_federation());
        assert!(!AccessMode::Open.allows_federation());
        assert!(!AccessMode::Access.allows_federation());
    }

    #[test]
    fn test_serde_names() {
        let mode: AccessMode = serde_json::from_str("\"RENEW\"").unwrap();
        assert_eq!(mode, AccessMode::Renew);
        let mode: AccessMode = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(mode, AccessMode::Access);
        assert_eq!(serde_json::to_string(&AccessMode::Open).unwrap(), "\"OPEN\"");
    }
}
