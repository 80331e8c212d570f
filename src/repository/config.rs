//! Repository configuration.
//!
//! A [`RepositoryConfig`] is everything a handle needs before it attaches:
//! the store name, the access mode, optional federation members and inlined
//! type mappings. It can be built in code or loaded from JSON:
//!
//! ```json
//! {
//!   "name": "rainbow",
//!   "access_mode": "RENEW",
//!   "federated_sources": ["red", "green"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::access::AccessMode;
use super::error::{RepositoryError, RepositoryResult};
use crate::catalog::StoreName;

/// Internal encodings the server can use for literal objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InlinedType {
    Int,
    Float,
    #[serde(alias = "date-time")]
    DateTime,
}

impl InlinedType {
    /// Name of the encoding as the server spells it.
    pub fn server_name(&self) -> &'static str {
        match self {
            InlinedType::Int => "int",
            InlinedType::Float => "float",
            InlinedType::DateTime => "date-time",
        }
    }
}

impl fmt::Display for InlinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.server_name())
    }
}

impl std::str::FromStr for InlinedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "int" => Ok(InlinedType::Int),
            "float" => Ok(InlinedType::Float),
            "datetime" | "date-time" => Ok(InlinedType::DateTime),
            _ => Err(format!(
                "unknown inlined type '{}'; legal types are 'int', 'float' and 'datetime'",
                s
            )),
        }
    }
}

/// Repository configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Name of the store in the catalog.
    pub name: StoreName,
    /// What `initialize` does with the store.
    pub access_mode: AccessMode,
    /// Members of a federated store. Empty for a plain store.
    #[serde(default)]
    pub federated_sources: BTreeSet<StoreName>,
    /// Predicates whose objects use an inlined encoding.
    #[serde(default)]
    pub inlined_predicates: BTreeMap<String, InlinedType>,
    /// Datatypes whose literals use an inlined encoding.
    #[serde(default)]
    pub inlined_datatypes: BTreeMap<String, InlinedType>,
}

impl RepositoryConfig {
    /// Create a new configuration for the given store.
    pub fn new(name: StoreName, access_mode: AccessMode) -> Self {
        Self {
            name,
            access_mode,
            federated_sources: BTreeSet::new(),
            inlined_predicates: BTreeMap::new(),
            inlined_datatypes: BTreeMap::new(),
        }
    }

    /// Add federation members.
    pub fn federated_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = StoreName>,
    {
        self.federated_sources.extend(sources);
        self
    }

    /// Map a predicate to an inlined encoding.
    pub fn inline_predicate(mut self, predicate: impl Into<String>, ty: InlinedType) -> Self {
        self.inlined_predicates.insert(predicate.into(), ty);
        self
    }

    /// Map a datatype to an inlined encoding.
    pub fn inline_datatype(mut self, datatype: impl Into<String>, ty: InlinedType) -> Self {
        self.inlined_datatypes.insert(datatype.into(), ty);
        self
    }

    /// Check if this configuration describes a federated store.
    pub fn is_federated(&self) -> bool {
        !self.federated_sources.is_empty()
    }

    /// Check the federation invariants.
    pub fn validate(&self) -> RepositoryResult<()> {
        if self.is_federated() {
            if !self.access_mode.allows_federation() {
                return Err(RepositoryError::InvalidConfiguration(format!(
                    "federated stores require a CREATE or RENEW access mode; {} is set to {}",
                    self.name, self.access_mode
                )));
            }
            if self.federated_sources.contains(&self.name) {
                return Err(RepositoryError::InvalidConfiguration(format!(
                    "store {} cannot federate itself",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(json: &str) -> RepositoryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn name(s: &str) -> StoreName {
        StoreName::new(s).unwrap()
    }

    #[test]
    fn test_builder() {
        let config = RepositoryConfig::new(name("rainbow"), AccessMode::Create)
            .federated_sources([name("red"), name("green"), name("red")])
            .inline_predicate("ex:age", InlinedType::Int);

        assert!(config.is_federated());
        assert_eq!(config.federated_sources.len(), 2);
        assert_eq!(config.inlined_predicates.get("ex:age"), Some(&InlinedType::Int));
        config.validate().unwrap();
    }

    #[test]
    fn test_federation_requires_creating_mode() {
        for mode in [AccessMode::Open, AccessMode::Access] {
            let config = RepositoryConfig::new(name("rainbow"), mode)
                .federated_sources([name("red")]);
            assert!(matches!(
                config.validate(),
                Err(RepositoryError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_self_federation_rejected() {
        let config = RepositoryConfig::new(name("red"), AccessMode::Create)
            .federated_sources([name("red")]);
        assert!(matches!(
            config.validate(),
            Err(RepositoryError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let config = RepositoryConfig::from_json_str(
            r#"{
                "name": "rainbow",
                "access_mode": "renew",
                "federated_sources": ["red", "green"],
                "inlined_datatypes": { "xsd:dateTime": "date-time" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.access_mode, AccessMode::Renew);
        assert_eq!(config.federated_sources.len(), 2);
        assert_eq!(
            config.inlined_datatypes.get("xsd:dateTime"),
            Some(&InlinedType::DateTime)
        );
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let result = RepositoryConfig::from_json_str(
            r#"{ "name": "rainbow", "access_mode": "OPEN", "federated_sources": ["red"] }"#,
        );
        assert!(matches!(result, Err(RepositoryError::InvalidConfiguration(_))));

        let result = RepositoryConfig::from_json_str(r#"{ "name": "", "access_mode": "OPEN" }"#);
        assert!(matches!(result, Err(RepositoryError::ConfigFormat(_))));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "name": "scratch", "access_mode": "CREATE" }}"#).unwrap();

        let config = RepositoryConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.name, name("scratch"));
        assert!(!config.is_federated());

        let missing = RepositoryConfig::from_json_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(RepositoryError::Io(_))));
    }

    #[test]
    fn test_parse_inlined_type() {
        assert_eq!("datetime".parse::<InlinedType>().unwrap(), InlinedType::DateTime);
        assert_eq!(InlinedType::DateTime.server_name(), "date-time");
        assert!("string".parse::<InlinedType>().is_err());
    }
}
