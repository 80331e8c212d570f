//! Core value types shared by the catalog client and the repository layer.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters left untouched when a store name is form-encoded for the wire.
const FORM_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Errors that can occur when validating store names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidNameError {
    #[error("store name cannot be empty")]
    Empty,

    #[error("store name too long: {0} characters (max 255)")]
    TooLong(usize),

    #[error("store name contains a control character at position {0}")]
    ControlCharacter(usize),

    #[error("store name cannot start or end with whitespace")]
    SurroundingWhitespace,
}

/// A validated store name.
///
/// Store names are unique within a catalog. They are free text on the
/// server side, so validation only rejects names that cannot round-trip
/// through a request path:
/// - 1-255 characters
/// - No control characters
/// - No leading or trailing whitespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreName(String);

impl StoreName {
    /// create a new StoreName, validating the input
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }

        let len = name.chars().count();
        if len > 255 {
            return Err(InvalidNameError::TooLong(len));
        }

        if let Some(pos) = name.chars().position(|c| c.is_control()) {
            return Err(InvalidNameError::ControlCharacter(pos));
        }

        if name.trim() != name {
            return Err(InvalidNameError::SurroundingWhitespace);
        }

        Ok(())
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// convert to owned String
    pub fn into_string(self) -> String {
        self.0
    }

    /// Form-encoded name as it appears in catalog request paths.
    ///
    /// Spaces become `+`, everything outside `[A-Za-z0-9_.~-]` is
    /// percent-encoded.
    pub fn encoded(&self) -> String {
        utf8_percent_encode(&self.0, FORM_SAFE)
            .to_string()
            .replace("%20", "+")
    }

    /// Parse a name in the form produced by [`encoded`](Self::encoded).
    pub fn from_encoded(encoded: &str) -> Result<Self, InvalidNameError> {
        let spaced = encoded.replace('+', " ");
        Self::new(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StoreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StoreName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoreName> for String {
    fn from(name: StoreName) -> Self {
        name.0
    }
}

/// A single statement. Terms are kept in their serialized form; `context`
/// names the graph the statement lives in, `None` being the default graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Triple {
    /// Create a triple in the default graph.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            context: None,
        }
    }

    /// Move the triple into a named graph.
    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(ref ctx) = self.context {
            write!(f, " {}", ctx)?;
        }
        write!(f, " .")
    }
}

/// Which graphs a pattern applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContextFilter {
    /// Statements in any graph.
    #[default]
    Any,
    /// Only statements in the default graph.
    Default,
    /// Only statements in the named graph.
    Named(String),
}

impl ContextFilter {
    fn matches(&self, context: Option<&str>) -> bool {
        match self {
            ContextFilter::Any => true,
            ContextFilter::Default => context.is_none(),
            ContextFilter::Named(name) => context == Some(name.as_str()),
        }
    }
}

/// A statement pattern. `None` positions are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: Option<String>,
    pub predicate: Option<String>,
    pub object: Option<String>,
    #[serde(default)]
    pub context: ContextFilter,
}

impl TriplePattern {
    /// Pattern matching every statement.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Restrict to the default graph.
    pub fn in_default_graph(mut self) -> Self {
        self.context = ContextFilter::Default;
        self
    }

    /// Restrict to a named graph.
    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = ContextFilter::Named(context.into());
        self
    }

    /// Check whether a triple matches this pattern.
    pub fn matches(&self, triple: &Triple) -> bool {
        fn term(pattern: &Option<String>, value: &str) -> bool {
            pattern.as_deref().map_or(true, |p| p == value)
        }

        term(&self.subject, &triple.subject)
            && term(&self.predicate, &triple.predicate)
            && term(&self.object, &triple.object)
            && self.context.matches(triple.context.as_deref())
    }

    /// True when every position is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.subject.is_none()
            && self.predicate.is_none()
            && self.object.is_none()
            && self.context == ContextFilter::Any
    }
}

impl From<&Triple> for TriplePattern {
    fn from(triple: &Triple) -> Self {
        Self {
            subject: Some(triple.subject.clone()),
            predicate: Some(triple.predicate.clone()),
            object: Some(triple.object.clone()),
            context: match triple.context {
                Some(ref c) => ContextFilter::Named(c.clone()),
                None => ContextFilter::Default,
            },
        }
    }
}

/// A single write, as buffered by a dedicated session or sent in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    Add(Triple),
    Remove(TriplePattern),
}

impl Change {
    /// Apply this change to an in-memory view of statements.
    pub fn apply_to(&self, triples: &mut Vec<Triple>) {
        match self {
            Change::Add(triple) => {
                if !triples.contains(triple) {
                    triples.push(triple.clone());
                }
            }
            Change::Remove(pattern) => triples.retain(|t| !pattern.matches(t)),
        }
    }
}

/// Query languages understood by the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryLanguage {
    Sparql,
    Prolog,
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryLanguage::Sparql => write!(f, "SPARQL"),
            QueryLanguage::Prolog => write!(f, "PROLOG"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_store_names() {
        assert!(StoreName::new("scratch").is_ok());
        assert!(StoreName::new("my store").is_ok());
        assert!(StoreName::new("red-2024.v1").is_ok());
    }

    #[test]
    fn test_invalid_store_names() {
        assert_eq!(StoreName::new(""), Err(InvalidNameError::Empty));
        assert_eq!(
            StoreName::new(" padded"),
            Err(InvalidNameError::SurroundingWhitespace)
        );
        assert_eq!(
            StoreName::new("tab\there"),
            Err(InvalidNameError::ControlCharacter(3))
        );
        assert!(matches!(
            StoreName::new("x".repeat(256)),
            Err(InvalidNameError::TooLong(256))
        ));
    }

    #[test]
    fn test_encoded_name() {
        let name = StoreName::new("my store/v1").unwrap();
        assert_eq!(name.encoded(), "my+store%2Fv1");

        let name = StoreName::new("100% pure").unwrap();
        assert_eq!(name.encoded(), "100%25+pure");

        let name = StoreName::new("a+b c").unwrap();
        assert_eq!(StoreName::from_encoded(&name.encoded()), Ok(name));
        assert_eq!(
            StoreName::from_encoded("+padded"),
            Err(InvalidNameError::SurroundingWhitespace)
        );
    }

    #[test]
    fn test_store_name_deserialize_validates() {
        let ok: Result<StoreName, _> = serde_json::from_str("\"red\"");
        assert!(ok.is_ok());
        let bad: Result<StoreName, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_pattern_matching() {
        let t = Triple::new("ex:alice", "foaf:name", "\"Alice\"");
        assert!(TriplePattern::any().matches(&t));
        assert!(TriplePattern::any().subject("ex:alice").matches(&t));
        assert!(!TriplePattern::any().subject("ex:bob").matches(&t));
        assert!(TriplePattern::any().in_default_graph().matches(&t));
        assert!(!TriplePattern::any().in_context("ex:g").matches(&t));

        let named = t.clone().in_context("ex:g");
        assert!(TriplePattern::any().in_context("ex:g").matches(&named));
        assert!(!TriplePattern::any().in_default_graph().matches(&named));
    }

    #[test]
    fn test_exact_pattern_from_triple() {
        let t = Triple::new("ex:a", "ex:p", "ex:o");
        let pattern = TriplePattern::from(&t);
        assert!(pattern.matches(&t));
        assert!(!pattern.matches(&t.clone().in_context("ex:g")));
    }

    #[test]
    fn test_change_replay() {
        let a = Triple::new("ex:a", "ex:p", "1");
        let b = Triple::new("ex:b", "ex:p", "2");
        let mut view = vec![a.clone()];

        Change::Add(b.clone()).apply_to(&mut view);
        Change::Add(b.clone()).apply_to(&mut view);
        assert_eq!(view.len(), 2);

        Change::Remove(TriplePattern::any().subject("ex:a")).apply_to(&mut view);
        assert_eq!(view, vec![b]);
    }
}
