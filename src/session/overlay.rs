//! Private write overlay of a dedicated session.
//!
//! The overlay is an ordered log of changes, not a diff: replaying it on top
//! of the committed statements gives the session's view, and handing it to
//! `Store::apply` publishes it. Later entries win over earlier ones, so an
//! add after a remove of the same statement leaves it present.

use crate::catalog::{Change, Triple, TriplePattern};

/// Pending changes of one dedicated session.
#[derive(Debug, Default, Clone)]
pub struct Overlay {
    changes: Vec<Change>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an add.
    pub fn add(&mut self, triple: Triple) {
        self.changes.push(Change::Add(triple));
    }

    /// Buffer a removal.
    pub fn remove(&mut self, pattern: TriplePattern) {
        // A wildcard removal supersedes everything buffered before it.
        if pattern.is_wildcard() {
            self.changes.clear();
        }
        self.changes.push(Change::Remove(pattern));
    }

    /// Number of buffered changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Buffered changes in the order they were made.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Drop every buffered change.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Statements matching `pattern` as seen through this overlay.
    ///
    /// `base` must already be filtered by `pattern`.
    pub fn view(&self, mut base: Vec<Triple>, pattern: &TriplePattern) -> Vec<Triple> {
        for change in &self.changes {
            match change {
                Change::Add(triple) if !pattern.matches(triple) => {}
                change => change.apply_to(&mut base),
            }
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Triple {
        Triple::new(s, "ex:p", "ex:o")
    }

    #[test]
    fn test_view_merges_adds() {
        let mut overlay = Overlay::new();
        overlay.add(t("ex:b"));

        let view = overlay.view(vec![t("ex:a")], &TriplePattern::any());
        assert_eq!(view, vec![t("ex:a"), t("ex:b")]);
    }

    #[test]
    fn test_view_respects_pattern() {
        let mut overlay = Overlay::new();
        overlay.add(t("ex:b"));

        let pattern = TriplePattern::any().subject("ex:a");
        let view = overlay.view(vec![t("ex:a")], &pattern);
        assert_eq!(view, vec![t("ex:a")]);
    }

    #[test]
    fn test_last_writer_wins() {
        let mut overlay = Overlay::new();
        overlay.remove(TriplePattern::from(&t("ex:a")));
        overlay.add(t("ex:a"));
        let view = overlay.view(vec![t("ex:a")], &TriplePattern::any());
        assert_eq!(view, vec![t("ex:a")]);

        overlay.remove(TriplePattern::any().subject("ex:a"));
        let view = overlay.view(vec![t("ex:a")], &TriplePattern::any());
        assert!(view.is_empty());
    }

    #[test]
    fn test_wildcard_remove_compacts() {
        let mut overlay = Overlay::new();
        overlay.add(t("ex:a"));
        overlay.add(t("ex:b"));
        overlay.remove(TriplePattern::any());
        assert_eq!(overlay.len(), 1);

        let view = overlay.view(vec![t("ex:c")], &TriplePattern::any());
        assert!(view.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut overlay = Overlay::new();
        overlay.add(t("ex:a"));
        assert!(!overlay.is_empty());
        overlay.clear();
        assert!(overlay.is_empty());
    }
}
