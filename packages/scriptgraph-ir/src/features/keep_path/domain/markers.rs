use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::models::DeclId;

/// `declaration id -> kept`, one entry per declaration in the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeepMarkers(BTreeMap<DeclId, bool>);

impl KeepMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, decl: impl Into<DeclId>, kept: bool) {
        let entry = self.0.entry(decl.into()).or_insert(false);
        *entry |= kept;
    }

    /// Unknown declarations are never kept
    pub fn is_kept(&self, decl: &str) -> bool {
        self.0.get(decl).copied().unwrap_or(false)
    }

    pub fn get(&self, decl: &str) -> Option<bool> {
        self.0.get(decl).copied()
    }

    /// Kept declarations in id order
    pub fn kept(&self) -> impl Iterator<Item = &DeclId> + '_ {
        self.0.iter().filter(|(_, kept)| **kept).map(|(id, _)| id)
    }

    pub fn kept_count(&self) -> usize {
        self.0.values().filter(|kept| **kept).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeclId, bool)> + '_ {
        self.0.iter().map(|(id, kept)| (id, *kept))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Outcome of one keep-path run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepReport {
    pub markers: KeepMarkers,
    /// Roots actually used, exports included
    pub roots: Vec<DeclId>,
    /// Requested roots with no node in the graph
    pub missing_roots: Vec<String>,
    /// Whether any kept function reaches the unknown sink
    pub reaches_unknown: bool,
}

impl KeepReport {
    pub fn is_kept(&self, decl: &str) -> bool {
        self.markers.is_kept(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marking_never_unkeeps() {
        let mut markers = KeepMarkers::new();
        markers.set("@a.ets: f", true);
        markers.set("@a.ets: f", false);
        markers.set("@a.ets: g", false);
        assert!(markers.is_kept("@a.ets: f"));
        assert_eq!(markers.get("@a.ets: g"), Some(false));
        assert_eq!(markers.get("@a.ets: h"), None);
        assert_eq!(markers.kept_count(), 1);
        assert_eq!(
            markers.to_json().unwrap(),
            "{\n  \"@a.ets: f\": true,\n  \"@a.ets: g\": false\n}"
        );
    }
}
