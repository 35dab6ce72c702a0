//! Flattened candidate storage for persistence.
//!
//! Candidates from many chambers are stored column-wise, one vector per
//! field, the layout tree-based analysis files expect. Legacy and upgrade
//! searches write to separately prefixed collections.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clct::ClctCandidate;

/// Branch prefix distinguishing the two pattern families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectionPrefix {
    /// Legacy patterns ("OP")
    #[serde(rename = "OP")]
    Old,
    /// Upgrade patterns ("NP")
    #[default]
    #[serde(rename = "NP")]
    New,
}

impl CollectionPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionPrefix::Old => "OP",
            CollectionPrefix::New => "NP",
        }
    }
}

impl fmt::Display for CollectionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column-wise cathode candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClctCandidateCollection {
    pub prefix: CollectionPrefix,
    pub horizontal_index: Vec<usize>,
    pub start_time: Vec<u8>,
    pub key_strip: Vec<f32>,
    pub key_half_strip: Vec<usize>,
    /// `None` for candidates built from a layer count
    pub comparator_code_id: Vec<Option<u32>>,
    pub layer_count: Vec<usize>,
    pub pattern_id: Vec<u32>,
    pub ch_id: Vec<u32>,
}

const FIELDS: [&str; 8] = [
    "horizontalIndex",
    "startTime",
    "keyStrip",
    "keyHalfStrip",
    "comparatorCodeId",
    "layerCount",
    "patternId",
    "chId",
];

impl ClctCandidateCollection {
    pub fn new(prefix: CollectionPrefix) -> Self {
        Self {
            prefix,
            ..Default::default()
        }
    }

    /// Append candidates of one chamber; returns how many were added.
    pub fn fill(&mut self, candidates: &[ClctCandidate], ch_id: u32) -> usize {
        for c in candidates {
            self.horizontal_index.push(c.horizontal_index());
            self.start_time.push(c.start_time());
            self.key_strip.push(c.key_strip());
            self.key_half_strip.push(c.key_half_strip());
            self.comparator_code_id.push(c.comparator_code_id());
            self.layer_count.push(c.layer_count());
            self.pattern_id.push(c.pattern_id());
            self.ch_id.push(ch_id);
        }
        candidates.len()
    }

    /// Remove the entry at `index` from every column.
    pub fn erase(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.horizontal_index.remove(index);
        self.start_time.remove(index);
        self.key_strip.remove(index);
        self.key_half_strip.remove(index);
        self.comparator_code_id.remove(index);
        self.layer_count.remove(index);
        self.pattern_id.remove(index);
        self.ch_id.remove(index);
        true
    }

    pub fn clear(&mut self) {
        let prefix = self.prefix;
        *self = Self::new(prefix);
    }

    pub fn len(&self) -> usize {
        self.pattern_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_id.is_empty()
    }

    pub fn count_for_chamber(&self, ch_id: u32) -> usize {
        self.ch_id.iter().filter(|&&c| c == ch_id).count()
    }

    /// Column names as `<prefix>_<field>`.
    pub fn branch_names(&self) -> Vec<String> {
        FIELDS
            .iter()
            .map(|field| format!("{}_{}", self.prefix, field))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PatternCatalog;

    fn candidates() -> Vec<ClctCandidate> {
        let catalog = PatternCatalog::legacy().unwrap();
        vec![
            ClctCandidate::from_layer_count(catalog.get(10).unwrap().clone(), 40, 6, 6),
            ClctCandidate::from_layer_count(catalog.get(9).unwrap().clone(), 71, 7, 4),
        ]
    }

    #[test]
    fn test_fill_and_count() {
        let mut col = ClctCandidateCollection::new(CollectionPrefix::Old);
        assert_eq!(col.fill(&candidates(), 3), 2);
        assert_eq!(col.fill(&candidates()[..1], 8), 1);
        assert_eq!(col.len(), 3);
        assert_eq!(col.count_for_chamber(3), 2);
        assert_eq!(col.key_strip[1], 35.5);
        assert_eq!(col.comparator_code_id[0], None);
        assert_eq!(col.pattern_id, vec![10, 9, 10]);
    }

    #[test]
    fn test_erase() {
        let mut col = ClctCandidateCollection::default();
        col.fill(&candidates(), 1);
        assert!(col.erase(0));
        assert!(!col.erase(5));
        assert_eq!(col.len(), 1);
        assert_eq!(col.horizontal_index, vec![71]);
        assert_eq!(col.ch_id.len(), 1);
        col.clear();
        assert!(col.is_empty());
    }

    #[test]
    fn test_json_export() {
        let mut col = ClctCandidateCollection::new(CollectionPrefix::Old);
        col.fill(&candidates(), 2);
        let json = col.to_json().unwrap();
        assert!(json.contains("\"prefix\":\"OP\""));
        assert!(json.contains("\"keyHalfStrip\":[40,71]"));
        assert_eq!(ClctCandidateCollection::from_json(&json).unwrap(), col);
    }

    #[test]
    fn test_branch_names() {
        let col = ClctCandidateCollection::new(CollectionPrefix::New);
        let names = col.branch_names();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "NP_horizontalIndex");
    }
}
