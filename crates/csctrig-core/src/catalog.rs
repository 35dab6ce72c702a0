//! The pattern catalog searched by the cathode extractor.
//!
//! Two families ship with the crate. The legacy family mirrors the Run 2
//! firmware envelopes (single-cell key layer, ids 10 down to 2); the upgrade
//! family uses three-cell rows everywhere (ids 100 down to 20) so every layer
//! contributes a comparator-code digit. In each family the bend-left
//! templates are drawn by hand and their bend-right partners are produced
//! with [`Pattern::make_flipped`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::{MAX_PATTERN_WIDTH, NLAYERS};
use crate::error::PatternError;
use crate::pattern::{template_from_rows, Pattern};

type Rows = [[u8; MAX_PATTERN_WIDTH]; NLAYERS];

const LEGACY_STRAIGHT: Rows = [
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
];

const LEGACY_ID9: Rows = [
    [0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
];

const LEGACY_ID7: Rows = [
    [0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0],
];

const LEGACY_ID5: Rows = [
    [0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1],
];

const LEGACY_ID3: Rows = [
    [1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1],
];

const UPGRADE_ID100: Rows = [
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
];

const UPGRADE_ID90: Rows = [
    [0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
];

const UPGRADE_ID70: Rows = [
    [0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0],
];

const UPGRADE_ID50: Rows = [
    [0, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 1, 1, 1, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1],
];

const UPGRADE_ID30: Rows = [
    [1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 1, 1, 1, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1],
];

/// Which built-in family a configuration asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// Run 2 envelopes only
    Legacy,
    /// Upgrade envelopes only
    #[default]
    Upgrade,
    /// Both families, legacy first
    Combined,
}

impl CatalogKind {
    pub fn build(self) -> Result<PatternCatalog, PatternError> {
        match self {
            CatalogKind::Legacy => PatternCatalog::legacy(),
            CatalogKind::Upgrade => PatternCatalog::upgrade(),
            CatalogKind::Combined => PatternCatalog::combined(),
        }
    }
}

/// An ordered set of patterns with unique ids.
///
/// Patterns are shared with the candidates built from them, so the catalog
/// hands out `Arc` clones rather than copies.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    patterns: Vec<Arc<Pattern>>,
}

impl PatternCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog from a list, rejecting duplicate ids.
    pub fn from_patterns(patterns: impl IntoIterator<Item = Pattern>) -> Result<Self, PatternError> {
        let mut catalog = Self::new();
        for pattern in patterns {
            catalog.push(pattern)?;
        }
        Ok(catalog)
    }

    /// Append a pattern, rejecting a duplicate id.
    pub fn push(&mut self, pattern: Pattern) -> Result<(), PatternError> {
        if self.get(pattern.id()).is_some() {
            return Err(PatternError::DuplicateId(pattern.id()));
        }
        self.patterns.push(Arc::new(pattern));
        Ok(())
    }

    /// Append a hand-drawn pattern followed by its mirror image.
    fn push_with_flip(
        &mut self,
        name: &str,
        id: u32,
        flipped_id: u32,
        legacy: bool,
        rows: &Rows,
    ) -> Result<(), PatternError> {
        let pattern = Pattern::named(name, id, legacy, template_from_rows(rows))?;
        let flipped = pattern.make_flipped(flipped_id);
        self.push(pattern)?;
        self.push(flipped)
    }

    /// Run 2 firmware envelopes: ids 10 (straight), 9/8, 7/6, 5/4, 3/2.
    pub fn legacy() -> Result<Self, PatternError> {
        let mut catalog = Self::new();
        catalog.push(Pattern::named(
            "legacy-straight",
            10,
            true,
            template_from_rows(&LEGACY_STRAIGHT),
        )?)?;
        catalog.push_with_flip("legacy-9", 9, 8, true, &LEGACY_ID9)?;
        catalog.push_with_flip("legacy-7", 7, 6, true, &LEGACY_ID7)?;
        catalog.push_with_flip("legacy-5", 5, 4, true, &LEGACY_ID5)?;
        catalog.push_with_flip("legacy-3", 3, 2, true, &LEGACY_ID3)?;
        Ok(catalog)
    }

    /// Upgrade envelopes: ids 100 (straight), 90/80, 70/60, 50/40, 30/20.
    pub fn upgrade() -> Result<Self, PatternError> {
        let mut catalog = Self::new();
        catalog.push(Pattern::named(
            "straight",
            100,
            false,
            template_from_rows(&UPGRADE_ID100),
        )?)?;
        catalog.push_with_flip("bend-90", 90, 80, false, &UPGRADE_ID90)?;
        catalog.push_with_flip("bend-70", 70, 60, false, &UPGRADE_ID70)?;
        catalog.push_with_flip("bend-50", 50, 40, false, &UPGRADE_ID50)?;
        catalog.push_with_flip("bend-30", 30, 20, false, &UPGRADE_ID30)?;
        Ok(catalog)
    }

    /// Legacy family followed by the upgrade family.
    pub fn combined() -> Result<Self, PatternError> {
        let mut catalog = Self::legacy()?;
        for pattern in Self::upgrade()?.patterns {
            catalog.push(Pattern::clone(&pattern))?;
        }
        Ok(catalog)
    }

    /// Pattern with the given id.
    pub fn get(&self, id: u32) -> Option<&Arc<Pattern>> {
        self.patterns.iter().find(|p| p.id() == id)
    }

    /// Patterns in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Pattern>> {
        self.patterns.iter()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.patterns.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<'a> IntoIterator for &'a PatternCatalog {
    type Item = &'a Arc<Pattern>;
    type IntoIter = std::slice::Iter<'a, Arc<Pattern>>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}
