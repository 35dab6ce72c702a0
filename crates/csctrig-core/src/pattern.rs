//! Cathode pattern templates.
//!
//! A pattern is an acceptance envelope for tracks of a given bend: a grid of
//! `MAX_PATTERN_WIDTH` half-strips by `NLAYERS` layers, drawn with the key
//! half-strip on the centre column of the key layer. Each row carries at
//! most three cells so that a comparator code can address every one of
//! them.
//!
//! ```text
//!   id 70            id 60 (flipped)
//!   ly0 --xxx------   ly0 ------xxx--
//!   ly1 ---xxx-----   ly1 -----xxx---
//!   ly2 ----xxx----   ly2 ----xxx----
//!   ly3 -----xxx---   ly3 ---xxx-----
//!   ly4 ------xxx--   ly4 --xxx------
//!   ly5 -------xxx-   ly5 -xxx-------
//! ```

use std::fmt;

use crate::comparator_code::ComparatorCode;
use crate::constants::{CODE_SLOTS, KEY_LAYER, MAX_PATTERN_WIDTH, NLAYERS, PATTERN_CENTER};
use crate::error::PatternError;
use crate::grid::Grid;

/// Boolean acceptance template, one row per layer.
pub type PatternTemplate = Grid<bool, MAX_PATTERN_WIDTH, NLAYERS>;

/// An immutable pattern: template plus identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    id: u32,
    legacy: bool,
    name: String,
    template: PatternTemplate,
}

impl Pattern {
    /// Create an unnamed pattern, validating the template.
    pub fn new(id: u32, legacy: bool, template: PatternTemplate) -> Result<Self, PatternError> {
        Self::named(String::new(), id, legacy, template)
    }

    /// Create a named pattern, validating the template.
    pub fn named(
        name: impl Into<String>,
        id: u32,
        legacy: bool,
        template: PatternTemplate,
    ) -> Result<Self, PatternError> {
        if template.count_set() == 0 {
            return Err(PatternError::EmptyTemplate { id });
        }
        for layer in 0..NLAYERS {
            let count = template.set_in_row(layer).count();
            if count > CODE_SLOTS {
                return Err(PatternError::TooManyCells { id, layer, count });
            }
        }
        if template.get(PATTERN_CENTER, KEY_LAYER) != Some(true) {
            return Err(PatternError::MissingKeyCell { id });
        }
        Ok(Self {
            id,
            legacy,
            name: name.into(),
            template,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Whether this is a pre-upgrade (Run 2 firmware) pattern.
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &PatternTemplate {
        &self.template
    }

    /// Columns of `layer` covered by the template, left to right.
    ///
    /// The n-th column returned is the cell addressed by code slot n.
    pub fn cells_in_layer(&self, layer: usize) -> impl Iterator<Item = usize> + '_ {
        self.template.set_in_row(layer)
    }

    /// Net horizontal bias of the template: `1` when cells drift towards
    /// higher half-strips with increasing layer, otherwise `0`.
    pub fn bend_bit(&self) -> u8 {
        let net: i64 = self
            .template
            .cells()
            .filter(|&(_, _, set)| set)
            .map(|(col, layer, _)| {
                (col as i64 - PATTERN_CENTER as i64) * (layer as i64 - KEY_LAYER as i64)
            })
            .sum();
        u8::from(net > 0)
    }

    /// Mirror image for the opposite bend, under a new id.
    ///
    /// The name gets a `-flipped` suffix when the source pattern has one.
    pub fn make_flipped(&self, id: u32) -> Pattern {
        let name = if self.name.is_empty() {
            String::new()
        } else {
            format!("{}-flipped", self.name)
        };
        self.make_flipped_named(name, id)
    }

    /// Mirror image for the opposite bend, with an explicit name.
    pub fn make_flipped_named(&self, name: impl Into<String>, id: u32) -> Pattern {
        // Mirroring keeps row widths and the centre column, so the template
        // stays valid.
        Pattern {
            id,
            legacy: self.legacy,
            name: name.into(),
            template: self.template.mirrored(),
        }
    }

    /// Cells of this pattern implicated by `code`.
    ///
    /// Digit `d > 0` on a layer selects the d-th covered cell of that row.
    /// Fails when the row has fewer cells than the digit asks for.
    pub fn recover_code_cells(&self, code: &ComparatorCode) -> Result<PatternTemplate, PatternError> {
        let mut cells = PatternTemplate::new();
        for layer in 0..NLAYERS {
            let Some(slot) = code.slot(layer) else {
                continue;
            };
            let col = self
                .cells_in_layer(layer)
                .nth(slot)
                .ok_or(PatternError::CodeNotInPattern {
                    pattern_id: self.id,
                    code_id: code.id(),
                    layer,
                })?;
            cells.set(col, layer, true);
        }
        Ok(cells)
    }

    /// Whether every digit of `code` addresses a cell of this pattern.
    pub fn accepts_code(&self, code: &ComparatorCode) -> bool {
        (0..NLAYERS).all(|layer| match code.slot(layer) {
            None => true,
            Some(slot) => slot < self.cells_in_layer(layer).count(),
        })
    }

    /// Render the template with the cells selected by `code` marked `X`.
    pub fn code_picture(&self, code: &ComparatorCode) -> String {
        let hits = self.recover_code_cells(code).unwrap_or_default();
        let mut out = String::new();
        for layer in 0..NLAYERS {
            let row: String = (0..MAX_PATTERN_WIDTH)
                .map(|col| match (hits.get(col, layer), self.template.get(col, layer)) {
                    (Some(true), _) => 'X',
                    (_, Some(true)) => 'x',
                    _ => '-',
                })
                .collect();
            out.push_str(&format!("ly{} {}\n", layer, row));
        }
        out
    }
}

/// Build a template from rows drawn as `0`/`1`.
pub fn template_from_rows(rows: &[[u8; MAX_PATTERN_WIDTH]; NLAYERS]) -> PatternTemplate {
    let mut template = PatternTemplate::new();
    for (layer, row) in rows.iter().enumerate() {
        for (col, &cell) in row.iter().enumerate() {
            template.set(col, layer, cell != 0);
        }
    }
    template
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.legacy { "legacy" } else { "upgrade" };
        if self.name.is_empty() {
            writeln!(f, "pattern {} ({})", self.id, kind)?;
        } else {
            writeln!(f, "pattern {} '{}' ({})", self.id, self.name, kind)?;
        }
        for layer in 0..NLAYERS {
            let row: String = self
                .template
                .row(layer)
                .map(|set| if set { 'x' } else { '-' })
                .collect();
            writeln!(f, "ly{} {}", layer, row)?;
        }
        Ok(())
    }
}
