//! Comparator codes: which position of each pattern row a chamber scan hit.
//!
//! Every pattern row offers up to three half-strip positions. A code packs
//! the observed position per layer into one base-4 digit, `0` meaning the
//! layer had no hit and `1..=3` naming the slot (`slot + 1`). Layer 0 is the
//! least significant digit, so the twelve-bit id is
//!
//! ```text
//! id = d0 + 4*d1 + 16*d2 + 64*d3 + 256*d4 + 1024*d5
//! ```
//!
//! The all-zero code is a valid "nothing matched" code; it is not the same
//! thing as a code that has no lookup-table entry.

use std::fmt;

use crate::constants::{CODE_SLOTS, NLAYERS, N_COMPARATOR_CODES};
use crate::error::CodecError;
use crate::grid::Grid;

/// Per-layer slot mask: `CODE_SLOTS` columns by `NLAYERS` rows.
pub type HitMask = Grid<bool, CODE_SLOTS, NLAYERS>;

/// An immutable comparator code with its derived id and layer count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComparatorCode {
    hits: HitMask,
    id: u32,
    layers_matched: usize,
}

impl ComparatorCode {
    /// Build a code from an observed slot mask.
    pub fn from_hits(hits: &HitMask) -> Result<Self, CodecError> {
        let id = Self::encode(hits)?;
        Ok(Self {
            hits: *hits,
            id,
            layers_matched: Self::count_layers(hits),
        })
    }

    /// Build a code from its integer id.
    pub fn from_id(id: u32) -> Result<Self, CodecError> {
        let hits = Self::decode(id)?;
        Ok(Self {
            hits,
            id,
            layers_matched: Self::count_layers(&hits),
        })
    }

    /// Pack a slot mask into its integer id.
    pub fn encode(hits: &HitMask) -> Result<u32, CodecError> {
        let mut id = 0u32;
        for layer in 0..NLAYERS {
            let mut slots = hits.set_in_row(layer);
            let digit = match (slots.next(), slots.next()) {
                (None, _) => 0,
                (Some(slot), None) => slot as u32 + 1,
                (Some(_), Some(_)) => {
                    return Err(CodecError::MultipleSlots {
                        layer,
                        count: hits.set_in_row(layer).count(),
                    })
                }
            };
            id |= digit << (2 * layer);
        }
        Ok(id)
    }

    /// Unpack an integer id into its slot mask.
    pub fn decode(id: u32) -> Result<HitMask, CodecError> {
        if id >= N_COMPARATOR_CODES {
            return Err(CodecError::IdOutOfRange(id));
        }
        let mut hits = HitMask::new();
        for layer in 0..NLAYERS {
            let digit = (id >> (2 * layer)) & 0b11;
            if digit > 0 {
                hits.set(digit as usize - 1, layer, true);
            }
        }
        Ok(hits)
    }

    /// The packed twelve-bit id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Layers with a reported position.
    pub fn layers_matched(&self) -> usize {
        self.layers_matched
    }

    /// The slot mask this code was built from.
    pub fn hits(&self) -> &HitMask {
        &self.hits
    }

    /// Base-4 digit for one layer (`0` when out of range).
    pub fn digit(&self, layer: usize) -> u32 {
        if layer >= NLAYERS {
            return 0;
        }
        (self.id >> (2 * layer)) & 0b11
    }

    /// Slot hit on `layer`, if any.
    pub fn slot(&self, layer: usize) -> Option<usize> {
        match self.digit(layer) {
            0 => None,
            d => Some(d as usize - 1),
        }
    }

    /// `true` for the all-zero code.
    pub fn is_empty(&self) -> bool {
        self.id == 0
    }

    /// Render `id` with one base-4 digit per layer, most significant layer first.
    pub fn base4_string(id: u32) -> String {
        (0..NLAYERS)
            .rev()
            .map(|layer| {
                let digit = (id >> (2 * layer)) & 0b11;
                char::from_digit(digit, 4).unwrap_or('?')
            })
            .collect()
    }

    fn count_layers(hits: &HitMask) -> usize {
        (0..NLAYERS)
            .filter(|&layer| hits.set_in_row(layer).next().is_some())
            .count()
    }
}

impl Default for ComparatorCode {
    fn default() -> Self {
        Self {
            hits: HitMask::new(),
            id: 0,
            layers_matched: 0,
        }
    }
}

impl fmt::Display for ComparatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "code {} ({})", self.id, Self::base4_string(self.id))?;
        for layer in 0..NLAYERS {
            let row: String = self
                .hits
                .row(layer)
                .map(|hit| if hit { 'X' } else { '-' })
                .collect();
            writeln!(f, "  ly{}  {}", layer, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_code() {
        let code = ComparatorCode::from_hits(&HitMask::new()).unwrap();
        assert_eq!(code.id(), 0);
        assert_eq!(code.layers_matched(), 0);
        assert!(code.is_empty());
        assert_eq!(code, ComparatorCode::default());
    }

    #[test]
    fn test_digit_per_layer() {
        // layer 0 slot 0, layer 1 slot 2, layer 5 slot 1
        let mut hits = HitMask::new();
        hits.set(0, 0, true);
        hits.set(2, 1, true);
        hits.set(1, 5, true);
        let code = ComparatorCode::from_hits(&hits).unwrap();
        assert_eq!(code.id(), 1 + 3 * 4 + 2 * 1024);
        assert_eq!(code.layers_matched(), 3);
        assert_eq!(code.slot(1), Some(2));
        assert_eq!(code.slot(2), None);
        assert_eq!(ComparatorCode::base4_string(code.id()), "200031");
    }

    #[test]
    fn test_all_layers_middle_slot() {
        let hits = HitMask::from_rows(&[[false, true, false]; NLAYERS]);
        let code = ComparatorCode::from_hits(&hits).unwrap();
        assert_eq!(ComparatorCode::base4_string(code.id()), "222222");
        assert_eq!(code.layers_matched(), 6);
    }

    #[test]
    fn test_rejects_double_slot() {
        let mut hits = HitMask::new();
        hits.set(0, 3, true);
        hits.set(2, 3, true);
        assert_eq!(
            ComparatorCode::encode(&hits),
            Err(CodecError::MultipleSlots { layer: 3, count: 2 })
        );
    }

    #[test]
    fn test_rejects_out_of_range_id() {
        assert_eq!(
            ComparatorCode::from_id(N_COMPARATOR_CODES),
            Err(CodecError::IdOutOfRange(4096))
        );
        assert!(ComparatorCode::from_id(N_COMPARATOR_CODES - 1).is_ok());
    }

    #[test]
    fn test_full_round_trip() {
        for id in 0..N_COMPARATOR_CODES {
            let hits = ComparatorCode::decode(id).unwrap();
            assert_eq!(ComparatorCode::encode(&hits).unwrap(), id);
        }
    }

    #[test]
    fn test_display_picture() {
        let code = ComparatorCode::from_id(1).unwrap();
        let text = code.to_string();
        assert!(text.contains("ly0  X--"));
        assert!(text.contains("ly5  ---"));
    }
}
