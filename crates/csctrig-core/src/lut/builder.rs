//! Geometric LUT: a straight-line fit through the cells of every valid
//! pattern/code combination.

use crate::catalog::PatternCatalog;
use crate::comparator_code::ComparatorCode;
use crate::constants::{HALF_STRIP_RESOLUTION, KEY_LAYER, NLAYERS, N_COMPARATOR_CODES, PATTERN_CENTER};
use crate::error::LutError;
use crate::pattern::Pattern;

use super::{Lut, LutEntry, LutKey, LutLoader};

/// Builds a [`Lut`] by fitting `x = position + slope * (layer - key)` to the
/// code cells of each pattern, in strips relative to the key half-strip.
#[derive(Debug, Clone, Copy)]
pub struct LinearFitBuilder {
    min_layers: usize,
}

impl Default for LinearFitBuilder {
    fn default() -> Self {
        Self { min_layers: 3 }
    }
}

impl LinearFitBuilder {
    pub fn new(min_layers: usize) -> Self {
        Self {
            min_layers: min_layers.clamp(1, NLAYERS),
        }
    }

    pub fn min_layers(&self) -> usize {
        self.min_layers
    }

    /// Fit every code with at least `min_layers` layers that the pattern can
    /// represent.
    pub fn linear_fits(&self, catalog: &PatternCatalog) -> Result<Lut, LutError> {
        let mut loader = LutLoader::new();
        for pattern in catalog {
            let mut fitted = 0usize;
            for id in 0..N_COMPARATOR_CODES {
                let Ok(code) = ComparatorCode::from_id(id) else {
                    continue;
                };
                if code.layers_matched() < self.min_layers || !pattern.accepts_code(&code) {
                    continue;
                }
                if let Some(entry) = self.fit(pattern, &code)? {
                    loader.insert(LutKey::new(pattern.id(), id), entry)?;
                    fitted += 1;
                }
            }
            tracing::trace!(pattern = pattern.id(), codes = fitted, "fitted pattern codes");
        }
        let lut = loader.make_final();
        tracing::info!(entries = lut.len(), patterns = catalog.len(), "built linear-fit LUT");
        Ok(lut)
    }

    /// Least-squares fit for one combination. `None` when the code has no
    /// cells.
    pub fn fit(&self, pattern: &Pattern, code: &ComparatorCode) -> Result<Option<LutEntry>, LutError> {
        let cells = pattern.recover_code_cells(code)?;
        let points: Vec<(f32, f32)> = cells
            .cells()
            .filter(|&(_, _, set)| set)
            .map(|(col, layer, _)| {
                let y = layer as f32 - KEY_LAYER as f32;
                let x = (col as f32 - PATTERN_CENTER as f32) / 2.0;
                (y, x)
            })
            .collect();
        Ok(fit_points(&points))
    }
}

fn fit_points(points: &[(f32, f32)]) -> Option<LutEntry> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sy, sx, syy, sxy) = points.iter().fold((0.0, 0.0, 0.0, 0.0), |acc, &(y, x)| {
        (acc.0 + y, acc.1 + x, acc.2 + y * y, acc.3 + x * y)
    });

    let denom = n * syy - sy * sy;
    let (slope, position) = if denom.abs() < f32::EPSILON {
        (0.0, sx / n)
    } else {
        let slope = (n * sxy - sy * sx) / denom;
        (slope, (sx - slope * sy) / n)
    };

    // Single-hit resolution in strips
    let sigma = HALF_STRIP_RESOLUTION / 2.0;
    let chi2 = points
        .iter()
        .map(|&(y, x)| {
            let r = (x - (position + slope * y)) / sigma;
            r * r
        })
        .sum();

    Some(LutEntry::new(
        position,
        slope,
        chi2,
        (points.len() as u32).saturating_sub(2),
        points.len() as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator_code::HitMask;

    fn code_from_slots(slots: [Option<usize>; NLAYERS]) -> ComparatorCode {
        let mut hits = HitMask::new();
        for (layer, slot) in slots.iter().enumerate() {
            if let Some(s) = slot {
                hits.set(*s, layer, true);
            }
        }
        ComparatorCode::from_hits(&hits).unwrap()
    }

    #[test]
    fn test_straight_track_fit() {
        let catalog = PatternCatalog::upgrade().unwrap();
        let straight = catalog.get(100).unwrap();
        // Middle slot on every layer is the centre column
        let code = code_from_slots([Some(1); NLAYERS]);
        let entry = LinearFitBuilder::default()
            .fit(straight, &code)
            .unwrap()
            .unwrap();
        assert!(entry.slope.abs() < 1e-6);
        assert!(entry.position.abs() < 1e-6);
        assert!(entry.chi2.abs() < 1e-6);
        assert_eq!(entry.layers, 6);
        assert_eq!(entry.ndf, 4);
    }

    #[test]
    fn test_offset_track_fit() {
        let catalog = PatternCatalog::upgrade().unwrap();
        let straight = catalog.get(100).unwrap();
        // Rightmost slot everywhere: one half-strip right of centre
        let code = code_from_slots([Some(2); NLAYERS]);
        let entry = LinearFitBuilder::default()
            .fit(straight, &code)
            .unwrap()
            .unwrap();
        assert!(entry.slope.abs() < 1e-6);
        assert!((entry.position - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_scattered_hits_have_chi2() {
        let catalog = PatternCatalog::upgrade().unwrap();
        let straight = catalog.get(100).unwrap();
        let code = code_from_slots([Some(0), Some(2), Some(0), Some(2), None, None]);
        let entry = LinearFitBuilder::default()
            .fit(straight, &code)
            .unwrap()
            .unwrap();
        assert!(entry.chi2 > 1.0);
        assert_eq!(entry.layers, 4);
    }

    #[test]
    fn test_linear_fits_covers_valid_codes() {
        let catalog = PatternCatalog::upgrade().unwrap();
        let lut = LinearFitBuilder::new(3).linear_fits(&catalog).unwrap();
        assert!(!lut.is_empty());
        let all_middle = code_from_slots([Some(1); NLAYERS]);
        for pattern in &catalog {
            assert!(lut.get(pattern.id(), all_middle.id()).is_some());
        }
        // Two-layer codes are below threshold
        let sparse = code_from_slots([Some(1), Some(1), None, None, None, None]);
        assert!(lut.get(100, sparse.id()).is_none());
        for (key, entry) in lut.iter() {
            assert!(entry.layers >= 3, "{} has {} layers", key, entry.layers);
        }
    }

    #[test]
    fn test_flipped_slope_sign() {
        let catalog = PatternCatalog::upgrade().unwrap();
        let code = code_from_slots([Some(1); NLAYERS]);
        let builder = LinearFitBuilder::default();
        let a = builder.fit(catalog.get(90).unwrap(), &code).unwrap().unwrap();
        let b = builder.fit(catalog.get(80).unwrap(), &code).unwrap().unwrap();
        assert!(a.slope.abs() > 0.1);
        assert!((a.slope + b.slope).abs() < 1e-5);
    }
}
