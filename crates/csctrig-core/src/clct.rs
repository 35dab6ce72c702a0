//! Cathode track-segment candidates and the orderings used to pick the best.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::comparator_code::ComparatorCode;
use crate::lut::{Lut, LutEntry, LutKey};
use crate::pattern::Pattern;

/// Calibration resolved from the LUT when the candidate was built.
///
/// The entry is copied, so a candidate stays valid if the table is dropped
/// or rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calibration {
    Calibrated(LutEntry),
    /// No fit exists for this pattern/code combination
    Uncalibrated,
}

impl Calibration {
    pub fn entry(&self) -> Option<&LutEntry> {
        match self {
            Calibration::Calibrated(e) => Some(e),
            Calibration::Uncalibrated => None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self, Calibration::Calibrated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Matched {
    Code(ComparatorCode),
    Layers(usize),
}

/// A pattern match at one scan offset.
#[derive(Debug, Clone)]
pub struct ClctCandidate {
    pattern: Arc<Pattern>,
    horizontal_index: usize,
    start_time: u8,
    matched: Matched,
    calibration: Calibration,
}

impl ClctCandidate {
    /// Candidate matched with a comparator code.
    pub fn new(pattern: Arc<Pattern>, horizontal_index: usize, start_time: u8, code: ComparatorCode) -> Self {
        Self {
            pattern,
            horizontal_index,
            start_time,
            matched: Matched::Code(code),
            calibration: Calibration::Uncalibrated,
        }
    }

    /// Candidate that only knows how many layers matched.
    pub fn from_layer_count(
        pattern: Arc<Pattern>,
        horizontal_index: usize,
        start_time: u8,
        layer_count: usize,
    ) -> Self {
        Self {
            pattern,
            horizontal_index,
            start_time,
            matched: Matched::Layers(layer_count),
            calibration: Calibration::Uncalibrated,
        }
    }

    /// Resolve the calibration against `lut`.
    pub fn with_lut(mut self, lut: &Lut) -> Self {
        self.calibrate(lut);
        self
    }

    pub fn calibrate(&mut self, lut: &Lut) {
        self.calibration = match self.key().and_then(|key| lut.entry(&key)) {
            Some(entry) => Calibration::Calibrated(*entry),
            None => Calibration::Uncalibrated,
        };
    }

    pub fn pattern(&self) -> &Arc<Pattern> {
        &self.pattern
    }

    pub fn pattern_id(&self) -> u32 {
        self.pattern.id()
    }

    /// Scan offset of the pattern's leftmost column.
    pub fn horizontal_index(&self) -> usize {
        self.horizontal_index
    }

    pub fn start_time(&self) -> u8 {
        self.start_time
    }

    pub fn code(&self) -> Option<&ComparatorCode> {
        match &self.matched {
            Matched::Code(code) => Some(code),
            Matched::Layers(_) => None,
        }
    }

    pub fn comparator_code_id(&self) -> Option<u32> {
        self.code().map(ComparatorCode::id)
    }

    pub fn layer_count(&self) -> usize {
        match self.matched {
            Matched::Code(code) => code.layers_matched(),
            Matched::Layers(n) => n,
        }
    }

    /// Staggered half-strip under the pattern's centre column.
    ///
    /// With the padded occupancy frame this is the scan offset itself.
    pub fn key_half_strip(&self) -> usize {
        self.horizontal_index
    }

    pub fn key_strip(&self) -> f32 {
        self.key_half_strip() as f32 / 2.0
    }

    pub fn bend_bit(&self) -> u8 {
        self.pattern.bend_bit()
    }

    /// LUT key, available when the candidate carries a code.
    pub fn key(&self) -> Option<LutKey> {
        self.comparator_code_id()
            .map(|code_id| LutKey::new(self.pattern.id(), code_id))
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    pub fn slope(&self) -> Option<f32> {
        self.calibration.entry().map(|e| e.slope)
    }

    /// Fitted position at the key layer, in strips.
    pub fn position(&self) -> Option<f32> {
        self.calibration
            .entry()
            .map(|e| self.key_strip() + e.position)
    }

    pub fn chi2(&self) -> Option<f32> {
        self.calibration.entry().map(|e| e.chi2)
    }

    /// Padded-frame cells `(column, layer)` this candidate accounts for.
    ///
    /// With a code these are the cells the code selects; otherwise the whole
    /// template.
    pub fn footprint(&self) -> Vec<(usize, usize)> {
        let cells = match &self.matched {
            Matched::Code(code) => self
                .pattern
                .recover_code_cells(code)
                .unwrap_or_else(|_| *self.pattern.template()),
            Matched::Layers(_) => *self.pattern.template(),
        };
        cells
            .cells()
            .filter(|&(_, _, set)| set)
            .map(|(col, layer, _)| (self.horizontal_index + col, layer))
            .collect()
    }
}

impl fmt::Display for ClctCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "clct pattern={} khs={} t={} layers={}",
            self.pattern.id(),
            self.key_half_strip(),
            self.start_time,
            self.layer_count()
        )?;
        if let Some(id) = self.comparator_code_id() {
            write!(f, " cc={} ({})", id, ComparatorCode::base4_string(id))?;
        }
        match self.calibration.entry() {
            Some(e) => writeln!(f, " pos={:.3} slope={:.3} chi2={:.2}", self.key_strip() + e.position, e.slope, e.chi2)?,
            None => writeln!(f, " uncalibrated")?,
        }
        if let Some(code) = self.code() {
            write!(f, "{}", self.pattern.code_picture(code))?;
        }
        Ok(())
    }
}

/// How candidates in a chamber are ordered. `Less` means better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ranking {
    /// Calibrated first, then more layers, lower chi2, smaller |slope|,
    /// smaller fitted offset from the key half-strip
    #[default]
    Quality,
    /// More layers, then bend bit set, then lower key half-strip
    Cfeb,
}

impl Ranking {
    pub fn compare(self, a: &ClctCandidate, b: &ClctCandidate) -> Ordering {
        match self {
            Ranking::Quality => compare_quality(a, b),
            Ranking::Cfeb => compare_cfeb(a, b),
        }
    }

    /// Stable sort, best first.
    pub fn sort(self, candidates: &mut [ClctCandidate]) {
        candidates.sort_by(|a, b| self.compare(a, b));
    }

    /// Index of the best candidate; the earliest wins among equals.
    pub fn best(self, candidates: &[ClctCandidate]) -> Option<usize> {
        candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| self.compare(a, b))
            .map(|(i, _)| i)
    }
}

fn compare_quality(a: &ClctCandidate, b: &ClctCandidate) -> Ordering {
    let (ea, eb) = match (a.calibration.entry(), b.calibration.entry()) {
        (Some(ea), Some(eb)) => (ea, eb),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => return b.layer_count().cmp(&a.layer_count()),
    };
    // Exact ties go to the offset whose centre sits on the fitted track.
    b.layer_count()
        .cmp(&a.layer_count())
        .then_with(|| ea.chi2.total_cmp(&eb.chi2))
        .then_with(|| ea.slope.abs().total_cmp(&eb.slope.abs()))
        .then_with(|| ea.position.abs().total_cmp(&eb.position.abs()))
}

fn compare_cfeb(a: &ClctCandidate, b: &ClctCandidate) -> Ordering {
    b.layer_count()
        .cmp(&a.layer_count())
        .then_with(|| b.bend_bit().cmp(&a.bend_bit()))
        .then_with(|| a.key_half_strip().cmp(&b.key_half_strip()))
}
