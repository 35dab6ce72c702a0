//! Lookup table from (pattern, comparator code) to a fitted track segment.
//!
//! The table goes through three states. A [`LutLoader`] starts empty and
//! accepts entries; [`LutLoader::make_final`] consumes it and returns a
//! read-only [`Lut`] that only answers queries. Because the frozen table has
//! no mutating methods it can be shared across threads freely once built.
//!
//! ## Text format
//!
//! One record per line, whitespace separated:
//!
//! ```text
//! # patternId codeId layers chi2 slope position ndf nsegments
//! 100 2730 6 0.000 0.0000 0.0000 4 0
//! ```
//!
//! Blank lines and `#` comments are ignored.

pub mod builder;

pub use builder::LinearFitBuilder;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::LutError;

/// Key into the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LutKey {
    pub pattern_id: u32,
    pub code_id: u32,
}

impl LutKey {
    pub const fn new(pattern_id: u32, code_id: u32) -> Self {
        Self {
            pattern_id,
            code_id,
        }
    }
}

impl fmt::Display for LutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(pattern {}, code {})", self.pattern_id, self.code_id)
    }
}

/// Fitted segment parameters for one pattern/code combination.
///
/// `position` is the offset of the segment at the key layer from the key
/// half-strip, in strips; `slope` is in strips per layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LutEntry {
    pub position: f32,
    pub slope: f32,
    pub chi2: f32,
    pub ndf: u32,
    pub layers: u32,
    /// Segments that contributed to a data-driven fit (0 for geometric fits)
    pub nsegments: u32,
}

impl LutEntry {
    pub fn new(position: f32, slope: f32, chi2: f32, ndf: u32, layers: u32) -> Self {
        Self {
            position,
            slope,
            chi2,
            ndf,
            layers,
            nsegments: 0,
        }
    }
}

/// Lifecycle state of a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutState {
    /// Nothing loaded yet
    Empty,
    /// Accepting entries
    Loading,
    /// Frozen, queries only
    Final,
}

/// A table being filled.
#[derive(Debug, Clone, Default)]
pub struct LutLoader {
    entries: HashMap<LutKey, LutEntry>,
}

impl LutLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LutState {
        if self.entries.is_empty() {
            LutState::Empty
        } else {
            LutState::Loading
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add one entry. Each key may be inserted once.
    pub fn insert(&mut self, key: LutKey, entry: LutEntry) -> Result<(), LutError> {
        if self.entries.contains_key(&key) {
            return Err(LutError::DuplicateKey(key));
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Add a batch of records; returns how many were inserted.
    pub fn load_records(
        &mut self,
        records: impl IntoIterator<Item = (LutKey, LutEntry)>,
    ) -> Result<usize, LutError> {
        let mut count = 0;
        for (key, entry) in records {
            self.insert(key, entry)?;
            count += 1;
        }
        Ok(count)
    }

    /// Parse records in the text format; returns how many were inserted.
    pub fn load_text<R: BufRead>(&mut self, reader: R) -> Result<usize, LutError> {
        let mut count = 0;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let record = line.split('#').next().unwrap_or("").trim();
            if record.is_empty() {
                continue;
            }
            let (key, entry) = parse_record(record, index + 1)?;
            self.insert(key, entry).map_err(|e| LutError::Parse {
                line: index + 1,
                reason: e.to_string(),
            })?;
            count += 1;
        }
        tracing::debug!(entries = count, "loaded LUT records");
        Ok(count)
    }

    /// Parse a text table from disk.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, LutError> {
        let file = File::open(path)?;
        self.load_text(BufReader::new(file))
    }

    /// Freeze the table.
    pub fn make_final(self) -> Lut {
        let mut keys: Vec<LutKey> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        Lut {
            entries: self.entries,
            keys,
        }
    }
}

/// A frozen, query-only table.
#[derive(Debug, Clone, Default)]
pub struct Lut {
    entries: HashMap<LutKey, LutEntry>,
    keys: Vec<LutKey>,
}

impl Lut {
    /// A final table with no entries: every candidate is uncalibrated.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LutState {
        LutState::Final
    }

    /// Entry for `key`, or `None` when that combination was never fitted.
    #[inline]
    pub fn entry(&self, key: &LutKey) -> Option<&LutEntry> {
        self.entries.get(key)
    }

    /// Shorthand for `entry(&LutKey::new(pattern_id, code_id))`.
    pub fn get(&self, pattern_id: u32, code_id: u32) -> Option<&LutEntry> {
        self.entry(&LutKey::new(pattern_id, code_id))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&LutKey, &LutEntry)> {
        self.keys
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|entry| (key, entry)))
    }

    /// Write the table in the text format, in key order.
    pub fn write_text<W: Write>(&self, mut writer: W) -> Result<(), LutError> {
        writeln!(
            writer,
            "# patternId codeId layers chi2 slope position ndf nsegments"
        )?;
        for (key, e) in self.iter() {
            writeln!(
                writer,
                "{} {} {} {:.6} {:.6} {:.6} {} {}",
                key.pattern_id, key.code_id, e.layers, e.chi2, e.slope, e.position, e.ndf, e.nsegments
            )?;
        }
        Ok(())
    }

    /// Write the table to disk.
    pub fn save(&self, path: &Path) -> Result<(), LutError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_text(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Diagnostic dump of the whole table.
    pub fn dump(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_text(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Reopen the table for more entries.
    pub fn into_loader(self) -> LutLoader {
        LutLoader {
            entries: self.entries,
        }
    }
}

fn parse_record(record: &str, line: usize) -> Result<(LutKey, LutEntry), LutError> {
    let fields: Vec<&str> = record.split_whitespace().collect();
    if fields.len() != 8 {
        return Err(LutError::Parse {
            line,
            reason: format!("expected 8 fields, found {}", fields.len()),
        });
    }
    fn field<T: std::str::FromStr>(value: &str, name: &str, line: usize) -> Result<T, LutError> {
        value.parse().map_err(|_| LutError::Parse {
            line,
            reason: format!("invalid {} '{}'", name, value),
        })
    }
    let key = LutKey::new(
        field(fields[0], "pattern id", line)?,
        field(fields[1], "code id", line)?,
    );
    let entry = LutEntry {
        layers: field(fields[2], "layer count", line)?,
        chi2: field(fields[3], "chi2", line)?,
        slope: field(fields[4], "slope", line)?,
        position: field(fields[5], "position", line)?,
        ndf: field(fields[6], "ndf", line)?,
        nsegments: field(fields[7], "segment count", line)?,
    };
    Ok((key, entry))
}
