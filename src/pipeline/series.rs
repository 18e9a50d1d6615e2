//! Resampled scalar series and its tabular output.

use crate::analysis::SignalKind;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Ordered scalar values, one per emitted sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSeries {
    kind: SignalKind,
    values: Vec<f64>,
}

impl ScalarSeries {
    /// Creates an empty series.
    pub fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            values: Vec::new(),
        }
    }

    /// Appends `value` `count` times.
    pub fn push_repeated(&mut self, value: f64, count: u64) {
        self.values
            .extend(std::iter::repeat(value).take(count as usize));
    }

    /// Returns the signal kind.
    #[inline]
    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    /// Returns the values in emission order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no samples were emitted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes the series as a single-column table with a header row.
    pub fn write_csv<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "{}", self.kind.column_name())?;
        for value in &self.values {
            writeln!(out, "{}", value)?;
        }
        out.flush()
    }

    /// Writes the series to `path`, replacing any existing file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(BufWriter::new(file))
    }
}
