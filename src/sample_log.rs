//! The full history of a session, kept for export.

use crate::record::Sample;

/// Every sample received this session, oldest first. Only ever read back for
/// export, and only ever emptied by an explicit clear.
#[derive(Debug, Clone, Default)]
pub struct SampleLog {
    data: Vec<Sample>,
}

impl SampleLog {
    /// Instantiates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `sample` after everything already logged.
    pub fn append(&mut self, sample: Sample) {
        self.data.push(sample);
    }

    /// Every sample, oldest first.
    pub fn snapshot(&self) -> &[Sample] {
        &self.data
    }

    /// Number of samples logged.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Forgets every sample.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
