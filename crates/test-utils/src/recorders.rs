use std::sync::{Arc, Mutex};

use globwatch::FileRecord;
use globwatch::logging::{EventLogger, Segment, render_plain};

/// Logger that keeps every line, rendered without styling.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    infos: Arc<Mutex<Vec<Vec<Segment>>>>,
    warnings: Arc<Mutex<Vec<Vec<Segment>>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().iter().map(|s| render_plain(s)).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap()
            .iter()
            .map(|s| render_plain(s))
            .collect()
    }

    /// Raw segments of every warning, styles included.
    pub fn warning_segments(&self) -> Vec<Vec<Segment>> {
        self.warnings.lock().unwrap().clone()
    }
}

impl EventLogger for RecordingLogger {
    fn info(&self, segments: &[Segment]) {
        self.infos.lock().unwrap().push(segments.to_vec());
    }

    fn warn(&self, segments: &[Segment]) {
        self.warnings.lock().unwrap().push(segments.to_vec());
    }
}

/// Collects every record handed to the per-record callback.
#[derive(Debug, Clone, Default)]
pub struct RecordingCallback {
    records: Arc<Mutex<Vec<FileRecord>>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// A closure suitable for `Collaborators::callback`.
    pub fn callback(&self) -> impl Fn(&FileRecord) + Send + Sync + 'static {
        let records = Arc::clone(&self.records);
        move |record: &FileRecord| records.lock().unwrap().push(record.clone())
    }

    pub fn records(&self) -> Vec<FileRecord> {
        self.records.lock().unwrap().clone()
    }
}
