//! Upload hand-off
//!
//! Documents and a simulation requirement are collected in one step and
//! consumed by the ontology submission in a later one. The hand-off is an
//! explicit value passed between those steps: stash, take once, empty.

/// A document to upload, held in memory so retried submissions resend the
/// exact same bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Files plus the requirement they were collected for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub files: Vec<UploadFile>,
    pub simulation_requirement: String,
}

/// Single-use carrier for a [`PendingUpload`]
#[derive(Debug, Default)]
pub struct UploadHandoff {
    pending: Option<PendingUpload>,
}

impl UploadHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an upload, replacing any previous one that was never taken
    pub fn stash(&mut self, files: Vec<UploadFile>, simulation_requirement: impl Into<String>) {
        self.pending = Some(PendingUpload {
            files,
            simulation_requirement: simulation_requirement.into(),
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Removes and returns the stashed upload
    pub fn take(&mut self) -> Option<PendingUpload> {
        self.pending.take()
    }

    /// Drops the stashed upload without consuming it
    pub fn clear(&mut self) {
        self.pending = None;
    }
}
