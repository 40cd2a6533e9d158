use serde::{Deserialize, Serialize};

/// Report from the orphan-content sweep.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub scanned: u32,
    pub orphaned_removed: u32,
    pub errors: Vec<String>,
}

impl CleanupReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Check if the sweep finished without errors
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }
}
