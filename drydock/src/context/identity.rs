//! Run identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a single pipeline run.
///
/// Every call to run() gets a fresh identity so repeated runs of the
/// same pipeline can be told apart in logs and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunIdentity {
    /// Unique id for this run.
    pub run_id: Uuid,
}

impl RunIdentity {
    /// Creates a new identity with a random run id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
        }
    }

    /// Creates an identity from an existing id.
    #[must_use]
    pub fn from_uuid(run_id: Uuid) -> Self {
        Self { run_id }
    }

    /// Returns a short prefix of the run id for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        self.run_id.to_string().chars().take(8).collect()
    }
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.run_id)
    }
}
