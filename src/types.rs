use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// How many worker messages the controller consumes per poll tick.
///
/// - `One`: pop at most one message per tick (default). A burst of messages
///   is spread over consecutive ticks.
/// - `All`: pop everything currently queued on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainPolicy {
    One,
    All,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        DrainPolicy::One
    }
}

impl FromStr for DrainPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "one" => Ok(DrainPolicy::One),
            "all" => Ok(DrainPolicy::All),
            other => Err(format!(
                "invalid drain policy: {other} (expected \"one\" or \"all\")"
            )),
        }
    }
}

/// Status of a single job item in the queue.
///
/// Transitions only ever go `Queued -> Running -> Done | Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Errored,
}

impl JobStatus {
    /// Whether the item has reached a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Errored)
    }
}
