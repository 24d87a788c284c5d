use serde::{Deserialize, Serialize};
use sipf_frame::FrameConfig;

use crate::error::Result;
use crate::object::MAX_OBJECT_LEN;
use crate::rx::DEFAULT_ARENA_CAPACITY;

/// Default delay between paced register operations.
pub const DEFAULT_PACING_DELAY_MS: u64 = 200;

/// Bound on a convergence poll.
///
/// The poll stops at whichever limit is reached first. Leaving both unset
/// polls until the module converges, which may be forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollBudget {
    /// Maximum number of read-back attempts.
    pub max_attempts: Option<u32>,
    /// Maximum time spent polling, in milliseconds.
    pub deadline_ms: Option<u64>,
}

impl PollBudget {
    /// A budget with no limits.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            deadline_ms: None,
        }
    }

    /// True once either limit has been reached.
    pub fn exhausted(&self, attempts: u32, elapsed_ms: u64) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.deadline_ms.is_some_and(|deadline| elapsed_ms >= deadline)
    }
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            max_attempts: Some(50),
            deadline_ms: Some(30_000),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Line framing and timeout tiers.
    pub frame: FrameConfig,
    /// Delay between register writes in multi-step sequences.
    pub pacing_delay_ms: u64,
    /// Bound on the auth mode read-back poll.
    pub auth_poll: PollBudget,
    /// Capacity of arenas created by [`SipfClient::new_arena`](crate::SipfClient::new_arena).
    pub arena_capacity: usize,
    /// Largest object value accepted for transmission.
    pub max_object_len: usize,
}

impl ClientConfig {
    /// Load configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            pacing_delay_ms: DEFAULT_PACING_DELAY_MS,
            auth_poll: PollBudget::default(),
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            max_object_len: MAX_OBJECT_LEN,
        }
    }
}
