//! What the user has to do after the generated shims change.
//!
//! The main process reads its shim only at startup, so a changed
//! main-process shim needs a full restart of the host. UI windows re-read
//! their shim on load, so a changed UI shim only needs a window reload. A
//! restart also reloads every window, so it subsumes a reload.
//!
//! Notifications are debounced per category: several configuration sources
//! changing in quick succession produce one prompt, not a storm.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Action the host needs before a change takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Remediation {
    /// Quit and start the host again.
    Restart,
    /// Reload the host's windows.
    Reload,
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remediation::Restart => write!(f, "restart"),
            Remediation::Reload => write!(f, "reload"),
        }
    }
}

/// Which generated shims a regeneration rewrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Regeneration {
    pub main_changed: bool,
    pub ui_changed: bool,
}

impl Regeneration {
    /// Whether any shim was rewritten.
    pub fn changed(&self) -> bool {
        self.main_changed || self.ui_changed
    }

    /// The strongest remediation this change requires, if any.
    pub fn remediation(&self) -> Option<Remediation> {
        if self.main_changed {
            Some(Remediation::Restart)
        } else if self.ui_changed {
            Some(Remediation::Reload)
        } else {
            None
        }
    }
}

/// Suppresses repeats of the same remediation inside a time window.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Decide whether `remediation` should be surfaced at `now`.
    ///
    /// `last_notified` holds unix-millisecond stamps per category and is
    /// updated when the notification is admitted.
    pub fn admit(
        &self,
        last_notified: &mut BTreeMap<Remediation, u64>,
        remediation: Remediation,
        now: SystemTime,
    ) -> bool {
        let now_ms = unix_millis(now);
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);

        if let Some(&last) = last_notified.get(&remediation) {
            if now_ms >= last && now_ms - last < window_ms {
                log::debug!(
                    "Suppressing {} notification ({} ms since the last one)",
                    remediation,
                    now_ms - last
                );
                return false;
            }
        }

        last_notified.insert(remediation, now_ms);
        true
    }
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
