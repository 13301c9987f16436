/**
 * ============================================================================
 * LOGGING MODULE
 * ============================================================================
 *
 * PURPOSE: Log output of the rankings client through the `log` facade
 *
 * - Every line carries the "(mc-rankings) > " prefix
 * - Info and debug lines can be silenced, warnings never are
 * - The host installs the logger
 *
 * ============================================================================
 */

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const LOG_PREFIX: &str = "(mc-rankings) > ";

/**
 * Shared handle to the client's log output
 * Clones share the info switch, so `without_logging` reaches tasks
 * that are already in flight
 */
#[derive(Debug, Clone)]
pub struct Reporter {
    log_infos: Arc<AtomicBool>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self {
            log_infos: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Reporter {
    /// Suppress informational and debug output. Warnings are always logged.
    pub fn silence_infos(&self) {
        self.log_infos.store(false, Ordering::Relaxed);
    }

    pub fn infos_enabled(&self) -> bool {
        self.log_infos.load(Ordering::Relaxed)
    }

    pub fn info(&self, message: impl Display) {
        if self.infos_enabled() {
            log::info!("{}{}", LOG_PREFIX, message);
        }
    }

    pub fn debug(&self, message: impl Display) {
        if self.infos_enabled() {
            log::debug!("{}{}", LOG_PREFIX, message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!("{}{}", LOG_PREFIX, message);
    }
}
