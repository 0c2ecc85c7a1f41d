//! Config struct definition and default implementation.

use serde::{Deserialize, Serialize};

/// Default ceiling for the shared-lock slot probe.
pub const DEFAULT_SHARED_LOCK_PROBE_LIMIT: u64 = 65_536;

/// Default number of visible characters for `displayable_path`.
pub const DEFAULT_DISPLAY_PATH_WIDTH: usize = 40;

/// Configuration for restricted creation and advisory locking.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Restricted creation
    // =========================================================================
    /// Skip the staging/lockdown/rename procedure and create objects with the
    /// platform's default permissions.
    ///
    /// This is an explicit opt-out for environments that do not want
    /// owner-only objects. It is never the default.
    pub disable_restricted_files: bool,

    // =========================================================================
    // Locking
    // =========================================================================
    /// Treat the platform as having no shared locks and always use the
    /// exclusive single-byte slot scheme for shared requests.
    pub emulate_shared_locks: bool,

    /// Number of byte positions the shared-lock slot probe may try before
    /// giving up.
    #[serde(default = "default_shared_lock_probe_limit")]
    pub shared_lock_probe_limit: u64,

    // =========================================================================
    // Display
    // =========================================================================
    /// Visible characters used when shortening paths for display.
    #[serde(default = "default_display_path_width")]
    pub display_path_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disable_restricted_files: false,
            emulate_shared_locks: false,
            shared_lock_probe_limit: default_shared_lock_probe_limit(),
            display_path_width: default_display_path_width(),
        }
    }
}

fn default_shared_lock_probe_limit() -> u64 {
    DEFAULT_SHARED_LOCK_PROBE_LIMIT
}

fn default_display_path_width() -> usize {
    DEFAULT_DISPLAY_PATH_WIDTH
}
