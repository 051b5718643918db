//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// General failure.
    pub const FAILURE: i32 = 1;

    /// Resource not found (config, ledger, row).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments (bad position, unknown table).
    pub const INVALID_INPUT: i32 = 4;

    /// Integrity check failed.
    pub const INTEGRITY_FAILED: i32 = 6;
}

/// Environment variable holding the ledger path.
pub const LEDGER_PATH_ENV: &str = "AMMO_LEDGER_PATH";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "AMMO_CONFIG";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "AMMO_LOG";

/// Environment variable selecting the log format (`compact` or `json`).
pub const LOG_FORMAT_ENV: &str = "AMMO_LOG_FORMAT";
