//! # Output Configuration
//!
//! Controls how the CLI decorates its output: emoji status markers, and the
//! colored installation state shown by `status`. Both fall back to plain
//! bracketed text when the terminal or the user says so, which also keeps the
//! output stable for scripts and tests.
//!
//! ## Respecting User Preferences
//!
//! The following flags and environment variables are honored, in this order:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```
//! use monkey_patch::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("never");
//! assert_eq!(emoji(&out, "✅", "[OK]"), "[OK]");
//! ```

use crate::reconcile::InstallationState;
use console::style;
use std::env;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the `--color` flag: "always", "never" or "auto"
    ///
    /// # Behavior
    /// - `--color=always`: colors on, even when `NO_COLOR` is set
    /// - `--color=never`: colors off
    /// - anything else: detect from the environment
    ///
    /// Detection turns colors off when `NO_COLOR` is present (even empty),
    /// when `CLICOLOR=0` or `TERM=dumb`, or when stdout is not a color
    /// terminal. `CLICOLOR_FORCE` overrides the terminal check.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
    fn detect_color_support() -> bool {
        // https://no-color.org/: presence alone disables colors, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        // CLICOLOR_FORCE wins over TTY detection
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// A configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// A configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Pick the emoji when colors are enabled, the plain marker otherwise.
///
/// Plain markers are bracketed words such as `[OK]` or `[RESTART]`.
///
/// # Arguments
/// * `config` - The output configuration
/// * `emoji_str` - Shown when colors are enabled
/// * `plain` - Shown when colors are disabled
///
/// # Example
/// ```
/// use monkey_patch::output::{emoji, OutputConfig};
///
/// let config = OutputConfig::from_env_and_flag("never");
/// println!("{} Regenerated shims", emoji(&config, "🔁", "[GEN]"));
/// ```
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render an installation state, colored when enabled.
///
/// `patched` is green, `unpatched` dim and `drifted` bold red. Styling is
/// forced: `config` alone decides whether colors apply.
pub fn state_label(config: &OutputConfig, state: InstallationState) -> String {
    let text = state.to_string();
    if !config.use_color {
        return text;
    }
    let styled = match state {
        InstallationState::Patched => style(text).green(),
        InstallationState::Unpatched => style(text).dim(),
        InstallationState::Drifted => style(text).red().bold(),
    };
    styled.force_styling(true).to_string()
}
