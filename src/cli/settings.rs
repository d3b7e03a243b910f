//! Settings CLI subcommands.

use clap::Subcommand;

/// Settings commands.
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Show current settings as JSON.
    Show,

    /// Set the theme: auto, light or dark.
    #[command(name = "dark-mode")]
    DarkMode {
        /// Mode
        mode: String,
    },

    /// Turn notifications on or off.
    Notifications {
        /// on or off
        state: String,
    },
}
