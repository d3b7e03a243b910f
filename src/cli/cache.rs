//! Offline cache CLI subcommands.

use clap::Subcommand;

/// Asset cache commands.
///
/// The cache version and origin come from `config.yaml`; assets are read
/// from the configured asset directory.
#[derive(Subcommand, Debug, Clone)]
pub enum CacheCommand {
    /// Cache the app shell for the current version.
    Install {
        /// Also activate immediately, purging older versions
        #[arg(long)]
        skip_waiting: bool,
    },

    /// Activate the current version, purging every other bucket.
    Activate,

    /// List cache buckets.
    Status,

    /// Fetch a URL through the cache.
    Fetch {
        /// Absolute URL
        url: String,
    },
}
