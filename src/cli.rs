//! Clap adapter for strata.
//!
//! This module is the **optional integration layer** between the
//! framework-agnostic store and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! [`ConfigArgs`] embeds into your clap derive to give `config list|get|dump`
//! subcommands. [`ConfigArgs::into_action()`] converts the parsed arguments
//! into a [`ConfigAction`](crate::ConfigAction), which
//! [`Settings::handle()`](crate::Settings::handle) executes.

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// ```ignore
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show all resolved settings as dotted key-value pairs.
    List,
    /// Show the resolved value of one setting.
    Get {
        /// Dotted key path (e.g. "database.url").
        key: String,
    },
    /// Print the whole merged settings tree as JSON.
    Dump,
}

impl ConfigArgs {
    /// Convert clap-parsed args into a framework-agnostic `ConfigAction`.
    ///
    /// Bare `config` (no subcommand) and explicit `config list` both map to
    /// `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
            Some(ConfigSubcommand::Dump) => ConfigAction::Dump,
        }
    }
}
