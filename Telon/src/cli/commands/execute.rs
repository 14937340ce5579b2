//! Command execution implementations

use super::Commands;
use super::definitions::PackageCommands;
use super::{batch, mesh, package, properties};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Package { command } => command.execute(),
            Commands::Properties {
                file,
                export,
                scan,
                output,
            } => properties::execute(file, export.as_deref(), *scan, output.as_deref()),
            Commands::Mesh {
                file,
                export,
                output,
                config,
            } => mesh::execute(file, export.as_deref(), output.as_deref(), config.as_deref()),
            Commands::Batch {
                dir,
                output,
                config,
                quiet,
            } => batch::execute(dir, output.as_deref(), config.as_deref(), *quiet),
        }
    }
}

impl PackageCommands {
    /// Execute the selected package command.
    ///
    /// # Errors
    /// Returns an error if the package cannot be read or the output written.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            PackageCommands::Info { file } => package::info(file),
            PackageCommands::Exports { file, class } => package::exports(file, class.as_deref()),
            PackageCommands::Audit { file, output } => package::audit(file, output.as_deref()),
        }
    }
}
