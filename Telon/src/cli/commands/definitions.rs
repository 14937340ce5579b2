//! Subcommand enum definitions for CLI

use clap::Subcommand;
use std::path::PathBuf;

/// Package container commands
#[derive(Subcommand)]
pub enum PackageCommands {
    /// Show header, table counts and exports per class
    Info {
        /// Package file
        file: PathBuf,
    },

    /// List the export table
    Exports {
        /// Package file
        file: PathBuf,

        /// Only list exports of this class (e.g., "StaticMesh")
        #[arg(short, long)]
        class: Option<String>,
    },

    /// Map every byte of the file to a table, an export or a gap
    Audit {
        /// Package file
        file: PathBuf,

        /// Write the audit to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
