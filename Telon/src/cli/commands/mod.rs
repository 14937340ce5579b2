use clap::Subcommand;
use std::path::PathBuf;

pub mod batch;
pub mod definitions;
pub mod execute;
pub mod mesh;
pub mod package;
pub mod properties;

use definitions::PackageCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Package container operations
    Package {
        #[command(subcommand)]
        command: PackageCommands,
    },

    /// Decode property lists of a package's exports
    Properties {
        /// Package file
        file: PathBuf,

        /// Only decode the export with this object name
        #[arg(short, long)]
        export: Option<String>,

        /// Search for the property start when offset 0 yields nothing
        #[arg(long)]
        scan: bool,

        /// Write decoded lists to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode StaticMesh exports
    Mesh {
        /// Package file
        file: PathBuf,

        /// Only decode the mesh with this object name
        #[arg(short, long)]
        export: Option<String>,

        /// Write the decoded meshes to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decoder options TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Decode every StaticMesh in a directory of packages
    Batch {
        /// Directory to search for package files
        dir: PathBuf,

        /// Write the batch report to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decoder options TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}
