//! Clap argument definitions for the `xdump` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xdump")]
#[command(about = "Recovers game-content artefacts from Xbox 360 process memory dumps", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all but error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract recognised files from a dump
    Carve {
        /// Path to the dump file (flat image or MDMP container)
        dump: PathBuf,

        /// Directory under which `<dump_stem>/` is created
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum candidates to carve per signature type
        #[arg(long)]
        per_type_cap: Option<usize>,

        /// Number of worker threads (defaults to rayon's global pool)
        #[arg(short = 'j', long)]
        workers: Option<usize>,

        /// Convert carved DDX textures to DDS using the external converter
        #[arg(long)]
        convert: bool,

        /// Path to the DDX-to-DDS converter executable
        #[arg(long)]
        converter_path: Option<String>,
    },

    /// Summarise a dump's structure without extracting any files
    Analyze {
        /// Path to the dump file
        dump: PathBuf,
    },

    /// List the modules recorded in a minidump's Module List stream
    Modules {
        /// Path to the dump file
        dump: PathBuf,
    },

    /// Inspect or update persisted default settings
    Configure {
        /// Default output directory for future `carve` runs
        #[arg(long)]
        output_root: Option<PathBuf>,

        /// Default worker count for future `carve` runs
        #[arg(long)]
        workers: Option<usize>,

        /// Default per-type cap for future `carve` runs
        #[arg(long)]
        per_type_cap: Option<usize>,

        /// Default DDX conversion setting for future `carve` runs
        #[arg(long)]
        convert: Option<bool>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
