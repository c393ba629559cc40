use std::path::PathBuf;

use clap::{Parser, Subcommand};
use typed_bytesize::ByteSizeIec;

#[derive(Parser)]
#[command(name = "vdisk", about = "Virtual FAT16 volume tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create (or open) a file-backed volume, formatting new files
    Create {
        /// Image file
        path: PathBuf,

        /// Volume size, e.g. `16MiB`
        #[arg(
            long,
            short,
            default_value = "16MiB",
            value_parser = |s: &str| s.parse::<ByteSizeIec>().map(|b| b.0).map_err(|e| e.to_string())
        )]
        size: u64,

        /// Leave a new image unformatted
        #[arg(long)]
        no_format: bool,
    },

    /// Print the boot sector and device-control answers of an existing image
    Inspect {
        /// Image file
        path: PathBuf,
    },

    /// Write/read round trip on a memory volume
    Selftest {
        /// Volume size, e.g. `8MiB`
        #[arg(
            long,
            short,
            default_value = "8MiB",
            value_parser = |s: &str| s.parse::<ByteSizeIec>().map(|b| b.0).map_err(|e| e.to_string())
        )]
        size: u64,
    },
}
