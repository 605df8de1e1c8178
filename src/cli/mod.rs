use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use pico::reader::CentroidProcessing;

mod check;
mod chromatograms;
mod config;
mod convert;
mod info;

/// pico - Waters raw directory to byspec2 converter
#[derive(Parser)]
#[command(name = "pico-convert")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Peak routing mode, numbered as recorded in the output.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ModeArg {
    /// 0: centroid everything, raw blobs
    AllUncompressed,
    /// 1: centroid everything, compressed
    All,
    /// 2: profile at every level plus centroided survey scans
    Ms1Profile,
    /// 3: like ms1-profile, raw blobs
    Ms1ProfileUncompressed,
    /// 4: profile survey scans, centroided fragment scans
    #[default]
    Msn,
    /// 5: like msn, raw blobs
    MsnUncompressed,
    /// 6: compressed profile everywhere with centroided companions
    TestProfileCompression,
}

impl From<ModeArg> for CentroidProcessing {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::AllUncompressed => CentroidProcessing::AllUncompressed,
            ModeArg::All => CentroidProcessing::All,
            ModeArg::Ms1Profile => CentroidProcessing::Ms1Profile,
            ModeArg::Ms1ProfileUncompressed => CentroidProcessing::Ms1ProfileUncompressed,
            ModeArg::Msn => CentroidProcessing::Msn,
            ModeArg::MsnUncompressed => CentroidProcessing::MsnUncompressed,
            ModeArg::TestProfileCompression => CentroidProcessing::TestProfileCompression,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Waters .raw directory to byspec2
    Convert {
        /// Input .raw directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output byspec2 file (defaults to INPUT with a .byspec2 extension)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Peak routing mode (default: msn)
        #[arg(short = 'm', long, value_enum)]
        mode: Option<ModeArg>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Centroiding m/z uncertainty (Gaussian sigma)
        #[arg(short = 'u', long)]
        uncertainty: Option<f64>,

        /// Keep only the N most intense centroids per scan
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Decode functions in parallel (requires the parallel feature)
        #[arg(long, default_value_t = false)]
        parallel: bool,

        // === Advanced tuning flags (hidden from --help) ===
        /// Skip the integrity pre-flight
        #[arg(long, hide = true)]
        no_check: bool,

        /// Re-insert stripped zero points before centroiding
        #[arg(long, hide = true)]
        restore_zeros: bool,
    },

    /// Write only the chromatograms of a Waters .raw directory
    Chromatograms {
        /// Input .raw directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output byspec2 file (defaults to INPUT with a .byspec2 extension)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Check that a Waters .raw directory has what a conversion needs
    Check {
        /// Input .raw directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Show how the functions of a Waters .raw directory were classified
    Info {
        /// Input .raw directory
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// `sample.raw` becomes `sample.byspec2` next to it.
fn default_output(input: &Path) -> PathBuf {
    input.with_extension("byspec2")
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            mode,
            config,
            uncertainty,
            top_k,
            parallel,
            no_check,
            restore_zeros,
        } => convert::run(convert::ConvertArgs {
            input,
            output,
            mode: mode.map(CentroidProcessing::from),
            config,
            uncertainty,
            top_k,
            parallel,
            no_check,
            restore_zeros,
        }),
        Commands::Chromatograms { input, output } => chromatograms::run(input, output),
        Commands::Check { input } => check::run(input),
        Commands::Info { input, json } => info::run(input, json),
    }
}
