//! # pico Converter
//!
//! A command-line tool for converting Waters `.raw` acquisition directories to
//! byspec2 SQLite databases.
//!
//! ## Usage
//!
//! ```bash
//! # Convert with the default routing (profile MS1, centroided MSn)
//! pico-convert convert sample.raw sample.byspec2
//!
//! # Centroid everything, keep the 200 strongest peaks per scan
//! pico-convert -v convert sample.raw --mode all --top-k 200
//!
//! # Chromatograms only
//! pico-convert chromatograms sample.raw
//!
//! # Pre-flight check and classification
//! pico-convert check sample.raw
//! pico-convert info sample.raw --json
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::{dispatch, init_logging, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());
    dispatch(cli)
}
