//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! This tool rewrites every FASTA record so that bases covered by any BED
//! interval for that record are soft-masked (lowercase) or hard-masked (N),
//! while the rest of the sequence is normalized to uppercase. Intervals may
//! be unsorted, overlapping or nested; the FASTA file is processed as a
//! single forward stream.
//!
//! # Usage
//!
//! ```bash
//! Usage: famask [OPTIONS] --fa <FASTA> --bed <BED>
//!
//! Options:
//!   -f, --fa <FASTA>         Path to FASTA file (.fa or .fa.gz)
//!   -b, --bed <BED>          Path to BED file with regions to mask (.bed or .bed.gz)
//!   -A, --soft-add           Lowercase masked bases and keep existing lowercase elsewhere
//!   -S, --soft               Lowercase masked bases and uppercase everything else
//!   -H, --hard               Replace masked bases with N
//!   -o, --output <OUTPUT>    Write masked FASTA here instead of stdout
//!   -Z, --compress           Gzip-compress the output file (requires --output)
//!   -C, --check-sorted       Fail if BED starts are not sorted within a sequence
//!   -L, --level <LEVEL>      Logging verbosity level [default: info]
//!   -h, --help               Print help
//!   -V, --version            Print version
//! ```

pub mod bed;
pub mod cli;
pub mod consts;
pub mod core;
pub mod error;
pub mod index;
pub mod interval;

pub use bed::{BedReader, BedRecord};
pub use cli::{Args, MaskMode};
pub use crate::core::{MaskStats, famask, mask_fasta};
pub use error::{FaMaskError, Result};
pub use index::IntervalIndex;
pub use interval::{Interval, IntervalStore, StoreCursor};
