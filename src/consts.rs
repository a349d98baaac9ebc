//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Byte-level constants shared by the masking engine and the file helpers.

/// FASTA header marker
pub const HEADER_PREFIX: u8 = b'>';

/// Ambiguity symbol written over hard-masked bases
pub const HARD_MASK_SYMBOL: u8 = b'N';

pub const LINE_FEED: u8 = b'\n';
pub const CARRIAGE_RETURN: u8 = b'\r';

/// Extensions treated as gzip-compressed input/output
pub const GZIP_EXTENSIONS: [&str; 2] = ["gz", "bgz"];
