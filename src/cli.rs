//! mask fasta sequences using bed intervals
//! Alejandro Gonzales-Irribarren, 2025
//!
//! Command-line arguments and masking-mode resolution.

use clap::{ArgAction, Parser};
use log::Level;

use std::{fmt, path::PathBuf, str::FromStr};

#[derive(Parser, Debug, Clone)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
pub struct Args {
    /// Path to FASTA file (.fa or .fa.gz)
    #[arg(short = 'f', long = "fa")]
    pub fasta: PathBuf,

    /// Path to BED file with regions to mask (.bed or .bed.gz)
    #[arg(short = 'b', long)]
    pub bed: PathBuf,

    /// Lowercase masked bases and keep existing lowercase elsewhere
    #[arg(short = 'A', long = "soft-add", default_value = "false", action = ArgAction::SetTrue)]
    pub soft_add: bool,

    /// Lowercase masked bases and uppercase everything else
    #[arg(short = 'S', long, default_value = "false", action = ArgAction::SetTrue)]
    pub soft: bool,

    /// Replace masked bases with N
    #[arg(short = 'H', long, default_value = "false", action = ArgAction::SetTrue)]
    pub hard: bool,

    /// Write masked FASTA here instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Gzip-compress the output file (requires --output)
    #[arg(short = 'Z', long, requires = "output", default_value = "false", action = ArgAction::SetTrue)]
    pub compress: bool,

    /// Fail if BED starts are not sorted within a sequence
    #[arg(short = 'C', long = "check-sorted", default_value = "false", action = ArgAction::SetTrue)]
    pub check_sorted: bool,

    /// Logging verbosity level
    #[arg(short = 'L', long, default_value = "info")]
    pub level: Level,
}

impl Args {
    /// Resolves the mode flags into a single [`MaskMode`].
    pub fn mode(&self) -> MaskMode {
        MaskMode::from_flags(self.soft_add, self.soft, self.hard)
    }
}

/// Formats the Args struct as a comma-separated string of key=value pairs.
impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fa={}, bed={}, soft_add={}, soft={}, hard={}, output={}, compress={}, check_sorted={}, level={}",
            self.fasta.display(),
            self.bed.display(),
            self.soft_add,
            self.soft,
            self.hard,
            self.output
                .as_ref()
                .map_or_else(|| "stdout".to_string(), |p| p.display().to_string()),
            self.compress,
            self.check_sorted,
            self.level,
        )
    }
}

/// How covered bases are rewritten.
///
/// # Variants
///
/// - `SoftAdd`: lowercase covered bases, leave every other base as it is
/// - `Soft`: lowercase covered bases, uppercase every other base
/// - `Hard`: replace covered bases with `N`, uppercase every other base
///
/// # Example
///
/// ```rust
/// use famask::MaskMode;
///
/// // soft flags win over --hard
/// assert_eq!(MaskMode::from_flags(false, true, true), MaskMode::Soft);
/// assert_eq!(MaskMode::from_flags(false, false, true), MaskMode::Hard);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    SoftAdd,
    #[default]
    Soft,
    Hard,
}

impl MaskMode {
    /// Priority is soft-add, then soft, then hard. No flag at all means soft.
    pub fn from_flags(soft_add: bool, soft: bool, hard: bool) -> Self {
        if soft_add {
            MaskMode::SoftAdd
        } else if soft {
            MaskMode::Soft
        } else if hard {
            MaskMode::Hard
        } else {
            MaskMode::default()
        }
    }

    /// Whether unmasked bases keep their original case.
    pub fn preserves_case(&self) -> bool {
        matches!(self, MaskMode::SoftAdd)
    }

    /// Rewrites one base. `covered` tells if any interval contains it.
    #[inline]
    pub fn apply(&self, base: u8, covered: bool) -> u8 {
        let base = if self.preserves_case() {
            base
        } else {
            base.to_ascii_uppercase()
        };

        match (covered, self) {
            (false, _) => base,
            (true, MaskMode::SoftAdd | MaskMode::Soft) => base.to_ascii_lowercase(),
            (true, MaskMode::Hard) => crate::consts::HARD_MASK_SYMBOL,
        }
    }
}

impl fmt::Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaskMode::SoftAdd => "soft-add",
            MaskMode::Soft => "soft",
            MaskMode::Hard => "hard",
        };
        write!(f, "{}", name)
    }
}

/// Parses a string into a MaskMode variant.
///
/// # Example
///
/// ```rust
/// use famask::MaskMode;
/// use std::str::FromStr;
///
/// assert_eq!(MaskMode::from_str("hard"), Ok(MaskMode::Hard));
/// assert!(MaskMode::from_str("invalid").is_err());
/// ```
impl FromStr for MaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "soft-add" | "softAdd" => Ok(MaskMode::SoftAdd),
            "soft" => Ok(MaskMode::Soft),
            "hard" => Ok(MaskMode::Hard),
            _ => Err(format!("ERROR: Invalid mask mode: {}", s)),
        }
    }
}
