//! The analytics engine: pure, synchronous functions over in-memory series.
//!
//! Everything in this module tree is side-effect-free. Inputs are
//! already-materialized `Series` and slices; outputs are new arrays. No
//! module here performs I/O, reads configuration, or holds shared state, so
//! independent requests can run these functions concurrently on separate
//! inputs without synchronization.

pub mod align;
pub mod events;
pub mod matrix;
pub mod reindex;
pub mod returns;
pub mod rolling;
pub mod stats;

pub use align::{align, AlignedPanel};
pub use events::{aggregate_events, MultiEventTable};
pub use matrix::{build_matrices, BetaMatrix, CorrelationMatrix};
pub use reindex::{reindex_around, ReindexedEventSeries};
pub use returns::pct_change;
pub use rolling::{rolling_beta, rolling_correlation, RollingSeries};

use std::fmt;

/// Errors the engine surfaces to callers.
///
/// Degenerate arithmetic (flat windows, zero variance, offsets with no
/// finite values) is handled inside the formulas with defined values and
/// never reaches this enum; these variants cover the cases where no sane
/// numeric answer exists and the caller must decide what to drop or report.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Alignment produced zero common dates. Carries per-series point
    /// counts so the caller can report which assets lacked overlap.
    InsufficientData { counts: Vec<(String, usize)> },
    /// A percent-change base value was exactly zero at `index`.
    DivisionByZero { asset: Option<String>, index: usize },
    /// A series had no observation anywhere in or before the requested
    /// window.
    NoData { asset: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InsufficientData { counts } => {
                write!(f, "No common dates across series (")?;
                for (i, (name, count)) in counts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {} points", name, count)?;
                }
                write!(f, ")")
            }
            EngineError::DivisionByZero { asset, index } => match asset {
                Some(name) => write!(f, "Zero base value for {} at index {}", name, index),
                None => write!(f, "Zero base value at index {}", index),
            },
            EngineError::NoData { asset } => {
                write!(f, "No data for {} in or before the requested window", asset)
            }
        }
    }
}

impl std::error::Error for EngineError {}
