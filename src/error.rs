use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::grid_config::SlotId;

/// Problems with the shape of a puzzle. These are input errors and are reported as soon as the
/// grid config is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("the structure has no rows")]
    EmptyStructure,

    #[error("row {row} has {found} cells but the grid is {expected} cells wide")]
    RaggedRow { row: usize, expected: usize, found: usize },

    #[error("slot {slot_id} starting at ({row}, {col}) is {length} cells long; the minimum is 2")]
    SlotTooShort { slot_id: SlotId, row: usize, col: usize, length: usize },

    #[error("slot {slot_id} starting at ({row}, {col}) runs outside the {height}x{width} grid")]
    SlotOutOfBounds { slot_id: SlotId, row: usize, col: usize, height: usize, width: usize },

    #[error("slots {first} and {second} run in the same direction through cell ({row}, {col})")]
    ParallelSlots { first: SlotId, second: SlotId, row: usize, col: usize },
}

/// Ways a fill attempt can end without producing a grid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// Node or arc consistency left a slot without candidates, so search was never started.
    #[error("no solution: slot {slot_id} has no remaining candidate words")]
    DomainWipeout { slot_id: SlotId },

    /// Every choice reachable from the root was tried.
    #[error("no solution: search exhausted after {states} states")]
    SearchExhausted { states: u64 },

    #[error("search abandoned after reaching the limit of {limit} states")]
    StateLimitExceeded { limit: u64 },
}

impl FillFailure {
    /// Is this a definite answer that the puzzle can't be filled with the given words?
    pub fn is_no_solution(&self) -> bool {
        matches!(self, FillFailure::DomainWipeout { .. } | FillFailure::SearchExhausted { .. })
    }
}

/// Errors raised while reading a puzzle from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a usable font: {source}")]
    Font {
        path: PathBuf,
        #[source]
        source: ab_glyph::InvalidFont,
    },

    #[error(transparent)]
    Grid(#[from] GridError),
}
