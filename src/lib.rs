//! Fill a crossword grid from a dictionary by treating it as a constraint satisfaction problem:
//! each slot is a variable whose domain is the set of words that could still go there, and each
//! pair of crossing slots must agree on their shared letter. Domains are pruned with node and arc
//! consistency, then a backtracking search picks one word per slot.

pub mod arc_consistency;
pub mod backtracking_search;
pub mod domains;
pub mod error;
pub mod grid_config;
pub mod load;
pub mod solution;
pub mod word_list;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

pub use backtracking_search::{
    find_fill, find_fill_with_options, Choice, FillOptions, FillSuccess, Statistics, ValueOrdering,
};
pub use error::{FillFailure, GridError, LoadError};
pub use grid_config::{generate_grid_config, Direction, GridConfig, GridEntry, SlotId};
pub use load::{load_font, load_grid_config};
pub use solution::{letter_grid, render_grid, render_image, save_image};
pub use word_list::{WordId, WordList};
