use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

use crate::error::GridError;
use crate::word_list::{Word, WordId, WordList};
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing a slot in the grid. Slots never change once the grid is built.
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,

    /// One entry per cell of the slot, holding the slot that crosses it there (if any).
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("crossings", &self.crossings)
            .finish()
    }
}

/// Two slots are the same slot iff they start at the same cell, face the same way and have the
/// same length.
impl PartialEq for SlotConfig {
    fn eq(&self, other: &Self) -> bool {
        self.start_cell == other.start_cell
            && self.direction == other.direction
            && self.length == other.length
    }
}

impl Eq for SlotConfig {}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| offset_cell(self.start_cell, self.direction, cell_idx))
    }

    /// Ids of the slots crossing this one, in cell order.
    pub fn neighbors(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.crossings.iter().flatten().map(|crossing| crossing.other_slot_id)
    }

    pub fn degree(&self) -> usize {
        self.crossings.iter().flatten().count()
    }
}

fn offset_cell((row, col): GridCoord, direction: Direction, cell_idx: usize) -> GridCoord {
    match direction {
        Direction::Across => (row, col + cell_idx),
        Direction::Down => (row + cell_idx, col),
    }
}

/// An across or down entry in the input to `generate_grid_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEntry {
    pub loc: GridCoord,
    pub len: usize,
    pub dir: Direction,
}

impl GridEntry {
    /// Generate the coords for each cell of this entry.
    fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.len).map(|cell_idx| offset_cell(self.loc, self.dir, cell_idx)).collect()
    }
}

/// A struct representing everything about a puzzle that's static during filling: the grid shape,
/// its slots and how they cross, and the dictionary.
pub struct GridConfig {
    pub height: usize,
    pub width: usize,
    pub fillable: Vec<Vec<bool>>,
    pub slot_configs: Vec<SlotConfig>,
    pub word_list: WordList,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("slot_configs", &self.slot_configs)
            .field("word_list", &self.word_list)
            .finish()
    }
}

impl GridConfig {
    /// Build a grid config from a rectangular grid of fillable flags. Every maximal straight run of
    /// at least two fillable cells becomes a slot; across slots come first (row by row), then down
    /// slots (column by column).
    pub fn from_fillable(
        word_list: WordList,
        fillable: Vec<Vec<bool>>,
    ) -> Result<GridConfig, GridError> {
        let height = fillable.len();
        let width = fillable.first().map(|row| row.len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GridError::EmptyStructure);
        }
        for (row, cells) in fillable.iter().enumerate() {
            if cells.len() != width {
                return Err(GridError::RaggedRow { row, expected: width, found: cells.len() });
            }
        }

        let mut entries: Vec<GridEntry> = vec![];

        for (row, cells) in fillable.iter().enumerate() {
            for (col, len) in runs_in_line(cells.iter().copied()) {
                entries.push(GridEntry { loc: (row, col), len, dir: Direction::Across });
            }
        }

        for col in 0..width {
            for (row, len) in runs_in_line(fillable.iter().map(|cells| cells[col])) {
                entries.push(GridEntry { loc: (row, col), len, dir: Direction::Down });
            }
        }

        check_entry_bounds(height, width, &entries)?;
        build_grid_config(word_list, height, width, fillable, &entries)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        self.word_list.get(word_id)
    }

    /// If slots `x` and `y` cross, return `(i, j)` such that char `i` of `x`'s word has to match
    /// char `j` of `y`'s word.
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<(usize, usize)> {
        if x == y {
            return None;
        }

        self.slot_configs[x].crossings.iter().enumerate().find_map(|(cell_idx, crossing)| {
            crossing
                .filter(|crossing| crossing.other_slot_id == y)
                .map(|crossing| (cell_idx, crossing.other_slot_cell))
        })
    }

    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_configs[slot_id].neighbors()
    }
}

/// Return `(start, length)` for every run of at least two `true` values.
fn runs_in_line<I: Iterator<Item = bool>>(line: I) -> Vec<(usize, usize)> {
    let mut result = vec![];
    let mut run_start: Option<usize> = None;

    for (idx, is_fillable) in line.chain(std::iter::once(false)).enumerate() {
        match (is_fillable, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start > 1 {
                    result.push((start, idx - start));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    result
}

/// Generate a GridConfig for a `height` x `width` grid containing the specified entries. Cells
/// not covered by any entry are treated as blocks.
pub fn generate_grid_config(
    word_list: WordList,
    height: usize,
    width: usize,
    entries: &[GridEntry],
) -> Result<GridConfig, GridError> {
    if height == 0 || width == 0 {
        return Err(GridError::EmptyStructure);
    }

    check_entry_bounds(height, width, entries)?;

    let mut fillable = vec![vec![false; width]; height];
    for entry in entries {
        for (row, col) in entry.cell_coords() {
            fillable[row][col] = true;
        }
    }

    build_grid_config(word_list, height, width, fillable, entries)
}

fn check_entry_bounds(height: usize, width: usize, entries: &[GridEntry]) -> Result<(), GridError> {
    for (slot_id, entry) in entries.iter().enumerate() {
        let (row, col) = entry.loc;

        if entry.len < 2 {
            return Err(GridError::SlotTooShort { slot_id, row, col, length: entry.len });
        }

        // An entry long enough to overflow the coordinate can't fit either.
        let last_cell = match entry.dir {
            Direction::Across => col.checked_add(entry.len - 1).map(|last_col| (row, last_col)),
            Direction::Down => row.checked_add(entry.len - 1).map(|last_row| (last_row, col)),
        };
        match last_cell {
            Some((last_row, last_col)) if last_row < height && last_col < width => {}
            _ => return Err(GridError::SlotOutOfBounds { slot_id, row, col, height, width }),
        }
    }

    Ok(())
}

fn build_grid_config(
    word_list: WordList,
    height: usize,
    width: usize,
    fillable: Vec<Vec<bool>>,
    entries: &[GridEntry],
) -> Result<GridConfig, GridError> {
    // Build a map from cell location to the (entry index, cell index within entry) of the across
    // and down entries passing through it, which we can then use to calculate crossings.
    #[derive(Debug, Default)]
    struct GridCell {
        across: Option<(SlotId, usize)>,
        down: Option<(SlotId, usize)>,
    }
    let mut cell_by_loc: HashMap<GridCoord, GridCell> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        for (cell_idx, loc) in entry.cell_coords().into_iter().enumerate() {
            let grid_cell = cell_by_loc.entry(loc).or_default();
            let side = match entry.dir {
                Direction::Across => &mut grid_cell.across,
                Direction::Down => &mut grid_cell.down,
            };

            if let Some((first, _)) = *side {
                return Err(GridError::ParallelSlots {
                    first,
                    second: entry_idx,
                    row: loc.0,
                    col: loc.1,
                });
            }
            *side = Some((entry_idx, cell_idx));
        }
    }

    let slot_configs = entries
        .iter()
        .enumerate()
        .map(|(entry_idx, entry)| {
            let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = entry
                .cell_coords()
                .iter()
                .map(|loc| {
                    let grid_cell = &cell_by_loc[loc];
                    let other = match entry.dir {
                        Direction::Across => grid_cell.down,
                        Direction::Down => grid_cell.across,
                    };

                    other.map(|(other_slot_id, other_slot_cell)| Crossing {
                        other_slot_id,
                        other_slot_cell,
                    })
                })
                .collect();

            SlotConfig {
                id: entry_idx,
                start_cell: entry.loc,
                direction: entry.dir,
                length: entry.len,
                crossings,
            }
        })
        .collect();

    Ok(GridConfig { height, width, fillable, slot_configs, word_list })
}
