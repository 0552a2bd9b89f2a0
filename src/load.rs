use std::fs;
use std::path::Path;

use ab_glyph::FontVec;
use log::info;

use crate::error::LoadError;
use crate::grid_config::GridConfig;
use crate::word_list::WordList;

/// Character marking a fillable cell in a structure file. Anything else is a block.
pub const FILLABLE_CHAR: char = '_';

/// Parse a structure template into rows of fillable flags. Short rows are padded with blocks up to
/// the widest row, and trailing blank lines are dropped.
pub fn parse_structure(template: &str) -> Vec<Vec<bool>> {
    let mut lines: Vec<&str> = template.lines().map(|line| line.trim_end_matches('\r')).collect();
    while lines.last().map(|line| line.is_empty()).unwrap_or(false) {
        lines.pop();
    }

    let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            let mut row: Vec<bool> = line.chars().map(|c| c == FILLABLE_CHAR).collect();
            row.resize(width, false);
            row
        })
        .collect()
}

/// Parse a word list with one word per line. Words are trimmed and upper-cased; blank lines are
/// skipped.
pub fn parse_word_list(text: &str) -> WordList {
    WordList::new(
        text.lines().map(|line| line.trim()).filter(|line| !line.is_empty()).map(str::to_uppercase),
    )
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

/// Read a TrueType or OpenType font used to draw letters into grid images.
pub fn load_font(path: &Path) -> Result<FontVec, LoadError> {
    let data =
        fs::read(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;

    FontVec::try_from_vec(data)
        .map_err(|source| LoadError::Font { path: path.to_path_buf(), source })
}

/// Read a structure file and a word file and build the grid config they describe.
pub fn load_grid_config(structure_path: &Path, words_path: &Path) -> Result<GridConfig, LoadError> {
    let fillable = parse_structure(&read_file(structure_path)?);
    let word_list = parse_word_list(&read_file(words_path)?);

    let config = GridConfig::from_fillable(word_list, fillable)?;
    info!(
        "loaded a {}x{} grid with {} slots and {} words",
        config.height,
        config.width,
        config.slot_count(),
        config.word_list.len(),
    );

    Ok(config)
}
