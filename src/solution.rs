use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{ImageResult, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::backtracking_search::Choice;
use crate::grid_config::GridConfig;

/// Character used for cells that aren't part of any slot when rendering.
pub const BLOCK_CHAR: char = '█';

/// Side length in pixels of one cell in a rendered image.
pub const CELL_SIZE: u32 = 100;

/// Black border left around the white interior of every fillable cell.
pub const CELL_BORDER: u32 = 2;

const LETTER_SCALE: f32 = 80.0;

pub const BLOCK_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const CELL_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LETTER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Turn fill choices into a `height` x `width` grid of letters. Cells that no chosen slot covers
/// stay `None`.
pub fn letter_grid(config: &GridConfig, choices: &[Choice]) -> Vec<Vec<Option<char>>> {
    let mut grid = vec![vec![None; config.width]; config.height];

    for &Choice { slot_id, word_id } in choices {
        let slot_config = &config.slot_configs[slot_id];
        let word = config.word(word_id);

        for ((row, col), &letter) in slot_config.cell_coords().zip(&word.chars) {
            grid[row][col] = Some(letter);
        }
    }

    grid
}

/// Turn the given grid config and fill choices into a rendered string, one line per row. Blocks
/// are drawn as `BLOCK_CHAR` and empty fillable cells as spaces.
pub fn render_grid(config: &GridConfig, choices: &[Choice]) -> String {
    let letters = letter_grid(config, choices);

    letters
        .iter()
        .zip(&config.fillable)
        .map(|(letter_row, fillable_row)| {
            letter_row
                .iter()
                .zip(fillable_row)
                .map(|(letter, &fillable)| match (letter, fillable) {
                    (Some(letter), _) => *letter,
                    (None, true) => ' ',
                    (None, false) => BLOCK_CHAR,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draw the grid as an image, `CELL_SIZE` pixels per cell: fillable cells are white on a black
/// background and each letter is centered in its cell. Letters are only drawn if a font is given.
pub fn render_image(config: &GridConfig, choices: &[Choice], font: Option<&FontVec>) -> RgbaImage {
    let letters = letter_grid(config, choices);
    let interior_size = CELL_SIZE - 2 * CELL_BORDER;
    let scale = PxScale::from(LETTER_SCALE);

    let mut image = RgbaImage::from_pixel(
        config.width as u32 * CELL_SIZE,
        config.height as u32 * CELL_SIZE,
        BLOCK_COLOR,
    );

    for (row, (letter_row, fillable_row)) in letters.iter().zip(&config.fillable).enumerate() {
        for (col, (letter, &fillable)) in letter_row.iter().zip(fillable_row).enumerate() {
            if !fillable {
                continue;
            }

            let x = (col as u32 * CELL_SIZE + CELL_BORDER) as i32;
            let y = (row as u32 * CELL_SIZE + CELL_BORDER) as i32;
            draw_filled_rect_mut(
                &mut image,
                Rect::at(x, y).of_size(interior_size, interior_size),
                CELL_COLOR,
            );

            if let (Some(letter), Some(font)) = (letter, font) {
                let text = letter.to_string();
                let (text_width, text_height) = text_size(scale, font, &text);
                let text_x = x + (interior_size as i32 - text_width as i32) / 2;
                // Glyphs sit low in their line box, so lift them a little.
                let text_y = y + (interior_size as i32 - text_height as i32) / 2 - 10;

                draw_text_mut(&mut image, LETTER_COLOR, text_x, text_y, scale, font, &text);
            }
        }
    }

    image
}

/// Render the grid with `render_image` and write it to `path`. The image format follows the
/// file extension.
pub fn save_image(
    config: &GridConfig,
    choices: &[Choice],
    font: Option<&FontVec>,
    path: &Path,
) -> ImageResult<()> {
    render_image(config, choices, font).save(path)
}
