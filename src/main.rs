use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info, warn};

use crossfill::{
    find_fill_with_options, load_font, load_grid_config, render_grid, save_image, Choice,
    FillFailure, FillOptions, GridConfig, ValueOrdering,
};

#[derive(Parser, Debug)]
#[command(name = "crossfill", version, about = "Fill a crossword structure with words from a list")]
struct Cli {
    /// Structure file: one line per row, `_` for a fillable cell, anything else for a block.
    structure: PathBuf,

    /// Word list file, one word per line.
    words: PathBuf,

    /// Also write the filled grid to this file. A `.png` path gets an image, anything else the
    /// text rendering.
    output: Option<PathBuf>,

    /// Font used to draw letters into a `.png` output.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Order in which candidate words are tried.
    #[arg(long, value_enum, default_value_t = Ordering::Lcv)]
    ordering: Ordering,

    /// Maintain arc consistency after every tentative choice.
    #[arg(long)]
    inference: bool,

    /// Give up after visiting this many search states.
    #[arg(long)]
    max_states: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Ordering {
    /// Least-constraining word first.
    Lcv,
    /// Dictionary order.
    Natural,
}

impl From<Ordering> for ValueOrdering {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Lcv => ValueOrdering::LeastConstraining,
            Ordering::Natural => ValueOrdering::Natural,
        }
    }
}

fn write_output(
    cli: &Cli,
    grid_config: &GridConfig,
    choices: &[Choice],
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    let is_png = output.extension().map(|ext| ext.eq_ignore_ascii_case("png")).unwrap_or(false);

    if !is_png {
        fs::write(output, render_grid(grid_config, choices) + "\n")?;
        return Ok(());
    }

    let font = match &cli.font {
        Some(font_path) => Some(load_font(font_path)?),
        None => {
            warn!("no --font given, so the image will have empty cells");
            None
        }
    };
    save_image(grid_config, choices, font.as_ref(), output)?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let grid_config = match load_grid_config(&cli.structure, &cli.words) {
        Ok(grid_config) => grid_config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let options = FillOptions {
        value_ordering: cli.ordering.into(),
        inference: cli.inference,
        max_states: cli.max_states,
    };

    match find_fill_with_options(&grid_config, &options) {
        Ok(result) => {
            let display_grid = render_grid(&grid_config, &result.choices);
            println!("{}", display_grid);
            info!("{:?}", result.statistics);

            if let Some(output) = &cli.output {
                if let Err(err) = write_output(&cli, &grid_config, &result.choices, output) {
                    error!("failed to write {}: {}", output.display(), err);
                    return ExitCode::FAILURE;
                }
                info!("wrote the filled grid to {}", output.display());
            }

            ExitCode::SUCCESS
        }
        Err(failure @ FillFailure::StateLimitExceeded { .. }) => {
            error!("{}", failure);
            ExitCode::FAILURE
        }
        Err(failure) => {
            info!("{}", failure);
            println!("No solution.");
            ExitCode::SUCCESS
        }
    }
}
