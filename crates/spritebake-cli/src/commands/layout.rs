//! Layout command implementation
//!
//! Prints the grid an export would produce without rendering anything.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use spritebake_core::{compute_layout, CellSize, GridLayout};

/// Compute the layout for a clip duration.
pub fn plan(cell: CellSize, fps: u32, duration: f64) -> Result<GridLayout> {
    Ok(compute_layout(cell, fps, duration)?)
}

/// Run the layout command.
pub fn run(cell: CellSize, fps: u32, duration: f64, json: bool) -> Result<ExitCode> {
    let layout = plan(cell, fps, duration)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
    } else {
        println!(
            "{} {} frames at {} fps",
            "Layout".cyan().bold(),
            layout.frame_count,
            layout.fps
        );
        println!("  grid:  {}x{}", layout.grid_dim, layout.grid_dim);
        println!("  cell:  {}x{}", layout.cell_size.width, layout.cell_size.height);
        println!("  atlas: {}x{}", layout.atlas_width, layout.atlas_height);
    }

    Ok(ExitCode::SUCCESS)
}
