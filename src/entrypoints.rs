use crate::prelude::*;
use crate::routines::output::SimulationResult;
use crate::routines::settings::{self, Settings};

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

/// Primary entrypoint for mtctsim
///
/// Reads the settings from a TOML configuration file (see [settings::read]) and runs [simulate].
pub fn simulate_file(settings_path: impl AsRef<Path>) -> Result<SimulationResult> {
    let settings = settings::read(settings_path)?;
    simulate(settings)
}

/// Runs one simulation described by `settings`
///
/// Builds the parameters, initial state and time grid, integrates the model, summarizes the
/// requested compartments and, depending on the settings, writes the output files and shows the
/// terminal chart. Any failure aborts the run before outputs are written.
pub fn simulate(settings: Settings) -> Result<SimulationResult> {
    let now = Instant::now();
    logger::setup_log(&settings)?;
    tracing::info!("Starting mtctsim");

    let parameters = settings.parameters().context("Invalid parameter set")?;
    let initial = settings.initial_state().context("Invalid initial state")?;
    let grid = settings.grid().context("Invalid time grid")?;
    let method = settings.method().context("Invalid solver settings")?;
    let columns = settings.summary_columns()?;
    let series = settings.series()?;

    tracing::info!(
        "Simulating {} output times from t = {} to t = {}",
        grid.len(),
        grid[0],
        grid[grid.len() - 1]
    );

    let trajectory = integrate(&MtctModel, &initial, &parameters, &grid, method)
        .context("Integration failed")?;

    for compartment in negative_compartments(&trajectory) {
        tracing::warn!("Compartment {} took negative values", compartment);
    }

    let summary = summarize(&trajectory, &columns)?;
    tracing::info!("Summary of the trajectory:\n{}", summary);

    let result = SimulationResult::new(trajectory, summary, settings);

    match result.settings().output.write {
        true => {
            result.write_outputs()?;
            tracing::info!(
                "Output files were written to {}",
                result.settings().output.path
            );
        }
        false => {
            tracing::info!("Output files will not be written - set `write = true` in the [output] section to enable output files")
        }
    }

    tracing::info!("Total time: {:.2?}", now.elapsed());

    if result.settings().plot.enabled {
        tui::plot(result.trajectory(), &series)?;
    }

    Ok(result)
}
