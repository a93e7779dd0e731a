use anyhow::Result;
use mtctsim::prelude::*;

fn main() -> Result<()> {
    let result = simulate_file("demos/mtct/config.toml")?;

    let last = result.trajectory().last();
    println!(
        "After {} days: {:.1} infected children, {:.1} virally suppressed, {:.1} deaths",
        result.trajectory().times().last().copied().unwrap_or_default(),
        last.get(Compartment::CIP),
        last.get(Compartment::VS),
        last.get(Compartment::D)
    );

    // Effect of the transmission probability on cumulative child deaths
    let base = result.settings().parameters()?;
    let sets = vary(&base, "transmission", &[0.05, 0.15, 0.3, 0.45])?;
    let initial = result.settings().initial_state()?;
    let grid = result.settings().grid()?;
    for (params, trajectory) in sets
        .iter()
        .zip(sweep(&MtctModel, &initial, &sets, &grid, Method::default()))
    {
        let trajectory = trajectory?;
        println!(
            "transmission = {:.2}: {:.1} deaths",
            params.transmission,
            trajectory.last().get(Compartment::D)
        );
    }

    Ok(())
}
