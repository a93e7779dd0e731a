use anyhow::Result;
use approx::assert_relative_eq;
use mtctsim::prelude::*;

fn closed_population() -> Parameters {
    Parameters {
        fertility: 0.0,
        mortality: 0.0,
        hiv_mortality: 0.0,
        ..Default::default()
    }
}

/// WS + WNI + WI + NP + P + NPWI + PWI + CIP + VS + D
fn conserved(state: &Compartments) -> f64 {
    state.sum() - state.get(Compartment::CNIP)
}

#[test]
fn single_point_grid_returns_initial_state() -> Result<()> {
    let initial = Compartments::default();
    let trajectory = simulate(&initial, &Parameters::default(), &[0.0], Method::default())?;

    assert_eq!(trajectory.len(), 1);
    assert_eq!(trajectory.times(), &[0.0]);
    assert_eq!(trajectory.last(), &initial);
    Ok(())
}

#[test]
fn output_rows_land_on_requested_times() -> Result<()> {
    let grid = [0.0, 0.25, 7.0, 30.5, 100.0];
    let trajectory = simulate(
        &Compartments::default(),
        &Parameters::default(),
        &grid,
        Method::default(),
    )?;

    assert_eq!(trajectory.times(), &grid);
    assert_eq!(trajectory.states()[0], Compartments::default());
    Ok(())
}

#[test]
fn closed_population_is_conserved() -> Result<()> {
    let grid = TimeGrid::range(0.0, 365.0, 1.0)?;
    let initial = Compartments::default();
    let expected = conserved(&initial);

    for method in [
        Method::default(),
        Method::dopri5(),
        Method::dop853(),
        Method::Exact,
    ] {
        let trajectory = simulate(&initial, &closed_population(), &grid, method)?;
        for state in trajectory.states() {
            assert_relative_eq!(conserved(state), expected, max_relative = 1e-9);
        }
    }
    Ok(())
}

#[test]
fn homogeneous_system_is_linear_in_the_initial_state() -> Result<()> {
    let params = Parameters {
        fertility: 0.0,
        ..Default::default()
    };
    let grid = TimeGrid::range(0.0, 60.0, 2.0)?;
    let initial = Compartments::default();
    let k = 3.5;

    let base = simulate(&initial, &params, &grid, Method::default())?;
    let scaled = simulate(&(initial * k), &params, &grid, Method::default())?;

    for (a, b) in base.states().iter().zip(scaled.states()) {
        for compartment in Compartment::ALL {
            assert_relative_eq!(
                b.get(compartment),
                k * a.get(compartment),
                max_relative = 1e-9,
                epsilon = 1e-9
            );
        }
    }
    Ok(())
}

#[test]
fn absorbing_compartments_never_decrease() -> Result<()> {
    let trajectory = simulate(
        &Compartments::default(),
        &Parameters::default(),
        &TimeGrid::default(),
        Method::default(),
    )?;

    for compartment in [Compartment::VS, Compartment::D] {
        let column = trajectory.column(compartment);
        assert!(column.windows(2).all(|w| w[1] >= w[0]));
    }
    assert!(negative_compartments(&trajectory).is_empty());
    Ok(())
}

#[test]
fn repeated_runs_are_identical() -> Result<()> {
    let grid = TimeGrid::default();
    let a = simulate(
        &Compartments::default(),
        &Parameters::default(),
        &grid,
        Method::dop853(),
    )?;
    let b = simulate(
        &Compartments::default(),
        &Parameters::default(),
        &grid,
        Method::dop853(),
    )?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn methods_agree() -> Result<()> {
    let grid = TimeGrid::range(0.0, 90.0, 5.0)?;
    let initial = Compartments::default();
    let params = Parameters::default();

    let exact = simulate(&initial, &params, &grid, Method::Exact)?;
    for method in [Method::default(), Method::dopri5(), Method::dop853()] {
        let approx = simulate(&initial, &params, &grid, method)?;
        for (a, b) in approx.states().iter().zip(exact.states()) {
            for compartment in Compartment::ALL {
                assert_relative_eq!(
                    a.get(compartment),
                    b.get(compartment),
                    max_relative = 1e-6,
                    epsilon = 1e-6
                );
            }
        }
    }
    Ok(())
}

#[test]
fn invalid_input_is_rejected_before_integration() {
    let initial = Compartments::default();
    let params = Parameters::default();

    let err = simulate(&initial, &params, &[5.0, 3.0, 10.0], Method::default()).unwrap_err();
    assert!(err.is_invalid_input());

    let err = simulate(&initial, &params, &[], Method::default()).unwrap_err();
    assert!(err.is_invalid_input());

    let mut negative = initial;
    negative.set(Compartment::WI, -1.0);
    let err = simulate(&negative, &params, &[0.0, 1.0], Method::default()).unwrap_err();
    assert!(err.is_invalid_input());

    let bad = Parameters {
        transmission: 1.5,
        ..Default::default()
    };
    let err = simulate(&initial, &bad, &[0.0, 1.0], Method::default()).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn non_finite_rates_abort_the_run() {
    let blow_up = |_t: f64, state: &Compartments, _p: &Parameters| *state * f64::INFINITY;
    let err = integrate(
        &blow_up,
        &Compartments::default(),
        &Parameters::default(),
        &[0.0, 1.0, 2.0],
        Method::default(),
    )
    .unwrap_err();
    assert!(err.is_numerical_instability());
}

#[test]
fn missing_parameter_key_is_reported() {
    let mut map = Parameters::default().to_map();
    map.remove("suppression");

    let err = Parameters::from_map(&map).unwrap_err();
    assert!(err.is_invalid_input());
    assert!(err.to_string().contains("suppression"));
}

#[test]
fn custom_rate_function() -> Result<()> {
    // Only WS decays, everything else is frozen
    let decay = |_t: f64, state: &Compartments, params: &Parameters| {
        let mut rates = Compartments::zeros();
        rates.set(Compartment::WS, -params.delta * state.get(Compartment::WS));
        rates
    };
    let trajectory = integrate(
        &decay,
        &Compartments::default(),
        &Parameters::default(),
        &[0.0, 100.0],
        Method::dop853(),
    )?;

    assert_relative_eq!(
        trajectory.last().get(Compartment::WS),
        10000.0 * (-1.0f64).exp(),
        max_relative = 1e-7
    );
    assert_eq!(trajectory.last().get(Compartment::D), 21.0);
    Ok(())
}

#[test]
fn sweep_over_transmission() -> Result<()> {
    let sets = vary(&Parameters::default(), "transmission", &[0.1, 0.3, 0.5])?;
    let grid = TimeGrid::range(0.0, 180.0, 10.0)?;
    let results = sweep(
        &MtctModel,
        &Compartments::default(),
        &sets,
        &grid,
        Method::default(),
    );

    let deaths = results
        .into_iter()
        .map(|r| r.map(|t| t.last().get(Compartment::D)))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(deaths.len(), 3);
    assert!(deaths[0] < deaths[1] && deaths[1] < deaths[2]);
    Ok(())
}

#[test]
fn summary_of_reference_run() -> Result<()> {
    let trajectory = simulate(
        &Compartments::default(),
        &Parameters::default(),
        &TimeGrid::default(),
        Method::default(),
    )?;
    let summary = summarize(&trajectory, &[Compartment::WS, Compartment::D])?;

    let ws = summary.get(Compartment::WS).unwrap();
    assert_eq!(ws.max, 10000.0);
    assert!(ws.min <= ws.q1 && ws.q1 <= ws.median && ws.median <= ws.q3 && ws.q3 <= ws.max);

    let d = summary.get(Compartment::D).unwrap();
    assert_eq!(d.min, 21.0);
    assert_eq!(d.max, trajectory.last().get(Compartment::D));
    assert!(summary.get(Compartment::VS).is_none());
    Ok(())
}
