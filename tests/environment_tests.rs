//! Environment overrides mutate process state, so they live in their own test binary.
use anyhow::Result;
use mtctsim::prelude::*;

#[test]
fn environment_overrides_single_keys() -> Result<()> {
    let path = std::env::temp_dir().join(format!("mtctsim_env_{}.toml", std::process::id()));
    std::fs::write(&path, "[time]\nend = 30\n")?;

    std::env::set_var("MTCT__SOLVER__STEP", "0.05");
    std::env::set_var("MTCT__LOG__LEVEL", "debug");
    let settings = settings::read(&path);
    std::env::remove_var("MTCT__SOLVER__STEP");
    std::env::remove_var("MTCT__LOG__LEVEL");
    std::fs::remove_file(&path)?;

    let settings = settings?;
    assert_eq!(settings.method()?, Method::Rk4 { step: 0.05 });
    assert_eq!(settings.log.level, "debug");
    assert_eq!(settings.grid()?.len(), 31);
    assert_eq!(settings.parameters()?, Parameters::default());
    Ok(())
}
