//! The config files shipped in `configs/` load, validate, and run.

use std::path::PathBuf;

use tl_app::{AppError, SimConfig, SimRequest, load_config, simulate};

fn configs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("configs")
}

#[test]
fn tank_yaml_matches_defaults() {
    let config = load_config(&configs_dir().join("tank.yaml")).unwrap();
    assert_eq!(config, SimConfig::default());
}

#[test]
fn reproducible_json_runs_identically() {
    let config = load_config(&configs_dir().join("reproducible.json")).unwrap();
    assert_eq!(config.noise.seed, Some(2024));
    assert_eq!(config.initial.level, 30.0);

    let request = SimRequest {
        params: config.default_params().unwrap(),
        ticks: 40,
        record_every: 10,
        seed: None,
    };
    let a = simulate(&config, &request).unwrap();
    let b = simulate(&config, &request).unwrap();
    assert_eq!(a.x, b.x);
    assert_eq!(a.len(), 5);
}

#[test]
fn missing_file_reports_path() {
    let path = configs_dir().join("does-not-exist.yaml");
    match load_config(&path) {
        Err(AppError::ConfigFileRead { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ConfigFileRead, got {other:?}"),
    }
}
