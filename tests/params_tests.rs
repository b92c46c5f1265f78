#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::fs;

use simevo::simulation::environment::Environment;
use simevo::simulation::error::ConfigError;
use simevo::simulation::params::{IndexKind, Params};

fn create_test_params() -> Params {
    Params {
        width: 320.0,
        height: 240.0,
        index: IndexKind::Linear,
        node_capacity: 6,
        max_depth: 7,
        min_node_size: 2.0,
        initial_energy: 250.0,
        food_energy: 40.0,
        reproduction_threshold: 600.0,
        predation: false,
        predation_size_ratio: 2.0,
        movement_persistence: 0.5,
        parallel: false,
        seed: Some(1234),
    }
}

#[test]
fn test_save_and_load_params() {
    let params = create_test_params();
    let path = std::env::temp_dir().join("simevo_test_params.json");

    params.save_to_file(&path).expect("failed to save params");
    let loaded = Params::load_from_file(&path).expect("failed to load params");

    assert_eq!(loaded.width, 320.0);
    assert_eq!(loaded.height, 240.0);
    assert_eq!(loaded.index, IndexKind::Linear);
    assert_eq!(loaded.node_capacity, 6);
    assert_eq!(loaded.max_depth, 7);
    assert_eq!(loaded.food_energy, 40.0);
    assert!(!loaded.predation);
    assert_eq!(loaded.seed, Some(1234));

    let _ = fs::remove_file(&path);
}

#[test]
fn test_missing_fields_fall_back_to_defaults() {
    let path = std::env::temp_dir().join("simevo_test_partial_params.json");
    fs::write(&path, r#"{ "width": 500.0, "index": "Linear" }"#).unwrap();

    let loaded = Params::load_from_file(&path).unwrap();
    let defaults = Params::default();

    assert_eq!(loaded.width, 500.0);
    assert_eq!(loaded.height, defaults.height);
    assert_eq!(loaded.index, IndexKind::Linear);
    assert_eq!(loaded.node_capacity, defaults.node_capacity);
    assert_eq!(loaded.seed, None);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_invalid_params_are_rejected() {
    let path = std::env::temp_dir().join("simevo_test_invalid_params.json");
    fs::write(&path, r#"{ "width": -1.0 }"#).unwrap();
    assert!(matches!(
        Params::load_from_file(&path),
        Err(ConfigError::Invalid(_))
    ));

    fs::write(&path, "not json").unwrap();
    assert!(matches!(
        Params::load_from_file(&path),
        Err(ConfigError::Json(_))
    ));
    let _ = fs::remove_file(&path);

    assert!(matches!(
        Params::load_from_file(std::env::temp_dir().join("simevo_missing_params.json")),
        Err(ConfigError::Io(_))
    ));

    let params = Params {
        node_capacity: 0,
        ..create_test_params()
    };
    assert!(params.validate().is_err());
    let params = Params {
        movement_persistence: 1.5,
        ..create_test_params()
    };
    assert!(params.validate().is_err());
    assert!(Params::default().validate().is_ok());
}

#[test]
fn test_loaded_params_drive_environment() {
    let path = std::env::temp_dir().join("simevo_test_env_params.json");
    create_test_params().save_to_file(&path).unwrap();

    let params = Params::load_from_file(&path).unwrap();
    let env = Environment::new(params).unwrap();

    assert_eq!(env.width(), 320.0);
    assert_eq!(env.height(), 240.0);
    assert_eq!(env.params().reproduction_threshold, 600.0);

    let _ = fs::remove_file(&path);
}
