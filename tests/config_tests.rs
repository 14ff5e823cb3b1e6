//! Integration tests for configuration loading and validation.

use dram_channel_sim::common::{ConfigError, SimError};
use dram_channel_sim::config::Config;
use dram_channel_sim::dram::address::MappingScheme;

/// Path of the configuration shipped with the crate.
fn default_config_path() -> String {
    format!("{}/configs/default.toml", env!("CARGO_MANIFEST_DIR"))
}

/// Tests that an empty file yields a valid default configuration.
#[test]
fn test_empty_config_defaults() {
    let config = Config::from_toml_str("").unwrap();

    assert_eq!(config.geometry.num_channels, 4);
    assert_eq!(config.geometry.num_ranks, 2);
    assert_eq!(config.geometry.num_banks, 8);
    assert_eq!(config.geometry.transaction_size, 64);
    assert_eq!(config.timing.t_rcd, 10);
    assert_eq!(config.timing.refresh_period_ns, 7800.0);
    assert!(config.controller.give_logic_priority);
    assert_eq!(config.mapping_scheme().unwrap(), MappingScheme::RwBkRkChClBy);
    assert!(config.validate().is_ok());
}

/// Tests that the shipped configuration loads and validates.
#[test]
fn test_load_default_file() {
    let config = Config::load(default_config_path()).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.geometry.num_channels, 4);
    assert_eq!(config.timing.t_ck, 1.5);
    assert_eq!(config.timing.refresh_interval_cycles(), 5200);
}

/// Tests that partial sections keep defaults for missing fields.
#[test]
fn test_partial_config() {
    let config = Config::from_toml_str(
        r#"
        [geometry]
        num_channels = 2
        mapping_scheme = "ch_rw_bk_rk_cl_by"

        [timing]
        t_ck = 1.25
        t_cl = 11
        "#,
    )
    .unwrap();

    assert_eq!(config.geometry.num_channels, 2);
    assert_eq!(config.geometry.num_banks, 8);
    assert_eq!(config.timing.t_cl, 11);
    assert_eq!(config.timing.t_rcd, 10);
    assert_eq!(config.mapping_scheme().unwrap(), MappingScheme::ChRwBkRkClBy);
    assert!(config.validate().is_ok());
}

/// Tests that malformed TOML is a configuration-class error.
#[test]
fn test_malformed_toml() {
    let err = Config::from_toml_str("[geometry\nnum_ranks = 2").unwrap_err();

    assert!(matches!(err, SimError::Parse(_)));
    assert!(err.is_config());
    assert!(!err.is_invariant());
}

/// Tests that a wrongly typed field is rejected.
#[test]
fn test_wrong_field_type() {
    let err = Config::from_toml_str("[geometry]\nnum_ranks = \"two\"").unwrap_err();
    assert!(err.is_config());
}

/// Tests that a missing file is a configuration-class error.
#[test]
fn test_missing_file() {
    let err = Config::load("/nonexistent/dram.toml").unwrap_err();

    assert!(matches!(err, SimError::Io(_)));
    assert!(err.is_config());
}

/// Tests that an unknown mapping scheme fails validation.
#[test]
fn test_unknown_mapping_scheme() {
    let mut config = Config::default();
    config.geometry.mapping_scheme = "SCHEME_9".to_string();

    assert_eq!(
        config.validate(),
        Err(ConfigError::UnknownMappingScheme("SCHEME_9".to_string()))
    );
}

/// Tests that every geometry size used as a bit field must be a power of two.
#[test]
fn test_power_of_two_fields() {
    let cases: [(&str, fn(&mut Config)); 5] = [
        ("geometry.num_channels", |c| c.geometry.num_channels = 3),
        ("geometry.num_ranks", |c| c.geometry.num_ranks = 0),
        ("geometry.num_banks", |c| c.geometry.num_banks = 12),
        ("geometry.num_rows", |c| c.geometry.num_rows = 1000),
        ("geometry.num_cols", |c| c.geometry.num_cols = 1000),
    ];

    for (name, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        match config.validate() {
            Err(ConfigError::NotPowerOfTwo { field, .. }) => assert_eq!(field, name),
            other => panic!("{}: unexpected {:?}", name, other),
        }
    }
}

/// Tests the cache-line and column constraints.
#[test]
fn test_cache_line_constraints() {
    let mut config = Config::default();
    config.geometry.cache_line_size = 4;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "geometry.cache_line_size",
            ..
        })
    ));

    let mut config = Config::default();
    config.geometry.num_cols = 4;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "geometry.num_cols",
            ..
        })
    ));
}

/// Tests the transaction-size constraint.
#[test]
fn test_transaction_size_constraint() {
    for size in [0, 24, 100] {
        let mut config = Config::default();
        config.geometry.transaction_size = size;
        assert!(
            matches!(
                config.validate(),
                Err(ConfigError::InvalidValue {
                    field: "geometry.transaction_size",
                    ..
                })
            ),
            "size {}",
            size
        );
    }
}

/// Tests that a rank must hold at least one device.
#[test]
fn test_devices_per_rank() {
    let mut config = Config::default();
    assert_eq!(config.geometry.devices_per_rank(), 8);

    config.geometry.device_width = 128;
    assert_eq!(config.geometry.devices_per_rank(), 0);
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "geometry.device_width",
            ..
        })
    ));
}

/// Tests the clock and refresh constraints.
#[test]
fn test_timing_constraints() {
    for t_ck in [0.0, -1.0, f64::NAN] {
        let mut config = Config::default();
        config.timing.t_ck = t_ck;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "timing.t_ck", .. })
        ));
    }

    let mut config = Config::default();
    config.timing.refresh_period_ns = 1.0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "timing.refresh_period_ns",
            ..
        })
    ));
}

/// Tests that a zero return-queue capacity is rejected.
#[test]
fn test_return_queue_capacity() {
    let mut config = Config::default();
    config.controller.return_queue_capacity = 0;

    assert!(config.validate().is_err());
}

/// Tests that configuration errors convert into the configuration class.
#[test]
fn test_error_classes() {
    let err: SimError = ConfigError::UnknownMappingScheme("X".to_string()).into();

    assert!(err.is_config());
    assert!(!err.is_invariant());
    assert!(err.to_string().contains("unknown address mapping scheme"));
}

/// Tests that the configuration serializes back to TOML-compatible JSON.
#[test]
fn test_config_serializes() {
    let json = serde_json::to_value(Config::default()).unwrap();

    assert_eq!(json["geometry"]["mapping_scheme"], "RW_BK_RK_CH_CL_BY");
    assert_eq!(json["controller"]["return_queue_capacity"], 1024);
}
