//! Test fixtures and constants

use std::path::Path;

pub const MOCK_ADAPTER_MAC: &str = "aa:bb:cc:dd:ee:ff";
pub const MOCK_ADAPTER_NAME: &str = "Pentair DD-EE-FF";
pub const MOCK_ADAPTER_IP: &str = "127.0.0.1";
pub const MOCK_ADAPTER_PORT: u16 = 80;

pub const DATA_FULL: &str = "data_full.json";
pub const DATA_MIN_ENTITY_CLEANUP: &str = "data_min_entity_cleanup.json";

/// Load a fixture file from `tests/fixtures/` as JSON
pub fn load_json_fixture(name: &str) -> serde_json::Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);

    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture '{}' from {:?}: {}", name, path, e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture '{}' as JSON: {}", name, e))
}

/// Install a fmt subscriber once; `RUST_LOG` controls the filter
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
