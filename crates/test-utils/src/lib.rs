pub mod builders;
pub mod fake_validator;

use std::sync::{Arc, Once};

use learnpath::config::EngineSettings;
use learnpath::engine::Engine;
use learnpath::store::Store;
use learnpath::types::CascadePolicy;
use learnpath::validators::{Validator, ValidatorRegistry};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Engine over a private in-memory database with default settings and the
/// built-in validators.
pub fn in_memory_engine() -> Engine {
    engine_with(EngineSettings::default(), ValidatorRegistry::new())
}

/// Engine over a private in-memory database.
pub fn engine_with(settings: EngineSettings, validators: ValidatorRegistry) -> Engine {
    let store = Store::open_in_memory().expect("open in-memory store");
    Engine::new(store, settings, validators)
}

/// Engine whose every validator is `validator`, whatever the task type.
pub fn engine_with_validator(validator: Arc<dyn Validator>) -> Engine {
    let mut registry = ValidatorRegistry::new();
    registry.set_fallback(validator);
    engine_with(EngineSettings::default(), registry)
}

/// Default settings with a different cascade policy.
pub fn settings_with_cascade(cascade: CascadePolicy) -> EngineSettings {
    EngineSettings {
        cascade,
        ..EngineSettings::default()
    }
}
