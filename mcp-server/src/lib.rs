//! Marcus server library: configuration, application wiring, and
//! telemetry setup shared by the `marcus` binary and its integration
//! tests.

pub mod config;
pub mod setup;
pub mod telemetry;

pub use config::Config;
pub use setup::{build_ai_adapter, build_coordinator, build_provider, build_store, initialize_app, spawn_health_monitor};
pub use telemetry::init_telemetry;
