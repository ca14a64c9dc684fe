pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader, apply_overrides};
pub use schema::{Credentials, SlidePilotConfig, Targets, Timeouts, WorkflowSettings};
