pub mod backend;
pub mod cascade;
pub mod condition;
pub mod config;
pub mod confirm;
pub mod extraction;
pub mod formatter;
pub mod interact;
pub mod poller;
pub mod profile;
pub mod snapshot;
pub mod workflow;

pub use slidepilot_common::protocol;
