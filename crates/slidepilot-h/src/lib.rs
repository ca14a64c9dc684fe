//! Chromium backend for the slidepilot engine.

pub mod backend;
pub mod cdp;
mod inject;

pub use backend::HeadlessBackend;
