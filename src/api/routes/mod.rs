//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tools`] — Tool dispatch
//! - [`sessions`] — Session history
//! - [`oauth`] — OAuth callback
//! - [`system`] — Health, config, events, OpenAPI

mod oauth;
mod sessions;
mod system;
mod tools;

// Re-export all handlers so `routes::function_name` continues to work
pub use oauth::*;
pub use sessions::*;
pub use system::*;
pub use tools::*;
