//! PhishGuard server
//!
//! HTTP prediction service and operator CLI around the URL phishing
//! detector. The binary in `main.rs` wires these modules together; they are
//! exposed as a library so the router can be exercised in-process.

pub mod calibrate;
pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::{CalibrateArgs, Cli, Commands, ServeArgs};
pub use config::{CorsConfig, ServerConfig};
pub use routes::create_router;
pub use state::AppState;
