pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use core::*;
pub use errors::GatewayError;
pub use session::{Session, SessionMode, SessionRegistry, SessionState};
pub use state::AppState;
