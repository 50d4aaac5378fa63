pub mod config;
pub mod docs;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;

pub use router::build_router;
pub use state::AppState;
