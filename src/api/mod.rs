//! HTTP surface of the scheduling core.
//!
//! Routes are nested under `/appointment/` and share one middleware
//! stack: CORS → Cache-Control → access log → handler. Handlers open
//! a connection per request and run the engine on a blocking thread.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
