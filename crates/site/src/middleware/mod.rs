//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request spans with a `request_id` field)
//! 3. Request ID (fills the span field, echoes `x-request-id`)
//! 4. Session layer (tower-sessions with an in-memory store)
//!
//! Authentication is not a layer: handlers ask for it through the
//! extractors in [`auth`].

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, CurrentAuth, RequireAdmin, RequireAuth};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
