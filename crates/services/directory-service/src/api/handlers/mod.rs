//! HTTP handlers.

pub mod group_handler;
pub mod health_handler;
pub mod session_handler;
pub mod user_handler;

pub use group_handler::group_routes;
pub use health_handler::health_routes;
pub use session_handler::session_routes;
pub use user_handler::user_routes;
