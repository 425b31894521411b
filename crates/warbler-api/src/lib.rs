//! HTTP layer for Warbler: route handlers, session handling, and HTML pages.

pub mod auth;
pub mod error;
pub mod flash;
pub mod home;
pub mod likes;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;
pub mod views;

pub use routes::router;
pub use state::{AppState, AppStateInner};
