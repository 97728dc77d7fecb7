//! API Module
//!
//! The user-facing REST endpoints: login, register, list-users.

pub mod handlers;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use server::ApiServer;
pub use types::{CredentialsRequest, MsgResponse, UserListResponse};
