//! API Types

use serde::{Deserialize, Serialize};

/// Credentials accepted by the login and register endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Simple message response
#[derive(Debug, Deserialize, Serialize)]
pub struct MsgResponse {
    pub message: String,
}

impl MsgResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Listing response for the users endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct UserListResponse {
    pub data: Vec<String>,
}
