use serde::{Deserialize, Serialize};

use crate::users::repo_types::User;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user: User,
}

impl AuthResponse {
    pub fn bearer(access_token: String, refresh_token: String, user: User) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
            user,
        }
    }
}
