use serde::{Deserialize, Serialize};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a string
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// Response body for signup and login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub token: String,
}
