use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Who a caller is. Never carries a password.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Signed token payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginData {
    pub user: Identity,
    pub token: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: LoginData,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}
