// handlers/public/auth/mod.rs - Account creation and token acquisition

use serde::Serialize;

use crate::services::{PublicUser, Session};

pub mod login; // POST /auth/login - authenticate and get JWT
pub mod register; // POST /auth/register - create account and get JWT

pub use login::login_post;
pub use register::register_post;

/// Body returned by both auth endpoints. `expiresIn` is only sent on login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
    #[serde(rename = "expiresIn", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
}

impl AuthResponse {
    fn registered(session: Session) -> Self {
        Self {
            message: "Registration successful",
            token: session.token,
            user: session.user,
            expires_in: None,
        }
    }

    fn logged_in(session: Session) -> Self {
        Self {
            message: "Login successful",
            token: session.token,
            user: session.user,
            expires_in: Some(session.expires_in),
        }
    }
}
