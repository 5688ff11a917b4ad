/*
 * Responsibility
 * - /me, /greeting の response DTO
 */
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::services::auth::UserAccess;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub uuid: Option<Uuid>,
    pub email: Option<String>,
    pub email_hash: Option<String>,
    pub capabilities: Vec<String>,
    pub issuer: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&UserAccess> for MeResponse {
    fn from(user: &UserAccess) -> Self {
        Self {
            uuid: user.uuid(),
            email: user.email().map(str::to_string),
            email_hash: user.email_hash(),
            capabilities: user.capabilities().to_vec(),
            issuer: user.issuer().map(str::to_string),
            issued_at: user.issued_at(),
            expires_at: user.expires_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub greeting: String,
    pub authenticated: bool,
}
