use serde::{Deserialize, Serialize};

/// Inbound relay payload. Every field is optional at the serde level so the
/// handler can report exactly which required fields are missing instead of
/// surfacing a deserialization error.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub number: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// Payload that survived validation for the route's policy.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub to_email: String,
    pub subject: String,
    pub body: String,
    pub number: Option<String>,
    pub user_id: Option<String>,
    pub username: Option<String>,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub status: &'static str,
    pub message: String,
    pub data: SendData,
}

#[derive(Serialize)]
pub struct SendData {
    pub message_id: String,
    pub to_email: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}
