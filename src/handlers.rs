use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use log::{error, info, warn};

use crate::config::Config;
use crate::error::RelayError;
use crate::mailer::{MailTransport, OutboundEmail};
use crate::notify::{failure_report, success_report, Notifier};
use crate::types::{HealthResponse, SendData, SendRequest, SendResponse, ValidatedRequest};

pub struct AppState {
    pub config: Config,
    pub mailer: Arc<dyn MailTransport>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

/// Where the caller presents the shared secret.
#[derive(Debug, Clone, Copy)]
pub enum CredentialScheme {
    /// Raw key in the `x-api-key` header.
    ApiKeyHeader,
    /// `Authorization: Bearer <key>`.
    Bearer,
}

/// Per-route knobs for the shared relay core. The two routes differ only in
/// credential scheme, required fields, and whether delivery reports go out.
#[derive(Debug, Clone, Copy)]
pub struct RelayPolicy {
    pub credential: CredentialScheme,
    pub requires_number: bool,
    pub notify: bool,
}

impl RelayPolicy {
    const SEND_EMAIL: Self = Self {
        credential: CredentialScheme::ApiKeyHeader,
        requires_number: true,
        notify: true,
    };

    const SEND: Self = Self {
        credential: CredentialScheme::Bearer,
        requires_number: false,
        notify: false,
    };
}

pub async fn send_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, RelayError> {
    relay(&state, RelayPolicy::SEND_EMAIL, &headers, payload).await
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, RelayError> {
    relay(&state, RelayPolicy::SEND, &headers, payload).await
}

pub async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// The relay core: authenticate, validate, dispatch, report, respond.
/// Strictly sequential; the notification is attempted only after the mail
/// send resolves, and its failure never reaches the caller.
async fn relay(
    state: &AppState,
    policy: RelayPolicy,
    headers: &HeaderMap,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, RelayError> {
    check_credential(&state.config.api_key, policy.credential, headers)?;

    let Json(req) =
        payload.map_err(|err| RelayError::BadRequest(format!("invalid JSON body: {err}")))?;
    let req = validate(req, policy.requires_number)?;

    let mail = OutboundEmail::new(&req.to_email, &req.subject, &req.body);

    match state.mailer.send(&mail).await {
        Ok(message_id) => {
            info!("email sent to {} (message_id {})", req.to_email, message_id);
            notify_outcome(state, policy, success_report(&req, &message_id)).await;

            Ok(Json(SendResponse {
                status: "success",
                message: "Email sent successfully".to_string(),
                data: SendData {
                    message_id,
                    to_email: req.to_email,
                    subject: req.subject,
                    number: req.number,
                },
            }))
        }
        Err(err) => {
            let reason = format!("{err:#}");
            error!("email send failed for {}: {}", req.to_email, reason);
            notify_outcome(state, policy, failure_report(&req, &reason)).await;

            Err(RelayError::SendFailed(reason))
        }
    }
}

fn check_credential(
    expected: &str,
    scheme: CredentialScheme,
    headers: &HeaderMap,
) -> Result<(), RelayError> {
    let presented = match scheme {
        CredentialScheme::ApiKeyHeader => headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(""),
        CredentialScheme::Bearer => headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or(""),
    };

    if presented.is_empty() || presented != expected {
        return Err(RelayError::Unauthorized);
    }
    Ok(())
}

fn validate(req: SendRequest, requires_number: bool) -> Result<ValidatedRequest, RelayError> {
    fn non_empty(value: Option<String>) -> Option<String> {
        value.filter(|v| !v.is_empty())
    }

    let to_email = non_empty(req.to_email);
    let subject = non_empty(req.subject);
    let body = non_empty(req.body);
    let number = non_empty(req.number);

    let mut missing = Vec::new();
    if to_email.is_none() {
        missing.push("to_email");
    }
    if subject.is_none() {
        missing.push("subject");
    }
    if body.is_none() {
        missing.push("body");
    }
    if requires_number && number.is_none() {
        missing.push("number");
    }

    match (to_email, subject, body) {
        (Some(to_email), Some(subject), Some(body)) if missing.is_empty() => Ok(ValidatedRequest {
            to_email,
            subject,
            body,
            number,
            user_id: non_empty(req.user_id),
            username: non_empty(req.username),
        }),
        _ => Err(RelayError::BadRequest(format!(
            "missing required fields: {}",
            missing.join(", ")
        ))),
    }
}

async fn notify_outcome(state: &AppState, policy: RelayPolicy, text: String) {
    if !policy.notify {
        return;
    }
    let Some(notifier) = &state.notifier else {
        return;
    };
    if let Err(err) = notifier.notify(&text).await {
        warn!("delivery notification failed: {err:#}");
    }
}
