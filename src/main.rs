mod config;
mod error;
mod handlers;
mod mailer;
mod notify;
mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use log::{info, warn};
use tower_http::cors::CorsLayer;

use config::Config;
use handlers::AppState;
use mailer::{MailTransport, SmtpMailer};
use notify::{Notifier, TelegramNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let config = Config::from_env()?;

    if config.smtp_accept_invalid_certs {
        warn!("SMTP certificate verification is disabled");
    }

    let mailer: Arc<dyn MailTransport> = Arc::new(SmtpMailer::new(&config)?);
    let notifier: Option<Arc<dyn Notifier>> = match &config.telegram {
        Some(telegram) => {
            info!("delivery notifications enabled for chat {}", telegram.chat_id);
            Some(Arc::new(TelegramNotifier::new(telegram)?))
        }
        None => None,
    };

    let port = config.port;
    let state = Arc::new(AppState {
        config,
        mailer,
        notifier,
    });

    let app = Router::new()
        .route(
            "/api/send-email",
            post(handlers::send_email).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/send",
            post(handlers::send).fallback(handlers::method_not_allowed),
        )
        .route("/api/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
