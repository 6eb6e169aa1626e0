use std::time::Duration;

use anyhow::{bail, Context};
use log::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;

/// Process configuration, read from the environment once at startup and
/// passed into the app state so handlers never touch the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Sender address, also used as the SMTP username.
    pub sender: String,
    pub sender_password: String,
    /// Shared secret compared verbatim against the inbound credential.
    pub api_key: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Upper bound on SMTP connection establishment and send time.
    pub smtp_timeout: Duration,
    /// Accept self-signed/invalid certificates on the STARTTLS handshake.
    /// Defaults to true to match the upstream submission setup; set
    /// `RELAY_SMTP_ACCEPT_INVALID_CERTS=false` to require verification.
    pub smtp_accept_invalid_certs: bool,
    /// Present only when both Telegram variables are set; absence disables
    /// the notification side effect entirely.
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let sender = require_var("RELAY_SENDER")?;
        let sender_password = require_var("RELAY_SENDER_PASSWORD")?;
        let api_key = require_var("RELAY_API_KEY")?;

        let port = parse_var("RELAY_PORT", DEFAULT_PORT)?;
        let smtp_host =
            std::env::var("RELAY_SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let smtp_port = parse_var("RELAY_SMTP_PORT", DEFAULT_SMTP_PORT)?;
        let timeout_secs = parse_var("RELAY_SMTP_TIMEOUT_SECS", DEFAULT_SMTP_TIMEOUT_SECS)?;
        let smtp_accept_invalid_certs = parse_var("RELAY_SMTP_ACCEPT_INVALID_CERTS", true)?;

        let bot_token = std::env::var("RELAY_TELEGRAM_BOT_TOKEN").ok();
        let chat_id = std::env::var("RELAY_TELEGRAM_CHAT_ID").ok();
        let telegram = match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            (None, None) => None,
            _ => {
                warn!(
                    "only one of RELAY_TELEGRAM_BOT_TOKEN / RELAY_TELEGRAM_CHAT_ID is set, \
                     notifications disabled"
                );
                None
            }
        };

        Ok(Self {
            port,
            sender,
            sender_password,
            api_key,
            smtp_host,
            smtp_port,
            smtp_timeout: Duration::from_secs(timeout_secs),
            smtp_accept_invalid_certs,
            telegram,
        })
    }
}

fn require_var(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name).unwrap_or_default();
    if value.is_empty() {
        bail!("environment variable {name} must be set");
    }
    Ok(value)
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw}")),
        Err(_) => Ok(default),
    }
}
