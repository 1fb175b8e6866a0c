use std::path::PathBuf;

use chrono::FixedOffset;

use crate::auth::jwt::JwtConfig;

/// Offset used when no `LOCAL_UTC_OFFSET_MINUTES` is configured (JST).
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 9 * 60;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Root directory for uploaded images, served under `/media`.
    pub media_dir: PathBuf,
    /// Local time zone used for "today" in schedule queries.
    pub local_offset: FixedOffset,
    /// Inbox for contact-form messages. `None` disables the contact form.
    pub contact_recipient: Option<String>,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `MEDIA_DIR`                | `media`                    |
    /// | `LOCAL_UTC_OFFSET_MINUTES` | `540`                      |
    /// | `CONTACT_RECIPIENT`        | unset                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let media_dir =
            PathBuf::from(std::env::var("MEDIA_DIR").unwrap_or_else(|_| "media".into()));

        let offset_minutes: i32 = std::env::var("LOCAL_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| DEFAULT_UTC_OFFSET_MINUTES.to_string())
            .parse()
            .expect("LOCAL_UTC_OFFSET_MINUTES must be a valid i32");
        let local_offset = offset_from_minutes(offset_minutes)
            .expect("LOCAL_UTC_OFFSET_MINUTES must be within +/- 24 hours");

        let contact_recipient = std::env::var("CONTACT_RECIPIENT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            media_dir,
            local_offset,
            contact_recipient,
            jwt,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A fixed UTC offset from a signed minute count.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn offset_accepts_negative_minutes() {
        let offset = offset_from_minutes(-300).unwrap();
        assert_eq!(offset.local_minus_utc(), -5 * 3600);
        assert_eq!(offset_from_minutes(540).unwrap().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn offset_rejects_out_of_range() {
        assert!(offset_from_minutes(24 * 60).is_none());
    }
}
