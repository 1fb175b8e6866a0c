use std::sync::Arc;

use hoshidori_mail::Mailer;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: hoshidori_db::DbPool,
    /// Server configuration (JWT secret, media root, local offset).
    pub config: Arc<ServerConfig>,
    /// SMTP mailer for the contact form. `None` when SMTP is not configured.
    pub mailer: Option<Mailer>,
}
