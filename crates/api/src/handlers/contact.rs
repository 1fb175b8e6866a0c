//! Handler for the public contact form.

use axum::extract::State;
use hoshidori_db::models::validators::not_blank;
use hoshidori_mail::ContactMessage;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::state::AppState;

/// Request body for `POST /contact`.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub status: &'static str,
}

/// POST /api/v1/contact
///
/// Relays the message to the configured inbox with reply-to set to the
/// submitter.
pub async fn send(
    State(state): State<AppState>,
    Json(input): Json<ContactRequest>,
) -> AppResult<Json<ContactResponse>> {
    input.validate()?;

    let (Some(mailer), Some(recipient)) =
        (state.mailer.as_ref(), state.config.contact_recipient.as_deref())
    else {
        return Err(AppError::InternalError(
            "Contact form used without SMTP_HOST and CONTACT_RECIPIENT configured".into(),
        ));
    };

    let message = ContactMessage {
        name: input.name,
        email: input.email,
        message: input.message,
    };
    mailer.send_contact(recipient, &message).await?;

    Ok(Json(ContactResponse { status: "sent" }))
}
