//! Request extractors with JSON error bodies.

use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Drop-in replacement for [`axum::Json`] whose rejections render as
/// field-keyed validation errors instead of plain-text responses.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
