/**
 * Contact Routes
 * Contact form submission and the admin inbox
 */
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::db::{contact, models::ContactMessage};
use crate::error::ApiError;
use crate::routes::{auth::AdminAuth, require_pool, validation};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// Contact form after trimming and validation
struct ContactForm {
    name: String,
    email: String,
    subject: String,
    message: String,
}

impl ContactRequest {
    fn validate(self) -> Result<ContactForm, ApiError> {
        Ok(ContactForm {
            name: validation::required("Name", &self.name)?,
            email: validation::email(&self.email)?,
            subject: validation::required("Subject", &self.subject)?,
            message: validation::required("Message", &self.message)?,
        })
    }
}

/// POST /api/contact
pub async fn send_message(
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = payload.validate()?;
    let pool = require_pool()?;

    let saved = contact::insert(&pool, &form.name, &form.email, &form.subject, &form.message)
        .await
        .map_err(|e| ApiError::database("Failed to send message", e))?;

    tracing::info!(message_id = %saved.id, "contact message received");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            message: "Thank you for your message! I'll get back to you soon.".to_string(),
        }),
    ))
}

/// GET /api/admin/messages - Newest first
pub async fn admin_list_messages(
    _admin: AdminAuth,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    let pool = require_pool()?;
    contact::list(&pool)
        .await
        .map(Json)
        .map_err(|e| ApiError::database("Failed to load messages", e))
}
