use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::Json;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::str::FromStr;

use crate::auth::{Claims, Role};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The authenticated caller, decoded from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Reject with 403 unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "{} accounts cannot perform this action",
                self.role
            )))
        }
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthenticated("No token provided".into()))?;

        state
            .tokens
            .verify(token)
            .map(CurrentUser::from)
            .map_err(|e| {
                tracing::warn!("Rejected bearer token: {}", e);
                AppError::Unauthenticated("Unauthorized or invalid token".into())
            })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// `Json<T>` whose rejections come back as a 400 `{message}` body.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> FromRequest<AppState> for JsonBody<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// A file part pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Text fields plus attached files.
///
/// Accepts `multipart/form-data` (the shape browser forms with attachments
/// send) and plain JSON objects, so attachment-free calls can skip multipart.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<FileUpload>,
}

impl UploadForm {
    /// Trimmed, non-empty text value for `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Non-empty value for `key` exactly as sent. Used for passwords.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn text_owned(&self, key: &str) -> Option<String> {
        self.text(key).map(str::to_string)
    }

    /// Parse `key` when present; a present but unparsable value is a 400.
    pub fn parse<T: FromStr>(&self, key: &str) -> AppResult<Option<T>> {
        match self.text(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| AppError::validation(format!("Invalid value for {}", key))),
        }
    }

    /// Take every file submitted under `field`.
    pub fn take_files(&mut self, field: &str) -> Vec<FileUpload> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = rest;
        matching
    }

    #[cfg(test)]
    pub(crate) fn from_parts(fields: &[(&str, &str)], files: Vec<FileUpload>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files,
        }
    }
}

impl FromRequest<AppState> for UploadForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        let mut form = UploadForm::default();

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;

            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| AppError::validation(e.body_text()))?
            {
                let name = field.name().unwrap_or_default().to_string();
                match field.file_name().map(str::to_string) {
                    Some(file_name) => {
                        let content_type = field.content_type().map(str::to_string);
                        let data = field
                            .bytes()
                            .await
                            .map_err(|e| AppError::validation(e.body_text()))?;
                        // Browsers send an empty part for an untouched file input
                        if file_name.is_empty() && data.is_empty() {
                            continue;
                        }
                        form.files.push(FileUpload {
                            field: name,
                            file_name,
                            content_type,
                            data,
                        });
                    }
                    None => {
                        let value = field
                            .text()
                            .await
                            .map_err(|e| AppError::validation(e.body_text()))?;
                        form.fields.insert(name, value);
                    }
                }
            }
        } else {
            let Json(value) = Json::<serde_json::Value>::from_request(req, state).await?;

            let object = value
                .as_object()
                .ok_or_else(|| AppError::validation("Request body must be an object"))?;
            for (key, value) in object {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                form.fields.insert(key.clone(), text);
            }
        }

        Ok(form)
    }
}
