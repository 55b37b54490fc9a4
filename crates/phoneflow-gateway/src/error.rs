// crates/phoneflow-gateway/src/error.rs
// ============================================================================
// Module: API Errors
// Description: Translation of validation and store failures into responses.
// Purpose: Give every handler one JSON error contract.
// Dependencies: axum, phoneflow-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Handlers convert failures into [`ApiError`] through an [`ErrorPolicy`],
//! which decides whether internal details may appear in 500 bodies. The
//! response contract is:
//!
//! | Error | Status | Body |
//! |---|---|---|
//! | validation | 400 | `{"error": "Datos inválidos", "fields": [...]}` |
//! | not found | 404 | `{"error": "<Label> no encontrado/a"}` |
//! | unknown route | 404 | `{"error": "Ruta no encontrada"}` |
//! | wrong method | 405 | `{"error": "Método no permitido"}` |
//! | oversized body | 413 | `{"error": "Cuerpo de solicitud demasiado grande"}` |
//! | internal | 500 | `{"error": "Error interno del servidor"}` (+ `details`) |

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Display;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use phoneflow_core::EntityKind;
use phoneflow_core::StoreError;
use phoneflow_core::ValidationError;
use serde_json::Value;
use serde_json::json;
use tracing::error;
use tracing::warn;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Error message for rejected input.
pub const VALIDATION_MESSAGE: &str = "Datos inválidos";
/// Error message for unexpected failures.
pub const INTERNAL_MESSAGE: &str = "Error interno del servidor";
/// Error message for unknown routes.
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Ruta no encontrada";
/// Error message for routes without a handler for the request method.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Método no permitido";
/// Error message for bodies above the configured limit.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Cuerpo de solicitud demasiado grande";

// ============================================================================
// SECTION: API Error
// ============================================================================

/// Handler failure ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Input failed validation.
    Validation {
        /// Offending field names.
        fields: Vec<String>,
    },
    /// Target record does not exist.
    NotFound {
        /// Entity that was addressed.
        entity: EntityKind,
    },
    /// No route matched the request.
    RouteNotFound,
    /// The route exists but not for the request method.
    MethodNotAllowed,
    /// The request body exceeded the configured limit.
    PayloadTooLarge,
    /// Unexpected failure.
    Internal {
        /// Underlying error text, always logged.
        message: String,
        /// Whether the message is included in the body.
        expose: bool,
    },
}

impl ApiError {
    /// Returns the HTTP status for the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation {
                ..
            } => StatusCode::BAD_REQUEST,
            Self::NotFound {
                ..
            }
            | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal {
                ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the JSON body for the error.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::Validation {
                fields,
            } => json!({ "error": VALIDATION_MESSAGE, "fields": fields }),
            Self::NotFound {
                entity,
            } => json!({ "error": entity.not_found_message() }),
            Self::RouteNotFound => json!({ "error": ROUTE_NOT_FOUND_MESSAGE }),
            Self::MethodNotAllowed => json!({ "error": METHOD_NOT_ALLOWED_MESSAGE }),
            Self::PayloadTooLarge => json!({ "error": PAYLOAD_TOO_LARGE_MESSAGE }),
            Self::Internal {
                message,
                expose: true,
            } => json!({ "error": INTERNAL_MESSAGE, "details": message }),
            Self::Internal {
                expose: false,
                ..
            } => json!({ "error": INTERNAL_MESSAGE }),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::Validation {
            fields: error.fields,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal {
                message,
                ..
            } => error!(status = status.as_u16(), error = %message, "request failed"),
            Self::Validation {
                fields,
            } => warn!(status = status.as_u16(), fields = %fields.join(","), "request rejected"),
            Self::NotFound {
                entity,
            } => warn!(status = status.as_u16(), entity = %entity, "record not found"),
            Self::RouteNotFound => warn!(status = status.as_u16(), "route not found"),
            Self::MethodNotAllowed => warn!(status = status.as_u16(), "method not allowed"),
            Self::PayloadTooLarge => warn!(status = status.as_u16(), "request body too large"),
        }
        (status, Json(self.body())).into_response()
    }
}

// ============================================================================
// SECTION: Error Policy
// ============================================================================

/// Disclosure policy applied when translating failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// Include internal error text in 500 bodies.
    expose_details: bool,
}

impl ErrorPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(expose_details: bool) -> Self {
        Self {
            expose_details,
        }
    }

    /// Wraps an unexpected failure.
    #[must_use]
    pub fn internal(self, error: impl Display) -> ApiError {
        ApiError::Internal {
            message: error.to_string(),
            expose: self.expose_details,
        }
    }

    /// Translates a store failure from a resource operation.
    #[must_use]
    pub fn store(self, error: StoreError) -> ApiError {
        match error {
            StoreError::NotFound {
                entity,
                ..
            } => ApiError::NotFound {
                entity,
            },
            StoreError::Duplicate {
                field,
                ..
            } => ApiError::Validation {
                fields: vec![field],
            },
            other => self.internal(other),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
