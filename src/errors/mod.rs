use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Field name -> human readable message, one entry per violated rule.
pub type FieldErrors = HashMap<String, String>;

#[derive(Debug)]
pub enum AppError {
    Validation(FieldErrors),
    NotFound(String),
    BadRequest(String),
    InternalServerError(String),
    DatabaseError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ValidationResponse {
    errors: FieldErrors,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                let mut fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                fields.sort_unstable();
                write!(f, "Validation failed: {}", fields.join(", "))
            }
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => {
                HttpResponse::BadRequest().json(ValidationResponse { errors: errors.clone() })
            }
            AppError::NotFound(msg) => HttpResponse::NotFound().json(ErrorResponse { error: msg.clone() }),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(ErrorResponse { error: msg.clone() }),
            AppError::InternalServerError(msg) => {
                HttpResponse::InternalServerError().json(ErrorResponse { error: msg.clone() })
            }
            AppError::DatabaseError(msg) => {
                HttpResponse::InternalServerError().json(ErrorResponse { error: msg.clone() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let mut errors = FieldErrors::new();
        errors.insert("salary".to_string(), "Salary must be at least 25,000.".to_string());
        let response = AppError::Validation(errors).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::NotFound("Employee not found".to_string()).error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failures_map_to_500() {
        let response = AppError::DatabaseError("Database error".to_string()).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_body_is_field_keyed() {
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), "This email is already in use.".to_string());
        let body = serde_json::to_value(ValidationResponse { errors }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"errors": {"email": "This email is already in use."}})
        );
    }

    #[test]
    fn display_lists_violated_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("salary".to_string(), "too low".to_string());
        errors.insert("email".to_string(), "taken".to_string());
        let rendered = AppError::Validation(errors).to_string();
        assert_eq!(rendered, "Validation failed: email, salary");
    }
}
