use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

impl ApiError {
    /// Maps a failed insert on a UNIQUE KEY to the given conflict error,
    /// so concurrent duplicate adds surface the same 400 as the existence check.
    pub fn from_insert_err(err: sea_orm::DbErr, conflict_message: &str) -> ApiError {
        let text = err.to_string();
        if text.contains("Duplicate") || text.contains("unique") {
            ApiError::Conflict(conflict_message.to_string())
        } else {
            ApiError::Database(err)
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Database(err) = self {
            log::error!("Database error: {:?}", err);
            return HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }));
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}
