//! API エラー型

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// ハンドラ・サービス層で発生するエラー
#[derive(Debug, Error)]
pub enum AppError {
    /// 呼び出し元の会社情報が取得できない
    #[error("会社情報が取得できません")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    /// 他社のドキュメントへのアクセス
    #[error("{0}")]
    Forbidden(String),

    /// 必須項目の未入力など
    #[error("{0}")]
    Validation(String),

    /// 一意制約違反 (部門コードの重複など)
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// エラー応答ボディ
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Serialization(_) | AppError::Csv(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected ({}): {}", status, self);
        }

        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound("契約が見つかりません".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn store_and_document_errors_map_to_500() {
        let bad_doc = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        assert_eq!(
            AppError::from(bad_doc).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_is_the_user_facing_text() {
        let err = AppError::Validation("会社名を入力してください".into());
        assert_eq!(err.to_string(), "会社名を入力してください");
    }
}
