use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// 上流の認証基盤が付与する会社 ID ヘッダー
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// 呼び出し元の会社
/// Usage in handlers: `async fn handler(CompanyContext(company_id): CompanyContext)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyContext(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(COMPANY_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| CompanyContext(id.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CompanyContext, AppError> {
        let (mut parts, _) = request.into_parts();
        CompanyContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_trimmed_company_id() {
        let request = Request::builder()
            .header("X-Company-Id", " company-1 ")
            .body(())
            .unwrap();
        assert_eq!(
            extract(request).await.unwrap(),
            CompanyContext("company-1".to_string())
        );
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_unauthorized() {
        let missing = Request::builder().body(()).unwrap();
        assert!(matches!(extract(missing).await, Err(AppError::Unauthorized)));

        let blank = Request::builder().header(COMPANY_ID_HEADER, "  ").body(()).unwrap();
        assert!(matches!(extract(blank).await, Err(AppError::Unauthorized)));
    }
}
