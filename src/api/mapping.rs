use crate::api::handlers::ApiResponse;
use crate::api::CompanyContext;
use crate::error::{AppError, AppResult};
use crate::models::MainField;
use crate::service::{MainFieldsView, MappingService};
use axum::extract::{Json, Path, State};
use serde::Deserialize;
use std::sync::Arc;

/// 基本項目の選択リクエスト (空文字で未選択に戻す)
#[derive(Debug, Deserialize)]
pub struct UpdateMainFieldRequest {
    #[serde(default)]
    pub symbol: String,
}

pub async fn open_session(
    State(service): State<Arc<MappingService>>,
    CompanyContext(company_id): CompanyContext,
) -> AppResult<Json<MainFieldsView>> {
    Ok(Json(service.open_session(&company_id).await?))
}

pub async fn main_fields(
    State(service): State<Arc<MappingService>>,
    CompanyContext(company_id): CompanyContext,
) -> AppResult<Json<MainFieldsView>> {
    Ok(Json(service.main_fields(&company_id)?))
}

pub async fn update_main_field(
    State(service): State<Arc<MappingService>>,
    CompanyContext(company_id): CompanyContext,
    Path(field): Path<String>,
    Json(req): Json<UpdateMainFieldRequest>,
) -> AppResult<Json<MainFieldsView>> {
    let field: MainField = field
        .parse()
        .map_err(|e: crate::models::UnknownMainField| AppError::Validation(e.to_string()))?;
    Ok(Json(service.update_main_field_mapping(
        &company_id,
        field,
        &req.symbol,
    )?))
}

pub async fn save_mapping(
    State(service): State<Arc<MappingService>>,
    CompanyContext(company_id): CompanyContext,
) -> AppResult<Json<ApiResponse<MainFieldsView>>> {
    let view = service.save(&company_id).await?;
    Ok(Json(ApiResponse::ok("マッピング設定を保存しました", view)))
}

pub async fn discard_session(
    State(service): State<Arc<MappingService>>,
    CompanyContext(company_id): CompanyContext,
) -> AppResult<Json<ApiResponse<()>>> {
    service.discard(&company_id)?;
    Ok(Json(ApiResponse::ok("編集内容を破棄しました", ())))
}
