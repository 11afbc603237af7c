use crate::api::CompanyContext;
use crate::error::AppResult;
use crate::models::{CompanyInfo, Department, EmploymentSettings, NewDepartment};
use crate::service::company::SavedCompany;
use crate::service::CompanyService;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

/// 更新系 API の応答
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// ヘルスチェック
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn get_company(
    State(service): State<Arc<CompanyService>>,
    CompanyContext(company_id): CompanyContext,
) -> AppResult<Json<CompanyInfo>> {
    Ok(Json(service.get_company(&company_id).await?))
}

pub async fn save_company(
    State(service): State<Arc<CompanyService>>,
    CompanyContext(company_id): CompanyContext,
    Json(info): Json<CompanyInfo>,
) -> AppResult<Json<ApiResponse<SavedCompany>>> {
    let saved = service.save_company(&company_id, info).await?;
    let message = if saved.generated_company_number {
        format!("会社情報を保存しました (会社番号: {})", saved.company.company_number)
    } else {
        "会社情報を保存しました".to_string()
    };
    Ok(Json(ApiResponse::ok(message, saved)))
}

pub async fn list_departments(
    State(service): State<Arc<CompanyService>>,
    CompanyContext(company_id): CompanyContext,
) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(service.list_departments(&company_id).await?))
}

pub async fn add_department(
    State(service): State<Arc<CompanyService>>,
    CompanyContext(company_id): CompanyContext,
    Json(new): Json<NewDepartment>,
) -> AppResult<(StatusCode, Json<ApiResponse<Department>>)> {
    let department = service.add_department(&company_id, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("部門を追加しました", department)),
    ))
}

pub async fn delete_department(
    State(service): State<Arc<CompanyService>>,
    CompanyContext(company_id): CompanyContext,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<String>>> {
    service.delete_department(&company_id, &id).await?;
    Ok(Json(ApiResponse::ok("部門を削除しました", id)))
}

pub async fn get_employment_settings(
    State(service): State<Arc<CompanyService>>,
    CompanyContext(company_id): CompanyContext,
) -> AppResult<Json<EmploymentSettings>> {
    Ok(Json(service.get_employment_settings(&company_id).await?))
}

pub async fn save_employment_settings(
    State(service): State<Arc<CompanyService>>,
    CompanyContext(company_id): CompanyContext,
    Json(settings): Json<EmploymentSettings>,
) -> AppResult<Json<ApiResponse<EmploymentSettings>>> {
    let saved = service
        .save_employment_settings(&company_id, settings)
        .await?;
    Ok(Json(ApiResponse::ok("雇用契約設定を保存しました", saved)))
}
