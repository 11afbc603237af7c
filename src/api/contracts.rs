use crate::api::CompanyContext;
use crate::error::AppResult;
use crate::service::contracts::{ContractDetail, ContractFilter, ContractListing};
use crate::service::ContractService;
use axum::{
    extract::{Json, Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

/// 一覧の絞り込みパラメータ (?filter=active など)
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> AppResult<ContractFilter> {
        self.filter.as_deref().unwrap_or_default().parse()
    }
}

pub async fn list_contracts(
    State(service): State<Arc<ContractService>>,
    CompanyContext(company_id): CompanyContext,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ContractListing>> {
    let filter = query.filter()?;
    Ok(Json(service.list(&company_id, filter).await?))
}

/// 一覧を CSV でダウンロード
pub async fn export_contracts(
    State(service): State<Arc<ContractService>>,
    CompanyContext(company_id): CompanyContext,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = query.filter()?;
    let body = service.export_csv(&company_id, filter).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"contracts.csv\""),
        ],
        body,
    ))
}

pub async fn get_contract(
    State(service): State<Arc<ContractService>>,
    CompanyContext(company_id): CompanyContext,
    Path(id): Path<String>,
) -> AppResult<Json<ContractDetail>> {
    Ok(Json(service.detail(&company_id, &id).await?))
}
