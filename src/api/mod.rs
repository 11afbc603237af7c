pub mod context;
pub mod contracts;
pub mod handlers;
pub mod mapping;

use crate::service::{CompanyService, ContractService, MappingService};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

pub use context::CompanyContext;
pub use handlers::health_check;

/// 全 API のルーティング
pub fn router(
    company: Arc<CompanyService>,
    contract: Arc<ContractService>,
    mapping: Arc<MappingService>,
) -> Router {
    let company_routes = Router::new()
        .route(
            "/api/company",
            get(handlers::get_company).put(handlers::save_company),
        )
        .route(
            "/api/departments",
            get(handlers::list_departments).post(handlers::add_department),
        )
        .route("/api/departments/:id", delete(handlers::delete_department))
        .route(
            "/api/employment-settings",
            get(handlers::get_employment_settings).put(handlers::save_employment_settings),
        )
        .with_state(company);

    let contract_routes = Router::new()
        .route("/api/contracts", get(contracts::list_contracts))
        .route("/api/contracts/export", get(contracts::export_contracts))
        .route("/api/contracts/:id", get(contracts::get_contract))
        .with_state(contract);

    let mapping_routes = Router::new()
        .route(
            "/api/csv-mapping/session",
            post(mapping::open_session).delete(mapping::discard_session),
        )
        .route("/api/csv-mapping/main-fields", get(mapping::main_fields))
        .route(
            "/api/csv-mapping/main-fields/:field",
            put(mapping::update_main_field),
        )
        .route("/api/csv-mapping/save", post(mapping::save_mapping))
        .with_state(mapping);

    Router::new()
        .route("/health", get(health_check))
        .merge(company_routes)
        .merge(contract_routes)
        .merge(mapping_routes)
        .layer(ServiceBuilder::new())
}
