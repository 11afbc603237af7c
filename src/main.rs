use hr_backoffice_rust::models::SymbolConvention;
use hr_backoffice_rust::{api, create_pool, AppConfig, CompanyService, ContractService, MappingService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ログ初期化 (ローカル時刻)
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 設定読み込み
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // データベース接続プール
    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    info!("Database pool created");

    let company_service = Arc::new(CompanyService::new(pool.clone()));
    let contract_service = Arc::new(ContractService::new(
        pool.clone(),
        config.contracts.expiring_window_days,
    ));
    let mapping_service = Arc::new(MappingService::new(
        pool,
        SymbolConvention::new(config.mapping.symbol_prefix.clone()),
    ));

    let app = api::router(company_service, contract_service, mapping_service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET|PUT  /api/company");
    info!("  GET|POST /api/departments, DELETE /api/departments/:id");
    info!("  GET|PUT  /api/employment-settings");
    info!("  GET      /api/contracts[?filter=], /api/contracts/export, /api/contracts/:id");
    info!("  POST|DELETE /api/csv-mapping/session, GET /api/csv-mapping/main-fields");
    info!("  PUT      /api/csv-mapping/main-fields/:field, POST /api/csv-mapping/save");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
