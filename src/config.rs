use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub mapping: MappingConfig,
    pub contracts: ContractsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// CSV マッピング設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// 外部システムの記号プレフィックス (例: "KY01")
    pub symbol_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// 「期限間近」と判定する残り日数
    pub expiring_window_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/hr_backoffice".to_string(),
                max_connections: 20,
            },
            mapping: MappingConfig {
                symbol_prefix: "KY".to_string(),
            },
            contracts: ContractsConfig {
                expiring_window_days: 30,
            },
        }
    }
}

impl AppConfig {
    /// 既定値 → config/default.toml → 環境変数 (HR_SERVER__PORT など) の順に読み込む
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port)?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("mapping.symbol_prefix", defaults.mapping.symbol_prefix)?
            .set_default(
                "contracts.expiring_window_days",
                defaults.contracts.expiring_window_days,
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("HR").separator("__"));

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }
}
