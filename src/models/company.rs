use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 会社情報 (`companies` ドキュメント)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub tax_id: String,
    pub company_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 部門 (`departments` ドキュメント)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(default)]
    pub id: String,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// 部門追加リクエスト
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDepartment {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
}
