use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 雇用契約 (`contracts` ドキュメント)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub period: Option<ContractPeriod>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// 詳細画面用のその他の契約項目
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 契約期間
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractPeriod {
    #[serde(rename = "type")]
    pub period_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ContractPeriod {
    pub fn is_permanent(&self) -> bool {
        self.period_type.as_deref() == Some("permanent")
    }
}

impl Contract {
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.period.as_ref().and_then(|p| p.end_date)
    }

    /// 一覧の「更新日」: updatedAt がなければ createdAt
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// 従業員 (`employees` ドキュメント)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
