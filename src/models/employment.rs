use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 雇用契約用の会社設定 (`companyEmploymentSettings` ドキュメント)
///
/// 保存済みの値がない項目は個別に既定値で補われる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmploymentSettings {
    pub ceo_name: String,
    pub employee_count: u32,
    pub work_regulations: WorkRegulations,
    pub retirement: Retirement,
    pub resignation: Resignation,
    pub holidays: Holidays,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 就業規則
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkRegulations {
    pub storage_location: String,
    pub confirmation_method: String,
}

/// 定年制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Retirement {
    pub has_retirement: bool,
    pub retirement_age: u32,
    pub has_rehire: bool,
    pub rehire_max_age: u32,
}

/// 退職
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resignation {
    pub notice_period: u32,
    pub procedure: String,
}

/// 休日
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Holidays {
    pub regular_days: Vec<String>,
    pub irregular_days: String,
    pub flexible_scheduling: bool,
}

impl Default for WorkRegulations {
    fn default() -> Self {
        Self {
            storage_location: String::new(),
            confirmation_method: "書面の交付".to_string(),
        }
    }
}

impl Default for Retirement {
    fn default() -> Self {
        Self {
            has_retirement: true,
            retirement_age: 60,
            has_rehire: true,
            rehire_max_age: 65,
        }
    }
}

impl Default for Resignation {
    fn default() -> Self {
        Self {
            notice_period: 30,
            procedure: "退職する30日前までに届け出ること".to_string(),
        }
    }
}

impl Default for Holidays {
    fn default() -> Self {
        Self {
            regular_days: vec!["日曜日".to_string()],
            irregular_days: "会社カレンダーによる".to_string(),
            flexible_scheduling: false,
        }
    }
}
