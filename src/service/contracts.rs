use crate::db::{self, collections, DocumentRow};
use crate::error::{AppError, AppResult};
use crate::models::{Contract, Employee, EmploymentSettings};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::str::FromStr;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// 契約期間の終了日から判定するステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractStatus {
    /// 終了日なし (無期雇用)
    Permanent,
    Active,
    Expiring { days: i64 },
    Expired,
}

impl ContractStatus {
    /// 残り日数は切り上げ。0 日 (当日中に終了) は期限間近。
    pub fn evaluate(end_date: Option<DateTime<Utc>>, now: DateTime<Utc>, window_days: i64) -> Self {
        let Some(end_date) = end_date else {
            return ContractStatus::Permanent;
        };

        let millis = (end_date - now).num_milliseconds();
        let mut days = millis / MILLIS_PER_DAY;
        if millis % MILLIS_PER_DAY > 0 {
            days += 1;
        }

        if days < 0 {
            ContractStatus::Expired
        } else if days <= window_days {
            ContractStatus::Expiring { days }
        } else {
            ContractStatus::Active
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ContractStatus::Permanent => "permanent",
            ContractStatus::Active => "active",
            ContractStatus::Expiring { .. } => "expiring",
            ContractStatus::Expired => "expired",
        }
    }

    pub fn label(self) -> String {
        match self {
            ContractStatus::Permanent => "無期雇用".to_string(),
            ContractStatus::Active => "有効".to_string(),
            ContractStatus::Expiring { days } => format!("{}日後期限", days),
            ContractStatus::Expired => "期限切れ".to_string(),
        }
    }

    pub fn info(self) -> StatusInfo {
        StatusInfo {
            status: self.key(),
            label: self.label(),
        }
    }
}

/// 画面表示用のステータス
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub status: &'static str,
    pub label: String,
}

/// 一覧の絞り込み条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractFilter {
    #[default]
    All,
    Active,
    Expiring,
    Expired,
}

impl ContractFilter {
    /// 無期雇用は「すべて」にのみ含まれる
    pub fn matches(self, status: ContractStatus) -> bool {
        match self {
            ContractFilter::All => true,
            ContractFilter::Active => status == ContractStatus::Active,
            ContractFilter::Expiring => matches!(status, ContractStatus::Expiring { .. }),
            ContractFilter::Expired => status == ContractStatus::Expired,
        }
    }
}

impl FromStr for ContractFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(ContractFilter::All),
            "active" => Ok(ContractFilter::Active),
            "expiring" => Ok(ContractFilter::Expiring),
            "expired" => Ok(ContractFilter::Expired),
            other => Err(AppError::Validation(format!("不明な絞り込み条件です: {}", other))),
        }
    }
}

impl fmt::Display for ContractFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContractFilter::All => "all",
            ContractFilter::Active => "active",
            ContractFilter::Expiring => "expiring",
            ContractFilter::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// 一覧の 1 行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRow {
    pub id: String,
    pub employee_name: String,
    pub employee_id: String,
    pub employment_type: String,
    pub period: String,
    pub status: StatusInfo,
    pub updated_on: String,
}

/// 絞り込みごとの件数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub all: usize,
    pub active: usize,
    pub expiring: usize,
    pub expired: usize,
    /// 集計欄の「有効」: 有効 + 無期雇用
    pub valid: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractListing {
    pub filter: ContractFilter,
    pub counts: FilterCounts,
    pub contracts: Vec<ContractRow>,
}

/// 契約詳細
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetail {
    pub contract: Contract,
    pub employee: Option<Employee>,
    pub employment_settings: Option<EmploymentSettings>,
    pub status: StatusInfo,
}

fn format_date<Tz>(date: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    date.with_timezone(tz).format("%Y/%-m/%-d").to_string()
}

/// 契約期間の表示文字列
pub fn period_text<Tz>(contract: &Contract, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match &contract.period {
        Some(period) if period.is_permanent() => "期間の定めなし".to_string(),
        Some(period) => match (period.start_date, period.end_date) {
            (Some(start), Some(end)) => {
                format!("{} ～ {}", format_date(start, tz), format_date(end, tz))
            }
            _ => "未設定".to_string(),
        },
        None => "未設定".to_string(),
    }
}

/// 契約と従業員から一覧を組み立てる
pub fn build_listing<Tz>(
    contracts: &[Contract],
    employees: &HashMap<String, Employee>,
    filter: ContractFilter,
    now: DateTime<Utc>,
    window_days: i64,
    tz: &Tz,
) -> ContractListing
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut counts = FilterCounts {
        all: contracts.len(),
        ..Default::default()
    };
    let mut rows = Vec::new();

    for contract in contracts {
        let status = ContractStatus::evaluate(contract.end_date(), now, window_days);
        match status {
            ContractStatus::Active => {
                counts.active += 1;
                counts.valid += 1;
            }
            ContractStatus::Expiring { .. } => counts.expiring += 1,
            ContractStatus::Expired => counts.expired += 1,
            ContractStatus::Permanent => counts.valid += 1,
        }

        if !filter.matches(status) {
            continue;
        }

        let employee = employees.get(&contract.employee_id);
        rows.push(ContractRow {
            id: contract.id.clone(),
            employee_name: employee
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "不明な従業員".to_string()),
            employee_id: employee
                .map(|e| e.employee_id.clone())
                .unwrap_or_else(|| contract.employee_id.clone()),
            employment_type: contract
                .employment_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "未設定".to_string()),
            period: period_text(contract, tz),
            status: status.info(),
            updated_on: contract
                .last_modified()
                .map(|d| format_date(d, tz))
                .unwrap_or_default(),
        });
    }

    ContractListing {
        filter,
        counts,
        contracts: rows,
    }
}

/// 一覧を CSV (ヘッダー行つき) で書き出す
pub fn write_csv<W: io::Write>(rows: &[ContractRow], writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["契約ID", "従業員", "従業員ID", "雇用形態", "契約期間", "ステータス", "更新日"])?;

    for row in rows {
        writer.write_record([
            row.id.as_str(),
            row.employee_name.as_str(),
            row.employee_id.as_str(),
            row.employment_type.as_str(),
            row.period.as_str(),
            row.status.label.as_str(),
            row.updated_on.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn decode_contract(row: &DocumentRow) -> Result<Contract, serde_json::Error> {
    let mut contract: Contract = row.decode()?;
    contract.id = row.id.clone();
    contract.created_at = contract.created_at.or(Some(row.created_at));
    Ok(contract)
}

/// 契約一覧・詳細サービス
pub struct ContractService {
    pool: PgPool,
    expiring_window_days: i64,
}

impl ContractService {
    pub fn new(pool: PgPool, expiring_window_days: i64) -> Self {
        Self {
            pool,
            expiring_window_days,
        }
    }

    pub async fn list(&self, company_id: &str, filter: ContractFilter) -> AppResult<ContractListing> {
        let rows =
            db::list_by_company_newest_first(&self.pool, collections::CONTRACTS, company_id).await?;
        let contracts = rows
            .iter()
            .map(decode_contract)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!("Loaded {} contracts for {}", contracts.len(), company_id);

        let employee_rows =
            db::list_by_company(&self.pool, collections::EMPLOYEES, company_id).await?;
        let mut employees = HashMap::with_capacity(employee_rows.len());
        for row in &employee_rows {
            let employee: Employee = row.decode()?;
            employees.insert(employee.employee_id.clone(), employee);
        }

        Ok(build_listing(
            &contracts,
            &employees,
            filter,
            Utc::now(),
            self.expiring_window_days,
            &Local,
        ))
    }

    pub async fn export_csv(&self, company_id: &str, filter: ContractFilter) -> AppResult<Vec<u8>> {
        let listing = self.list(company_id, filter).await?;
        let mut buffer = Vec::new();
        write_csv(&listing.contracts, &mut buffer)?;
        tracing::info!(
            "Exported {} contracts for {} (filter: {})",
            listing.contracts.len(),
            company_id,
            filter
        );
        Ok(buffer)
    }

    pub async fn detail(&self, company_id: &str, contract_id: &str) -> AppResult<ContractDetail> {
        let row = db::get_document(&self.pool, collections::CONTRACTS, contract_id)
            .await?
            .ok_or_else(|| AppError::NotFound("契約が見つかりません".into()))?;
        let contract = decode_contract(&row)?;

        if contract.company_id != company_id {
            tracing::warn!(
                "Company {} attempted to read contract {} of {}",
                company_id,
                contract_id,
                contract.company_id
            );
            return Err(AppError::Forbidden("この契約にアクセスする権限がありません".into()));
        }

        let (employee_row, settings_row) = futures::try_join!(
            db::get_document(&self.pool, collections::EMPLOYEES, &contract.employee_id),
            db::get_document(&self.pool, collections::EMPLOYMENT_SETTINGS, company_id),
        )?;

        let employee = employee_row.map(|r| r.decode::<Employee>()).transpose()?;
        let employment_settings = settings_row
            .map(|r| r.decode::<EmploymentSettings>())
            .transpose()?;
        let status =
            ContractStatus::evaluate(contract.end_date(), Utc::now(), self.expiring_window_days);

        Ok(ContractDetail {
            contract,
            employee,
            employment_settings,
            status: status.info(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContractPeriod;
    use chrono::Duration;
    use serde_json::Map;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()
    }

    fn contract(id: &str, employee_id: &str, period: Option<ContractPeriod>) -> Contract {
        Contract {
            id: id.to_string(),
            company_id: "c1".to_string(),
            employee_id: employee_id.to_string(),
            employment_type: Some("契約社員".to_string()),
            period,
            created_at: Some(Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()),
            updated_at: None,
            extra: Map::new(),
        }
    }

    fn fixed_term(end: DateTime<Utc>) -> Option<ContractPeriod> {
        Some(ContractPeriod {
            period_type: Some("fixed".to_string()),
            start_date: Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
            end_date: Some(end),
        })
    }

    #[test]
    fn status_without_end_date_is_permanent() {
        let status = ContractStatus::evaluate(None, now(), 30);
        assert_eq!(status, ContractStatus::Permanent);
        assert_eq!(status.label(), "無期雇用");
    }

    #[test]
    fn status_rounds_remaining_days_up() {
        let status = ContractStatus::evaluate(Some(now() + Duration::hours(36)), now(), 30);
        assert_eq!(status, ContractStatus::Expiring { days: 2 });
        assert_eq!(status.label(), "2日後期限");
    }

    #[test]
    fn status_window_boundaries() {
        assert_eq!(
            ContractStatus::evaluate(Some(now() + Duration::days(30)), now(), 30),
            ContractStatus::Expiring { days: 30 }
        );
        assert_eq!(
            ContractStatus::evaluate(Some(now() + Duration::days(30) + Duration::minutes(1)), now(), 30),
            ContractStatus::Active
        );
        assert_eq!(
            ContractStatus::evaluate(Some(now() - Duration::hours(1)), now(), 30),
            ContractStatus::Expiring { days: 0 }
        );
        assert_eq!(
            ContractStatus::evaluate(Some(now() - Duration::days(1)), now(), 30),
            ContractStatus::Expired
        );
    }

    #[test]
    fn filter_parses_known_values() {
        assert_eq!("expiring".parse::<ContractFilter>().unwrap(), ContractFilter::Expiring);
        assert_eq!("".parse::<ContractFilter>().unwrap(), ContractFilter::All);
        assert!("permanent".parse::<ContractFilter>().is_err());
    }

    #[test]
    fn listing_counts_and_filters() {
        let contracts = vec![
            contract("a", "E001", None),
            contract("b", "E002", fixed_term(now() + Duration::days(90))),
            contract("c", "E003", fixed_term(now() + Duration::days(10))),
            contract("d", "E404", fixed_term(now() - Duration::days(3))),
        ];
        let mut employees = HashMap::new();
        employees.insert(
            "E001".to_string(),
            Employee {
                employee_id: "E001".to_string(),
                name: "佐藤 花子".to_string(),
                company_id: "c1".to_string(),
                extra: Map::new(),
            },
        );

        let all = build_listing(&contracts, &employees, ContractFilter::All, now(), 30, &Utc);
        assert_eq!(
            all.counts,
            FilterCounts {
                all: 4,
                active: 1,
                expiring: 1,
                expired: 1,
                valid: 2
            }
        );
        assert_eq!(all.contracts.len(), 4);
        assert_eq!(all.contracts[0].employee_name, "佐藤 花子");
        assert_eq!(all.contracts[3].employee_name, "不明な従業員");
        assert_eq!(all.contracts[3].employee_id, "E404");

        let expiring = build_listing(&contracts, &employees, ContractFilter::Expiring, now(), 30, &Utc);
        assert_eq!(expiring.contracts.len(), 1);
        assert_eq!(expiring.contracts[0].id, "c");
        assert_eq!(expiring.contracts[0].status.label, "10日後期限");
        assert_eq!(expiring.counts.all, 4);

        let active = build_listing(&contracts, &employees, ContractFilter::Active, now(), 30, &Utc);
        assert_eq!(active.contracts.len(), 1);
        assert_eq!(active.contracts[0].id, "b");
    }

    #[test]
    fn period_text_variants() {
        let permanent = contract(
            "a",
            "E001",
            Some(ContractPeriod {
                period_type: Some("permanent".to_string()),
                ..Default::default()
            }),
        );
        assert_eq!(period_text(&permanent, &Utc), "期間の定めなし");

        let fixed = contract("b", "E001", fixed_term(Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap()));
        assert_eq!(period_text(&fixed, &Utc), "2024/4/1 ～ 2025/3/31");

        let open = contract(
            "c",
            "E001",
            Some(ContractPeriod {
                start_date: Some(now()),
                ..Default::default()
            }),
        );
        assert_eq!(period_text(&open, &Utc), "未設定");
        assert_eq!(period_text(&contract("d", "E001", None), &Utc), "未設定");
    }

    #[test]
    fn missing_employment_type_shows_placeholder_and_date_falls_back_to_created() {
        let mut c = contract("a", "E001", None);
        c.employment_type = Some(String::new());
        let listing = build_listing(&[c], &HashMap::new(), ContractFilter::All, now(), 30, &Utc);
        assert_eq!(listing.contracts[0].employment_type, "未設定");
        assert_eq!(listing.contracts[0].updated_on, "2025/1/10");
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let contracts = vec![
            contract(
                "a",
                "E001",
                Some(ContractPeriod {
                    period_type: Some("permanent".to_string()),
                    ..Default::default()
                }),
            ),
            contract("b", "E002", None),
        ];
        let listing = build_listing(&contracts, &HashMap::new(), ContractFilter::All, now(), 30, &Utc);

        let mut buffer = Vec::new();
        write_csv(&listing.contracts, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("契約ID,従業員"));
        assert_eq!(lines[1], "a,不明な従業員,E001,契約社員,期間の定めなし,無期雇用,2025/1/10");
        assert_eq!(lines[2], "b,不明な従業員,E002,契約社員,未設定,無期雇用,2025/1/10");
    }
}
