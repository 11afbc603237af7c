use crate::db::{self, collections};
use crate::error::{AppError, AppResult};
use crate::models::{CompanyInfo, Department, EmploymentSettings, NewDepartment};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

const COMPANY_NUMBER_PREFIX: &str = "COMP";

/// 会社情報の保存結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCompany {
    pub company: CompanyInfo,
    /// 今回の保存で会社番号を採番したか
    pub generated_company_number: bool,
}

/// 会社設定サービス (会社情報・部門・雇用契約設定)
pub struct CompanyService {
    pool: PgPool,
}

impl CompanyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_company(&self, company_id: &str) -> AppResult<CompanyInfo> {
        let row = db::get_document(&self.pool, collections::COMPANIES, company_id).await?;
        match row {
            Some(row) => Ok(row.decode()?),
            None => {
                tracing::info!("No company document for {}, returning empty profile", company_id);
                Ok(CompanyInfo::default())
            }
        }
    }

    pub async fn save_company(&self, company_id: &str, info: CompanyInfo) -> AppResult<SavedCompany> {
        if info.name.trim().is_empty() {
            return Err(AppError::Validation("会社名を入力してください".into()));
        }

        let mut company = info;
        let mut generated_company_number = false;
        if company.company_number.is_empty() {
            let existing =
                db::list_field_values(&self.pool, collections::COMPANIES, "companyNumber").await?;
            company.company_number = next_company_number(existing.iter().map(String::as_str));
            generated_company_number = true;
            tracing::info!("Generated company number {} for {}", company.company_number, company_id);
        }

        let stored = db::get_document(&self.pool, collections::COMPANIES, company_id).await?;
        let stored_created_at = match stored {
            Some(row) => Some(row.decode::<CompanyInfo>()?.created_at.unwrap_or(row.created_at)),
            None => None,
        };
        stamp_company(&mut company, stored_created_at, Utc::now());

        let data = serde_json::to_value(&company)?;
        db::upsert_document(&self.pool, collections::COMPANIES, company_id, Some(company_id), &data)
            .await?;
        tracing::info!("Company {} saved", company_id);

        Ok(SavedCompany {
            company,
            generated_company_number,
        })
    }

    pub async fn list_departments(&self, company_id: &str) -> AppResult<Vec<Department>> {
        let rows = db::list_by_company(&self.pool, collections::DEPARTMENTS, company_id).await?;
        let mut departments = Vec::with_capacity(rows.len());
        for row in rows {
            let mut department: Department = row.decode()?;
            department.id = row.id;
            department.created_at = department.created_at.or(Some(row.created_at));
            departments.push(department);
        }
        tracing::info!("Loaded {} departments for {}", departments.len(), company_id);
        Ok(departments)
    }

    pub async fn add_department(&self, company_id: &str, new: NewDepartment) -> AppResult<Department> {
        let existing = self.list_departments(company_id).await?;
        let new = validate_new_department(new, &existing)?;

        let mut department = Department {
            id: String::new(),
            code: new.code,
            name: new.name,
            company_id: company_id.to_string(),
            created_at: Some(Utc::now()),
        };
        let data = serde_json::json!({
            "code": department.code,
            "name": department.name,
            "companyId": department.company_id,
            "createdAt": department.created_at,
        });
        department.id =
            db::insert_document(&self.pool, collections::DEPARTMENTS, company_id, &data).await?;

        tracing::info!("Department {} ({}) added to {}", department.code, department.id, company_id);
        Ok(department)
    }

    pub async fn delete_department(&self, company_id: &str, id: &str) -> AppResult<()> {
        let deleted =
            db::delete_document(&self.pool, collections::DEPARTMENTS, id, company_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound("部門が見つかりません".into()));
        }
        tracing::info!("Department {} deleted from {}", id, company_id);
        Ok(())
    }

    pub async fn get_employment_settings(&self, company_id: &str) -> AppResult<EmploymentSettings> {
        let row =
            db::get_document(&self.pool, collections::EMPLOYMENT_SETTINGS, company_id).await?;
        match row {
            Some(row) => Ok(row.decode()?),
            None => {
                tracing::info!("No employment settings for {}, using defaults", company_id);
                Ok(EmploymentSettings::default())
            }
        }
    }

    pub async fn save_employment_settings(
        &self,
        company_id: &str,
        settings: EmploymentSettings,
    ) -> AppResult<EmploymentSettings> {
        if settings.ceo_name.trim().is_empty() {
            return Err(AppError::Validation("代表取締役名を入力してください".into()));
        }

        let mut settings = settings;
        settings.company_id = Some(company_id.to_string());
        settings.updated_at = Some(Utc::now());

        let data = serde_json::to_value(&settings)?;
        db::upsert_document(
            &self.pool,
            collections::EMPLOYMENT_SETTINGS,
            company_id,
            Some(company_id),
            &data,
        )
        .await?;
        tracing::info!("Employment settings saved for {}", company_id);

        Ok(settings)
    }
}

/// 保存日時を設定する。作成日時は初回保存時のものを引き継ぐ。
pub fn stamp_company(
    company: &mut CompanyInfo,
    stored_created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) {
    company.created_at = Some(stored_created_at.unwrap_or(now));
    company.updated_at = Some(now);
}

/// 既存の会社番号 (COMP + 4 桁) の最大値 + 1 を採番する
pub fn next_company_number<'a, I>(existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = existing
        .into_iter()
        .filter_map(parse_company_number)
        .max()
        .unwrap_or(0);
    format!("{}{:04}", COMPANY_NUMBER_PREFIX, max + 1)
}

fn parse_company_number(value: &str) -> Option<u32> {
    let digits = value.strip_prefix(COMPANY_NUMBER_PREFIX)?;
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// 部門追加の入力チェック (必須・会社内でのコード重複)
pub fn validate_new_department(
    new: NewDepartment,
    existing: &[Department],
) -> AppResult<NewDepartment> {
    let code = new.code.trim();
    let name = new.name.trim();
    if code.is_empty() || name.is_empty() {
        return Err(AppError::Validation("部門コードと部門名を入力してください。".into()));
    }
    if existing.iter().any(|dept| dept.code == code) {
        return Err(AppError::Conflict("この部門コードは既に使用されています。".into()));
    }

    Ok(NewDepartment {
        code: code.to_string(),
        name: name.to_string(),
    })
}
