//! JSONB ドキュメントストアへのアクセス

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::time::Duration;

/// コレクション名
pub mod collections {
    pub const COMPANIES: &str = "companies";
    pub const DEPARTMENTS: &str = "departments";
    pub const EMPLOYMENT_SETTINGS: &str = "companyEmploymentSettings";
    pub const CONTRACTS: &str = "contracts";
    pub const EMPLOYEES: &str = "employees";
    pub const CSV_MAPPINGS: &str = "csvMappings";
}

const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// documents テーブルの 1 行
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub company_id: Option<String>,
    pub data: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    /// JSON 本体を型に変換
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.0.clone())
    }
}

/// ID でドキュメントを取得
pub async fn get_document(
    pool: &PgPool,
    collection: &str,
    id: &str,
) -> Result<Option<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, company_id, data, created_at, updated_at
        FROM documents
        WHERE collection = $1 AND id = $2
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// 会社単位でドキュメントを取得 (作成順)
pub async fn list_by_company(
    pool: &PgPool,
    collection: &str,
    company_id: &str,
) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, company_id, data, created_at, updated_at
        FROM documents
        WHERE collection = $1 AND company_id = $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(collection)
    .bind(company_id)
    .fetch_all(pool)
    .await
}

/// 会社単位でドキュメントを取得 (新しい順)
pub async fn list_by_company_newest_first(
    pool: &PgPool,
    collection: &str,
    company_id: &str,
) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, company_id, data, created_at, updated_at
        FROM documents
        WHERE collection = $1 AND company_id = $2
        ORDER BY COALESCE((data->>'createdAt')::timestamptz, created_at) DESC
        "#,
    )
    .bind(collection)
    .bind(company_id)
    .fetch_all(pool)
    .await
}

/// コレクション全体から指定フィールドの文字列値を集める
pub async fn list_field_values(
    pool: &PgPool,
    collection: &str,
    field: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT data->>$2
        FROM documents
        WHERE collection = $1 AND data->>$2 IS NOT NULL
        "#,
    )
    .bind(collection)
    .bind(field)
    .fetch_all(pool)
    .await
}

/// マージ保存: 既存ドキュメントがあれば JSON をトップレベルでマージする
pub async fn upsert_document(
    pool: &PgPool,
    collection: &str,
    id: &str,
    company_id: Option<&str>,
    data: &Value,
) -> Result<(), sqlx::Error> {
    let query = sqlx::query(
        r#"
        INSERT INTO documents (collection, id, company_id, data, created_at, updated_at)
        VALUES ($1, $2, $3, $4, now(), now())
        ON CONFLICT (collection, id) DO UPDATE
        SET data = documents.data || EXCLUDED.data,
            company_id = COALESCE(EXCLUDED.company_id, documents.company_id),
            updated_at = now()
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(company_id)
    .bind(Json(data));

    let start = std::time::Instant::now();
    match tokio::time::timeout(WRITE_TIMEOUT, query.execute(pool)).await {
        Ok(Ok(result)) => {
            tracing::debug!(
                "upsert {}/{} affected {} rows in {:?}",
                collection,
                id,
                result.rows_affected(),
                start.elapsed()
            );
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!("upsert {}/{} failed after {:?}: {:?}", collection, id, start.elapsed(), e);
            Err(e)
        }
        Err(_) => {
            tracing::error!("upsert {}/{} timed out (>{:?})", collection, id, WRITE_TIMEOUT);
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

/// 新規ドキュメントを追加し、採番された ID を返す
pub async fn insert_document(
    pool: &PgPool,
    collection: &str,
    company_id: &str,
    data: &Value,
) -> Result<String, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO documents (collection, id, company_id, data, created_at, updated_at)
        VALUES ($1, gen_random_uuid()::text, $2, $3, now(), now())
        RETURNING id
        "#,
    )
    .bind(collection)
    .bind(company_id)
    .bind(Json(data))
    .fetch_one(pool)
    .await
}

/// 会社に属するドキュメントを削除し、削除件数を返す
pub async fn delete_document(
    pool: &PgPool,
    collection: &str,
    id: &str,
    company_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM documents
        WHERE collection = $1 AND id = $2 AND company_id = $3
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(company_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
