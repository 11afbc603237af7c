use crate::db::{self, collections};
use crate::error::{AppError, AppResult};
use crate::models::{MainField, MappingConfiguration, MappingDocument, SymbolConvention};
use crate::service::resolver::{self, DuplicateReport};
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::Serialize;
use sqlx::PgPool;

/// 記号の選択肢
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolOption {
    pub symbol: String,
    pub label: String,
    /// "記号 - 項目名"
    pub display: String,
}

/// 基本項目 1 つ分の選択状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSelection {
    pub label: &'static str,
    /// 解決済みの記号 (未選択は空文字)
    pub selected: String,
    pub selected_label: String,
}

/// 基本項目マッピング画面の表示内容
#[derive(Debug, Clone, Serialize)]
pub struct MainFieldsView {
    pub options: Vec<SymbolOption>,
    pub fields: IndexMap<MainField, FieldSelection>,
    pub duplicates: DuplicateReport,
}

impl MainFieldsView {
    pub fn build(config: &MappingConfiguration) -> Self {
        let items = config.all_items();

        let options = resolver::build_selectable_symbols(items.clone())
            .into_iter()
            .map(|symbol| {
                let label = resolver::resolve_display_label(symbol, items.clone());
                SymbolOption {
                    display: format!("{} - {}", symbol, label),
                    symbol: symbol.to_string(),
                    label,
                }
            })
            .collect();

        let fields = MainField::ALL
            .into_iter()
            .map(|field| {
                let selected =
                    resolver::resolve_assigned_symbol(config.assignment(field), items.clone());
                let selected_label = resolver::resolve_display_label(&selected, items.clone());
                let selection = FieldSelection {
                    label: field.label(),
                    selected,
                    selected_label,
                };
                (field, selection)
            })
            .collect();

        Self {
            options,
            fields,
            duplicates: resolver::find_duplicates(items),
        }
    }
}

/// 会社ごとの編集中マッピング設定
#[derive(Debug, Default)]
pub struct MappingSessions {
    sessions: DashMap<String, MappingConfiguration>,
}

impl MappingSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, company_id: &str, config: MappingConfiguration) -> MainFieldsView {
        let view = MainFieldsView::build(&config);
        self.sessions.insert(company_id.to_string(), config);
        view
    }

    pub fn view(&self, company_id: &str) -> Option<MainFieldsView> {
        self.sessions
            .get(company_id)
            .map(|config| MainFieldsView::build(&config))
    }

    /// 選択された記号を反映し、更新後の表示内容を返す
    pub fn update_main_field_mapping(
        &self,
        company_id: &str,
        field: MainField,
        selected_symbol: &str,
    ) -> Option<MainFieldsView> {
        let mut config = self.sessions.get_mut(company_id)?;
        config.update_main_field_mapping(field, selected_symbol);
        Some(MainFieldsView::build(&config))
    }

    pub fn snapshot(&self, company_id: &str) -> Option<MappingConfiguration> {
        self.sessions.get(company_id).map(|config| config.clone())
    }

    /// セッションを取り出す。保存中の更新は 404 になり、取りこぼされない。
    pub fn take(&self, company_id: &str) -> Option<MappingConfiguration> {
        self.sessions.remove(company_id).map(|(_, config)| config)
    }

    /// 保存失敗時に取り出したセッションを戻す。その間に開かれたセッションは上書きしない。
    pub fn restore(&self, company_id: &str, config: MappingConfiguration) {
        self.sessions.entry(company_id.to_string()).or_insert(config);
    }

    pub fn close(&self, company_id: &str) -> bool {
        self.sessions.remove(company_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn no_session() -> AppError {
    AppError::NotFound("編集中のマッピング設定がありません".into())
}

/// CSV マッピング編集サービス
pub struct MappingService {
    pool: PgPool,
    sessions: MappingSessions,
    convention: SymbolConvention,
}

impl MappingService {
    pub fn new(pool: PgPool, convention: SymbolConvention) -> Self {
        Self {
            pool,
            sessions: MappingSessions::new(),
            convention,
        }
    }

    /// 保存済み設定を読み込んで編集セッションを開始
    pub async fn open_session(&self, company_id: &str) -> AppResult<MainFieldsView> {
        let doc = match db::get_document(&self.pool, collections::CSV_MAPPINGS, company_id).await? {
            Some(row) => row.decode::<MappingDocument>()?,
            None => {
                tracing::info!("No CSV mapping for {}, starting empty", company_id);
                MappingDocument::default()
            }
        };

        let config = MappingConfiguration::from_document(doc, &self.convention);
        let view = self.sessions.open(company_id, config);

        if !view.duplicates.is_empty() {
            tracing::warn!(
                "CSV mapping for {} has duplicates (first match wins): symbols {:?}, columns {:?}",
                company_id,
                view.duplicates.header_symbols,
                view.duplicates.column_indices
            );
        }
        let unresolved: Vec<&str> = view
            .fields
            .iter()
            .filter(|(_, selection)| selection.selected.is_empty())
            .map(|(field, _)| field.key())
            .collect();
        if !unresolved.is_empty() {
            tracing::warn!("CSV mapping for {}: unmapped main fields {:?}", company_id, unresolved);
        }

        tracing::info!(
            "CSV mapping session opened for {} ({} selectable symbols)",
            company_id,
            view.options.len()
        );
        Ok(view)
    }

    pub fn main_fields(&self, company_id: &str) -> AppResult<MainFieldsView> {
        self.sessions.view(company_id).ok_or_else(no_session)
    }

    pub fn update_main_field_mapping(
        &self,
        company_id: &str,
        field: MainField,
        selected_symbol: &str,
    ) -> AppResult<MainFieldsView> {
        let view = self
            .sessions
            .update_main_field_mapping(company_id, field, selected_symbol)
            .ok_or_else(no_session)?;
        tracing::info!("CSV mapping for {}: {} -> {:?}", company_id, field, selected_symbol);
        Ok(view)
    }

    /// 設定全体を保存してセッションを閉じる
    pub async fn save(&self, company_id: &str) -> AppResult<MainFieldsView> {
        let config = self.sessions.take(company_id).ok_or_else(no_session)?;

        let saved = match serde_json::to_value(config.to_document()) {
            Ok(data) => {
                db::upsert_document(
                    &self.pool,
                    collections::CSV_MAPPINGS,
                    company_id,
                    Some(company_id),
                    &data,
                )
                .await
                .map_err(AppError::from)
            }
            Err(e) => Err(AppError::from(e)),
        };

        if let Err(e) = saved {
            self.sessions.restore(company_id, config);
            tracing::warn!("CSV mapping save failed for {}, session kept", company_id);
            return Err(e);
        }

        tracing::info!("CSV mapping saved for {}", company_id);
        Ok(MainFieldsView::build(&config))
    }

    pub fn discard(&self, company_id: &str) -> AppResult<()> {
        if !self.sessions.close(company_id) {
            return Err(no_session());
        }
        tracing::info!("CSV mapping session discarded for {}", company_id);
        Ok(())
    }
}
