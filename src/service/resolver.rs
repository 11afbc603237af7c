//! 記号リゾルバ: 基本項目の割り当てと選択肢の表示ラベルを解決する。
//!
//! すべて純粋関数で、不正な入力でもエラーにはせず空文字や記号そのものを返す。
//! 項目一覧は 支給 → 控除 → 勤怠 → 項目コード → KY の順で渡すこと
//! ([`MappingConfiguration::all_items`](crate::models::MappingConfiguration::all_items))。

use crate::models::{MainFieldAssignment, MappingItem};
use indexmap::IndexMap;
use serde::Serialize;

/// 選択肢に並べる記号 (空白のみの記号は除外、順序・重複はそのまま)
pub fn build_selectable_symbols<'a, I>(items: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a MappingItem>,
{
    items
        .into_iter()
        .map(|item| item.header_symbol.as_str())
        .filter(|symbol| !symbol.trim().is_empty())
        .collect()
}

/// 基本項目に割り当てられている記号を返す。解決できなければ空文字。
pub fn resolve_assigned_symbol<'a, I>(assignment: &MainFieldAssignment, items: I) -> String
where
    I: IntoIterator<Item = &'a MappingItem>,
{
    match assignment {
        MainFieldAssignment::Unset => String::new(),
        MainFieldAssignment::Symbol(symbol) => symbol.clone(),
        MainFieldAssignment::LegacyDisplay {
            column_index: Some(column_index),
            ..
        } => items
            .into_iter()
            .find(|item| item.column_index == Some(*column_index))
            .map(|item| item.header_symbol.clone())
            .unwrap_or_default(),
        MainFieldAssignment::LegacyDisplay {
            column_index: None, ..
        } => String::new(),
    }
}

/// 記号の表示用項目名。未知の記号は記号そのものを返す。
pub fn resolve_display_label<'a, I>(symbol: &str, items: I) -> String
where
    I: IntoIterator<Item = &'a MappingItem>,
{
    if symbol.is_empty() {
        return String::new();
    }

    items
        .into_iter()
        .find(|item| item.header_symbol == symbol)
        .map(|item| item.item_name.clone())
        .unwrap_or_else(|| symbol.to_string())
}

/// 重複している記号・列位置 (先勝ちで解決されるもの)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub header_symbols: Vec<String>,
    pub column_indices: Vec<usize>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.header_symbols.is_empty() && self.column_indices.is_empty()
    }
}

pub fn find_duplicates<'a, I>(items: I) -> DuplicateReport
where
    I: IntoIterator<Item = &'a MappingItem>,
{
    let mut symbols: IndexMap<&str, usize> = IndexMap::new();
    let mut columns: IndexMap<usize, usize> = IndexMap::new();

    for item in items {
        if !item.header_symbol.trim().is_empty() {
            *symbols.entry(item.header_symbol.as_str()).or_insert(0) += 1;
        }
        if let Some(column) = item.column_index {
            *columns.entry(column).or_insert(0) += 1;
        }
    }

    DuplicateReport {
        header_symbols: symbols
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(symbol, _)| symbol.to_string())
            .collect(),
        column_indices: columns
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(column, _)| column)
            .collect(),
    }
}
