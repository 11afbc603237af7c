use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// CSV マッピング項目 (記号・項目名・列位置)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingItem {
    /// 外部システムの記号 (保存形式では `headerName`)
    #[serde(rename = "headerName", alias = "headerSymbol", default)]
    pub header_symbol: String,
    #[serde(default)]
    pub item_name: String,
    /// 列位置がない・負数・数値以外の項目は列位置による照合の対象外
    #[serde(
        default,
        deserialize_with = "lenient_column_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub column_index: Option<usize>,
}

impl MappingItem {
    pub fn new(header_symbol: impl Into<String>, item_name: impl Into<String>, column_index: usize) -> Self {
        Self {
            header_symbol: header_symbol.into(),
            item_name: item_name.into(),
            column_index: Some(column_index),
        }
    }
}

fn lenient_column_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_i64)
        .and_then(|idx| usize::try_from(idx).ok()))
}

/// 基本項目 (6 種類、表示順固定)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MainField {
    IdentificationCode,
    EmployeeCode,
    EmployeeName,
    TotalSalary,
    TotalDeductions,
    NetSalary,
}

impl MainField {
    pub const ALL: [MainField; 6] = [
        MainField::IdentificationCode,
        MainField::EmployeeCode,
        MainField::EmployeeName,
        MainField::TotalSalary,
        MainField::TotalDeductions,
        MainField::NetSalary,
    ];

    /// 保存形式・URL で使うキー
    pub fn key(self) -> &'static str {
        match self {
            MainField::IdentificationCode => "identificationCode",
            MainField::EmployeeCode => "employeeCode",
            MainField::EmployeeName => "employeeName",
            MainField::TotalSalary => "totalSalary",
            MainField::TotalDeductions => "totalDeductions",
            MainField::NetSalary => "netSalary",
        }
    }

    /// 画面表示ラベル
    pub fn label(self) -> &'static str {
        match self {
            MainField::IdentificationCode => "識別コード",
            MainField::EmployeeCode => "従業員コード",
            MainField::EmployeeName => "従業員氏名",
            MainField::TotalSalary => "支給額",
            MainField::TotalDeductions => "控除額",
            MainField::NetSalary => "差引支給額",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MainField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMainField(pub String);

impl fmt::Display for UnknownMainField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown main field: {}", self.0)
    }
}

impl std::error::Error for UnknownMainField {}

impl FromStr for MainField {
    type Err = UnknownMainField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MainField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| UnknownMainField(s.to_string()))
    }
}

/// 記号の命名規則 (プレフィックス判定)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolConvention {
    prefix: String,
}

impl SymbolConvention {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_canonical(&self, value: &str) -> bool {
        !value.is_empty() && value.starts_with(&self.prefix)
    }
}

impl Default for SymbolConvention {
    fn default() -> Self {
        Self::new("KY")
    }
}

/// 保存されている基本項目の割り当て (旧データは headerName に項目名が入っている)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMainField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
}

/// 基本項目の割り当て
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MainFieldAssignment {
    #[default]
    Unset,
    /// 記号が直接保存されている
    Symbol(String),
    /// 記号導入前のデータ: 表示文字列と列位置のみ
    LegacyDisplay {
        value: String,
        column_index: Option<usize>,
    },
}

impl MainFieldAssignment {
    /// 保存形式から割り当てを判別する。
    ///
    /// プレフィックスに一致する値、または項目一覧に存在する記号と一致する値は記号として扱う。
    /// それ以外は列位置で照合する旧データとみなす。
    pub fn classify<'a, I>(
        stored: Option<&StoredMainField>,
        convention: &SymbolConvention,
        items: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a MappingItem>,
    {
        let Some(stored) = stored else {
            return MainFieldAssignment::Unset;
        };

        let value = stored.header_name.as_deref().unwrap_or_default();
        if !value.is_empty()
            && (convention.is_canonical(value)
                || items.into_iter().any(|item| item.header_symbol == value))
        {
            return MainFieldAssignment::Symbol(value.to_string());
        }

        let column_index = stored
            .column_index
            .and_then(|idx| usize::try_from(idx).ok());

        if value.is_empty() && column_index.is_none() {
            return MainFieldAssignment::Unset;
        }

        MainFieldAssignment::LegacyDisplay {
            value: value.to_string(),
            column_index,
        }
    }

    /// 保存形式へ戻す。記号は最初に一致した項目の列位置と項目名を添えて保存する。
    pub fn to_stored<'a, I>(&self, items: I) -> Option<StoredMainField>
    where
        I: IntoIterator<Item = &'a MappingItem>,
    {
        match self {
            MainFieldAssignment::Unset => None,
            MainFieldAssignment::Symbol(symbol) => {
                let matched = items.into_iter().find(|item| &item.header_symbol == symbol);
                Some(StoredMainField {
                    header_name: Some(symbol.clone()),
                    column_index: matched
                        .and_then(|item| item.column_index)
                        .map(|idx| idx as i64),
                    item_name: matched.map(|item| item.item_name.clone()),
                })
            }
            MainFieldAssignment::LegacyDisplay {
                value,
                column_index,
            } => Some(StoredMainField {
                header_name: (!value.is_empty()).then(|| value.clone()),
                column_index: column_index.map(|idx| idx as i64),
                item_name: None,
            }),
        }
    }
}

/// `csvMappings` ドキュメントの保存形式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingDocument {
    pub income_items: Vec<MappingItem>,
    pub deduction_items: Vec<MappingItem>,
    pub attendance_items: Vec<MappingItem>,
    pub item_code_items: Vec<MappingItem>,
    pub ky_items: Vec<MappingItem>,
    pub main_fields: StoredMainFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredMainFields {
    pub identification_code: Option<StoredMainField>,
    pub employee_code: Option<StoredMainField>,
    pub employee_name: Option<StoredMainField>,
    pub total_salary: Option<StoredMainField>,
    pub total_deductions: Option<StoredMainField>,
    pub net_salary: Option<StoredMainField>,
}

impl StoredMainFields {
    pub fn get(&self, field: MainField) -> Option<&StoredMainField> {
        match field {
            MainField::IdentificationCode => self.identification_code.as_ref(),
            MainField::EmployeeCode => self.employee_code.as_ref(),
            MainField::EmployeeName => self.employee_name.as_ref(),
            MainField::TotalSalary => self.total_salary.as_ref(),
            MainField::TotalDeductions => self.total_deductions.as_ref(),
            MainField::NetSalary => self.net_salary.as_ref(),
        }
    }

    pub fn set(&mut self, field: MainField, value: Option<StoredMainField>) {
        let slot = match field {
            MainField::IdentificationCode => &mut self.identification_code,
            MainField::EmployeeCode => &mut self.employee_code,
            MainField::EmployeeName => &mut self.employee_name,
            MainField::TotalSalary => &mut self.total_salary,
            MainField::TotalDeductions => &mut self.total_deductions,
            MainField::NetSalary => &mut self.net_salary,
        };
        *slot = value;
    }
}

/// 編集セッションが保持するマッピング設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingConfiguration {
    pub income_items: Vec<MappingItem>,
    pub deduction_items: Vec<MappingItem>,
    pub attendance_items: Vec<MappingItem>,
    pub item_code_items: Vec<MappingItem>,
    pub ky_items: Vec<MappingItem>,
    main_fields: [MainFieldAssignment; 6],
}

impl MappingConfiguration {
    pub fn from_document(doc: MappingDocument, convention: &SymbolConvention) -> Self {
        let mut config = Self {
            income_items: doc.income_items,
            deduction_items: doc.deduction_items,
            attendance_items: doc.attendance_items,
            item_code_items: doc.item_code_items,
            ky_items: doc.ky_items,
            main_fields: Default::default(),
        };

        for field in MainField::ALL {
            let assignment = MainFieldAssignment::classify(
                doc.main_fields.get(field),
                convention,
                config.all_items(),
            );
            config.main_fields[field.index()] = assignment;
        }

        config
    }

    pub fn to_document(&self) -> MappingDocument {
        let mut main_fields = StoredMainFields::default();
        for field in MainField::ALL {
            main_fields.set(field, self.assignment(field).to_stored(self.all_items()));
        }

        MappingDocument {
            income_items: self.income_items.clone(),
            deduction_items: self.deduction_items.clone(),
            attendance_items: self.attendance_items.clone(),
            item_code_items: self.item_code_items.clone(),
            ky_items: self.ky_items.clone(),
            main_fields,
        }
    }

    /// 支給 → 控除 → 勤怠 → 項目コード → KY の順で全項目を返す
    pub fn all_items(&self) -> impl Iterator<Item = &MappingItem> + Clone {
        self.income_items
            .iter()
            .chain(&self.deduction_items)
            .chain(&self.attendance_items)
            .chain(&self.item_code_items)
            .chain(&self.ky_items)
    }

    pub fn assignment(&self, field: MainField) -> &MainFieldAssignment {
        &self.main_fields[field.index()]
    }

    pub fn set_assignment(&mut self, field: MainField, assignment: MainFieldAssignment) {
        self.main_fields[field.index()] = assignment;
    }

    /// 画面で選択された記号を基本項目に反映する (空文字は未選択)
    pub fn update_main_field_mapping(&mut self, field: MainField, selected_symbol: &str) {
        let assignment = if selected_symbol.is_empty() {
            MainFieldAssignment::Unset
        } else {
            MainFieldAssignment::Symbol(selected_symbol.to_string())
        };
        self.set_assignment(field, assignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items() -> Vec<MappingItem> {
        vec![
            MappingItem::new("KY01", "基本給", 2),
            MappingItem::new("SK05", "通勤手当", 4),
        ]
    }

    #[test]
    fn main_field_parses_from_key() {
        assert_eq!("netSalary".parse::<MainField>(), Ok(MainField::NetSalary));
        assert!("salary".parse::<MainField>().is_err());
        for field in MainField::ALL {
            assert_eq!(field.key().parse::<MainField>(), Ok(field));
        }
    }

    #[test]
    fn item_reads_header_name_or_header_symbol() {
        let a: MappingItem =
            serde_json::from_value(json!({"headerName": "KY01", "itemName": "基本給", "columnIndex": 2}))
                .unwrap();
        let b: MappingItem =
            serde_json::from_value(json!({"headerSymbol": "KY01", "itemName": "基本給", "columnIndex": 2}))
                .unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(&a).unwrap()["headerName"], "KY01");
    }

    #[test]
    fn item_with_missing_or_negative_column_still_loads() {
        let doc: MappingDocument = serde_json::from_value(json!({
            "incomeItems": [
                {"headerName": "KY01", "itemName": "基本給"},
                {"headerName": "KY02", "itemName": "残業代", "columnIndex": -1},
                {"headerName": "KY03", "itemName": "通勤手当", "columnIndex": "x"},
                {"headerName": "KY04", "itemName": "家族手当", "columnIndex": null},
                {"headerName": "KY05", "itemName": "住宅手当", "columnIndex": 5}
            ]
        }))
        .unwrap();

        let columns: Vec<Option<usize>> =
            doc.income_items.iter().map(|item| item.column_index).collect();
        assert_eq!(columns, [None, None, None, None, Some(5)]);

        let saved = serde_json::to_value(&doc.income_items[0]).unwrap();
        assert!(saved.get("columnIndex").is_none());
    }

    #[test]
    fn classify_prefixed_value_as_symbol_regardless_of_column() {
        let stored = StoredMainField {
            header_name: Some("KY99".into()),
            column_index: Some(2),
            item_name: None,
        };
        let assignment =
            MainFieldAssignment::classify(Some(&stored), &SymbolConvention::default(), &items());
        assert_eq!(assignment, MainFieldAssignment::Symbol("KY99".into()));
    }

    #[test]
    fn classify_known_unprefixed_symbol_as_symbol() {
        let stored = StoredMainField {
            header_name: Some("SK05".into()),
            column_index: Some(2),
            item_name: None,
        };
        let assignment =
            MainFieldAssignment::classify(Some(&stored), &SymbolConvention::default(), &items());
        assert_eq!(assignment, MainFieldAssignment::Symbol("SK05".into()));
    }

    #[test]
    fn classify_display_text_as_legacy() {
        let stored = StoredMainField {
            header_name: Some("基本給".into()),
            column_index: Some(2),
            item_name: None,
        };
        let assignment =
            MainFieldAssignment::classify(Some(&stored), &SymbolConvention::default(), &items());
        assert_eq!(
            assignment,
            MainFieldAssignment::LegacyDisplay {
                value: "基本給".into(),
                column_index: Some(2)
            }
        );
    }

    #[test]
    fn classify_negative_column_drops_index() {
        let stored = StoredMainField {
            header_name: Some("氏名".into()),
            column_index: Some(-1),
            item_name: None,
        };
        let assignment =
            MainFieldAssignment::classify(Some(&stored), &SymbolConvention::default(), &items());
        assert_eq!(
            assignment,
            MainFieldAssignment::LegacyDisplay {
                value: "氏名".into(),
                column_index: None
            }
        );

        let empty = StoredMainField::default();
        assert_eq!(
            MainFieldAssignment::classify(Some(&empty), &SymbolConvention::default(), &items()),
            MainFieldAssignment::Unset
        );
        assert_eq!(
            MainFieldAssignment::classify(None, &SymbolConvention::default(), &items()),
            MainFieldAssignment::Unset
        );
    }

    #[test]
    fn custom_prefix_changes_classification() {
        let stored = StoredMainField {
            header_name: Some("PY10".into()),
            column_index: None,
            item_name: None,
        };
        let assignment =
            MainFieldAssignment::classify(Some(&stored), &SymbolConvention::new("PY"), &items());
        assert_eq!(assignment, MainFieldAssignment::Symbol("PY10".into()));
    }

    #[test]
    fn document_loads_and_saves_main_fields() {
        let doc: MappingDocument = serde_json::from_value(json!({
            "incomeItems": [{"headerName": "KY01", "itemName": "基本給", "columnIndex": 2}],
            "kyItems": [{"headerName": "KY02", "itemName": "残業代", "columnIndex": 3}],
            "mainFields": {
                "totalSalary": {"headerName": "基本給", "columnIndex": 2},
                "netSalary": {"headerName": "KY02", "columnIndex": 3},
                "employeeName": null
            },
            "parsedHeaders": ["ignored"]
        }))
        .unwrap();

        let mut config = MappingConfiguration::from_document(doc, &SymbolConvention::default());
        assert_eq!(
            config.assignment(MainField::NetSalary),
            &MainFieldAssignment::Symbol("KY02".into())
        );
        assert!(matches!(
            config.assignment(MainField::TotalSalary),
            MainFieldAssignment::LegacyDisplay { .. }
        ));
        assert_eq!(config.assignment(MainField::EmployeeName), &MainFieldAssignment::Unset);

        config.update_main_field_mapping(MainField::EmployeeCode, "KY01");
        config.update_main_field_mapping(MainField::NetSalary, "");

        let saved = config.to_document();
        let employee_code = saved.main_fields.employee_code.unwrap();
        assert_eq!(employee_code.header_name.as_deref(), Some("KY01"));
        assert_eq!(employee_code.column_index, Some(2));
        assert_eq!(employee_code.item_name.as_deref(), Some("基本給"));
        assert!(saved.main_fields.net_salary.is_none());
        assert_eq!(
            saved.main_fields.total_salary.unwrap().header_name.as_deref(),
            Some("基本給")
        );
    }

    #[test]
    fn all_items_follow_category_order() {
        let config = MappingConfiguration {
            income_items: vec![MappingItem::new("KY01", "a", 0)],
            deduction_items: vec![MappingItem::new("KY02", "b", 1)],
            attendance_items: vec![MappingItem::new("KY03", "c", 2)],
            item_code_items: vec![MappingItem::new("KY04", "d", 3)],
            ky_items: vec![MappingItem::new("KY05", "e", 4)],
            ..Default::default()
        };
        let symbols: Vec<&str> = config.all_items().map(|i| i.header_symbol.as_str()).collect();
        assert_eq!(symbols, ["KY01", "KY02", "KY03", "KY04", "KY05"]);
    }
}
