//! Search configuration schema / 搜索配置 Schema
//!
//! Recognized fields, their types and the projections pushed downstream.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::search_engine::{IndexField, IndexSchema};

/// Upper bound for `per_page` / 每页最大条数
pub const MAX_PER_PAGE: i64 = 250;
/// Upper bound for `num_typos` / 最大容错字符数
pub const MAX_TYPOS: i64 = 2;

/// Recognized configuration fields / 已识别的配置字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    Page,
    PerPage,
    NumTypos,
    SearchStrategy,
    QueryBy,
    DefaultSortingField,
    TokenSeparators,
    SymbolsToIndex,
    Stopwords,
    Synonyms,
    DefaultStopwordsSet,
}

impl ConfigField {
    pub const ALL: [ConfigField; 11] = [
        ConfigField::Page,
        ConfigField::PerPage,
        ConfigField::NumTypos,
        ConfigField::SearchStrategy,
        ConfigField::QueryBy,
        ConfigField::DefaultSortingField,
        ConfigField::TokenSeparators,
        ConfigField::SymbolsToIndex,
        ConfigField::Stopwords,
        ConfigField::Synonyms,
        ConfigField::DefaultStopwordsSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::Page => "page",
            ConfigField::PerPage => "per_page",
            ConfigField::NumTypos => "num_typos",
            ConfigField::SearchStrategy => "search_strategy",
            ConfigField::QueryBy => "query_by",
            ConfigField::DefaultSortingField => "default_sorting_field",
            ConfigField::TokenSeparators => "token_separators",
            ConfigField::SymbolsToIndex => "symbols_to_index",
            ConfigField::Stopwords => "stopwords",
            ConfigField::Synonyms => "synonyms",
            ConfigField::DefaultStopwordsSet => "default_stopwords_set",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ConfigField::Page | ConfigField::PerPage | ConfigField::NumTypos => FieldKind::Integer,
            ConfigField::SearchStrategy => FieldKind::Enum,
            ConfigField::DefaultSortingField | ConfigField::DefaultStopwordsSet => FieldKind::String,
            ConfigField::QueryBy
            | ConfigField::TokenSeparators
            | ConfigField::SymbolsToIndex
            | ConfigField::Stopwords => FieldKind::StringList,
            ConfigField::Synonyms => FieldKind::SynonymList,
        }
    }

    /// Fields pushed to the index schema / 需要同步到索引 Schema 的字段
    pub fn is_schema_field(&self) -> bool {
        matches!(
            self,
            ConfigField::DefaultSortingField | ConfigField::TokenSeparators | ConfigField::SymbolsToIndex
        )
    }

    /// Fields pushed as stopwords/synonyms / 停用词与同义词字段
    pub fn is_lexical_field(&self) -> bool {
        matches!(
            self,
            ConfigField::Stopwords | ConfigField::Synonyms | ConfigField::DefaultStopwordsSet
        )
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Enum,
    String,
    StringList,
    SynonymList,
}

/// Field descriptor exposed to admin clients / 字段描述
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub help: &'static str,
}

fn field_help(field: ConfigField) -> &'static str {
    match field {
        ConfigField::Page => "Default page, at least 1",
        ConfigField::PerPage => "Results per page, 1 to 250",
        ConfigField::NumTypos => "Typo tolerance",
        ConfigField::SearchStrategy => "Search strategy",
        ConfigField::QueryBy => "Ordered list of fields to query, required before querying",
        ConfigField::DefaultSortingField => "Default sort field",
        ConfigField::TokenSeparators => "Extra characters treated as token separators",
        ConfigField::SymbolsToIndex => "Symbols kept in the index",
        ConfigField::Stopwords => "Words ignored at query time",
        ConfigField::Synonyms => "Synonym rules, optional root plus terms",
        ConfigField::DefaultStopwordsSet => "Named stopwords set applied by default",
    }
}

fn fixed_options(field: ConfigField) -> Vec<String> {
    let options: &[&str] = match field {
        ConfigField::NumTypos => &["0", "1", "2"],
        ConfigField::SearchStrategy => &SearchStrategy::SUPPORTED,
        _ => &[],
    };
    options.iter().map(|o| o.to_string()).collect()
}

/// Describe every recognized field / 列出所有字段定义
pub fn field_specs() -> Vec<FieldSpec> {
    ConfigField::ALL
        .iter()
        .map(|field| FieldSpec {
            name: field.as_str(),
            kind: field.kind(),
            options: fixed_options(*field),
            help: field_help(*field),
        })
        .collect()
}

/// Field descriptors narrowed to one index / 按索引字段生成可选项
///
/// `query_by` offers the text fields of the index, `default_sorting_field` its numeric ones.
pub fn field_specs_for_index(schema: &IndexSchema) -> Vec<FieldSpec> {
    let names = |keep: fn(&IndexField) -> bool| -> Vec<String> {
        schema.fields.iter().filter(|f| keep(f)).map(|f| f.name.clone()).collect()
    };
    let text = names(IndexField::is_text);
    let numeric = names(IndexField::is_numeric);

    field_specs()
        .into_iter()
        .zip(ConfigField::ALL)
        .map(|(mut spec, field)| {
            match field {
                ConfigField::QueryBy => spec.options = text.clone(),
                ConfigField::DefaultSortingField => spec.options = numeric.clone(),
                _ => {}
            }
            spec
        })
        .collect()
}

/// Search strategy / 搜索策略
///
/// Unknown values are kept as `Other` so the validator can report them by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchStrategy {
    Text,
    Vector,
    Hybrid,
    Other(String),
}

impl SearchStrategy {
    pub const SUPPORTED: [&'static str; 3] = ["text", "vector", "hybrid"];

    pub fn as_str(&self) -> &str {
        match self {
            SearchStrategy::Text => "text",
            SearchStrategy::Vector => "vector",
            SearchStrategy::Hybrid => "hybrid",
            SearchStrategy::Other(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, SearchStrategy::Other(_))
    }
}

impl From<String> for SearchStrategy {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "text" => SearchStrategy::Text,
            "vector" => SearchStrategy::Vector,
            "hybrid" => SearchStrategy::Hybrid,
            _ => SearchStrategy::Other(raw),
        }
    }
}

impl From<SearchStrategy> for String {
    fn from(strategy: SearchStrategy) -> Self {
        match strategy {
            SearchStrategy::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// One synonym rule: multi-way when `root` is absent / 同义词规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub synonyms: Vec<String>,
}

/// Resolved search configuration of one store / 店铺当前生效的搜索配置
///
/// `query_by` may be empty while a store is still being configured; it must be
/// non-empty before the config is used for querying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectiveConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_typos: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_strategy: Option<SearchStrategy>,
    pub query_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sorting_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_separators: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_to_index: Option<Vec<String>>,
    pub stopwords: Vec<String>,
    pub synonyms: Vec<SynonymRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_stopwords_set: Option<String>,
}

impl EffectiveConfig {
    pub fn is_queryable(&self) -> bool {
        !self.query_by.is_empty()
    }

    /// Default sort set, or a non-empty symbols/separators list / 是否包含 Schema 级字段
    pub fn has_schema_fields(&self) -> bool {
        self.default_sorting_field.is_some()
            || self.token_separators.as_ref().is_some_and(|v| !v.is_empty())
            || self.symbols_to_index.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Stopwords or synonyms present, or a default stopwords set referenced / 是否包含词表字段
    pub fn has_lexical_fields(&self) -> bool {
        !self.stopwords.is_empty() || !self.synonyms.is_empty() || self.default_stopwords_set.is_some()
    }

    pub fn schema_fields(&self) -> SchemaFields {
        SchemaFields {
            default_sorting_field: self.default_sorting_field.clone(),
            token_separators: self.token_separators.clone(),
            symbols_to_index: self.symbols_to_index.clone(),
        }
    }

    pub fn lexical(&self) -> StopwordsSynonymsConfig {
        StopwordsSynonymsConfig {
            stopwords: self.stopwords.clone(),
            synonyms: self.synonyms.clone(),
            default_stopwords_set: self.default_stopwords_set.clone(),
        }
    }
}

/// Sparse update: `None` means "leave untouched" / 部分更新
///
/// For the optional string fields an empty string is a present value that clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfigUpdate {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub num_typos: Option<i64>,
    pub search_strategy: Option<SearchStrategy>,
    pub query_by: Option<Vec<String>>,
    pub default_sorting_field: Option<String>,
    pub token_separators: Option<Vec<String>>,
    pub symbols_to_index: Option<Vec<String>>,
    pub stopwords: Option<Vec<String>>,
    pub synonyms: Option<Vec<SynonymRule>>,
    pub default_stopwords_set: Option<String>,
}

impl PartialConfigUpdate {
    /// Fields carried by this update, in schema order / 本次更新包含的字段
    pub fn present_fields(&self) -> Vec<ConfigField> {
        let present = [
            self.page.is_some(),
            self.per_page.is_some(),
            self.num_typos.is_some(),
            self.search_strategy.is_some(),
            self.query_by.is_some(),
            self.default_sorting_field.is_some(),
            self.token_separators.is_some(),
            self.symbols_to_index.is_some(),
            self.stopwords.is_some(),
            self.synonyms.is_some(),
            self.default_stopwords_set.is_some(),
        ];
        ConfigField::ALL
            .iter()
            .zip(present)
            .filter_map(|(field, is_present)| is_present.then_some(*field))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }
}

/// Schema-level projection pushed to the search engine / 推送到索引的 Schema 字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sorting_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_separators: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_to_index: Option<Vec<String>>,
}

/// Stopwords/synonyms projection, never persisted on its own / 停用词与同义词投影
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopwordsSynonymsConfig {
    pub stopwords: Vec<String>,
    pub synonyms: Vec<SynonymRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_stopwords_set: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_strategy_is_preserved() {
        let cfg: EffectiveConfig =
            serde_json::from_str(r#"{"search_strategy": "semantic", "query_by": ["title"]}"#).unwrap();
        assert_eq!(
            cfg.search_strategy,
            Some(SearchStrategy::Other("semantic".to_string()))
        );
        assert!(!cfg.search_strategy.as_ref().unwrap().is_supported());

        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["search_strategy"], "semantic");
    }

    #[test]
    fn test_partial_rejects_unknown_fields() {
        let result = serde_json::from_str::<PartialConfigUpdate>(r#"{"perPage": 20}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_null_is_absent() {
        let partial: PartialConfigUpdate =
            serde_json::from_str(r#"{"per_page": null, "query_by": []}"#).unwrap();
        assert_eq!(partial.per_page, None);
        assert_eq!(partial.query_by, Some(vec![]));
        assert_eq!(partial.present_fields(), vec![ConfigField::QueryBy]);
        assert!(PartialConfigUpdate::default().is_empty());
    }

    #[test]
    fn test_schema_and_lexical_presence() {
        let mut cfg = EffectiveConfig::default();
        assert!(!cfg.has_schema_fields());
        assert!(!cfg.has_lexical_fields());

        // present but empty lists do not count
        cfg.token_separators = Some(vec![]);
        cfg.symbols_to_index = Some(vec![]);
        assert!(!cfg.has_schema_fields());

        cfg.symbols_to_index = Some(vec!["+".to_string()]);
        assert!(cfg.has_schema_fields());

        cfg.default_stopwords_set = Some("english".to_string());
        assert!(cfg.has_lexical_fields());
        assert_eq!(cfg.lexical().default_stopwords_set.as_deref(), Some("english"));
    }

    #[test]
    fn test_field_groups() {
        let schema: Vec<_> = ConfigField::ALL.iter().filter(|f| f.is_schema_field()).collect();
        let lexical: Vec<_> = ConfigField::ALL.iter().filter(|f| f.is_lexical_field()).collect();
        assert_eq!(schema.len(), 3);
        assert_eq!(lexical.len(), 3);
        assert_eq!(field_specs().len(), ConfigField::ALL.len());
    }

    #[test]
    fn test_field_specs_for_index() {
        let schema = IndexSchema {
            name: "products".to_string(),
            fields: vec![
                IndexField { name: "title".to_string(), field_type: "string".to_string() },
                IndexField { name: "tags".to_string(), field_type: "string[]".to_string() },
                IndexField { name: "price".to_string(), field_type: "float".to_string() },
                IndexField { name: "in_stock".to_string(), field_type: "bool".to_string() },
            ],
            default_sorting_field: None,
        };
        let specs = field_specs_for_index(&schema);
        let options = |name: &str| specs.iter().find(|s| s.name == name).unwrap().options.clone();

        assert_eq!(options("query_by"), vec!["title".to_string(), "tags".to_string()]);
        assert_eq!(options("default_sorting_field"), vec!["price".to_string()]);
        assert_eq!(options("num_typos"), vec!["0", "1", "2"]);

        let json = serde_json::to_value(&field_specs()).unwrap();
        assert!(json[0].get("options").is_none());
    }

    #[test]
    fn test_empty_config_serializes_lists() {
        let json = serde_json::to_value(EffectiveConfig::default()).unwrap();
        assert_eq!(json["query_by"], serde_json::json!([]));
        assert!(json.get("per_page").is_none());
    }
}
