//! Merge engine / 配置合并
//!
//! Right-biased overwrite of an existing configuration with a partial update.
//! Pure: no I/O, idempotent, and an empty update is a no-op.

use super::schema::{EffectiveConfig, PartialConfigUpdate};

/// Merge a partial update onto the existing configuration / 合并部分更新
///
/// - present fields overwrite, absent fields stay untouched
/// - list fields are replaced wholesale, never merged element-wise
/// - no existing config starts from the all-empty config, not from defaults,
///   so "never configured" stays distinguishable from "configured to defaults"
pub fn merge(existing: Option<&EffectiveConfig>, partial: &PartialConfigUpdate) -> EffectiveConfig {
    let mut merged = existing.cloned().unwrap_or_default();

    if let Some(page) = partial.page {
        merged.page = Some(page);
    }
    if let Some(per_page) = partial.per_page {
        merged.per_page = Some(per_page);
    }
    if let Some(num_typos) = partial.num_typos {
        merged.num_typos = Some(num_typos);
    }
    if let Some(strategy) = &partial.search_strategy {
        merged.search_strategy = Some(strategy.clone());
    }
    if let Some(query_by) = &partial.query_by {
        merged.query_by = query_by.clone();
    }
    overwrite_text(&mut merged.default_sorting_field, &partial.default_sorting_field);
    if let Some(separators) = &partial.token_separators {
        merged.token_separators = Some(separators.clone());
    }
    if let Some(symbols) = &partial.symbols_to_index {
        merged.symbols_to_index = Some(symbols.clone());
    }
    if let Some(stopwords) = &partial.stopwords {
        merged.stopwords = stopwords.clone();
    }
    if let Some(synonyms) = &partial.synonyms {
        merged.synonyms = synonyms.clone();
    }
    overwrite_text(&mut merged.default_stopwords_set, &partial.default_stopwords_set);

    merged
}

/// Empty string clears the slot / 空字符串表示清除
fn overwrite_text(slot: &mut Option<String>, incoming: &Option<String>) {
    if let Some(value) = incoming {
        let value = value.trim();
        *slot = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search_config::schema::{SearchStrategy, SynonymRule};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn existing() -> EffectiveConfig {
        EffectiveConfig {
            page: Some(1),
            per_page: Some(20),
            num_typos: Some(1),
            search_strategy: Some(SearchStrategy::Text),
            query_by: strings(&["title", "body"]),
            default_sorting_field: Some("created_at".to_string()),
            stopwords: strings(&["the"]),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_update_is_noop() {
        let base = existing();
        assert_eq!(merge(Some(&base), &PartialConfigUpdate::default()), base);
    }

    #[test]
    fn test_present_fields_win() {
        let partial = PartialConfigUpdate {
            per_page: Some(50),
            search_strategy: Some(SearchStrategy::Hybrid),
            ..Default::default()
        };
        let merged = merge(Some(&existing()), &partial);
        assert_eq!(merged.per_page, Some(50));
        assert_eq!(merged.search_strategy, Some(SearchStrategy::Hybrid));
        // untouched
        assert_eq!(merged.page, Some(1));
        assert_eq!(merged.query_by, strings(&["title", "body"]));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let partial = PartialConfigUpdate {
            query_by: Some(strings(&["name"])),
            stopwords: Some(strings(&["a", "an"])),
            default_sorting_field: Some("".to_string()),
            ..Default::default()
        };
        let once = merge(Some(&existing()), &partial);
        let twice = merge(Some(&once), &partial);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_lists_replaced_wholesale() {
        let partial = PartialConfigUpdate {
            query_by: Some(strings(&["sku"])),
            synonyms: Some(vec![SynonymRule {
                root: None,
                synonyms: strings(&["tv", "television"]),
            }]),
            ..Default::default()
        };
        let merged = merge(Some(&existing()), &partial);
        assert_eq!(merged.query_by, strings(&["sku"]));
        assert_eq!(merged.synonyms.len(), 1);
        // stopwords not in the update: kept as-is
        assert_eq!(merged.stopwords, strings(&["the"]));
    }

    #[test]
    fn test_explicit_empty_list_replaces() {
        let partial = PartialConfigUpdate {
            query_by: Some(vec![]),
            ..Default::default()
        };
        let merged = merge(Some(&existing()), &partial);
        assert!(merged.query_by.is_empty());
    }

    #[test]
    fn test_missing_existing_starts_empty() {
        let partial = PartialConfigUpdate {
            stopwords: Some(strings(&["the", "a"])),
            ..Default::default()
        };
        let merged = merge(None, &partial);
        assert_eq!(
            merged,
            EffectiveConfig {
                stopwords: strings(&["the", "a"]),
                ..Default::default()
            }
        );
        assert_eq!(merged.per_page, None);
    }

    #[test]
    fn test_empty_string_clears_text_field() {
        let partial = PartialConfigUpdate {
            default_sorting_field: Some("  ".to_string()),
            default_stopwords_set: Some("english".to_string()),
            ..Default::default()
        };
        let merged = merge(Some(&existing()), &partial);
        assert_eq!(merged.default_sorting_field, None);
        assert_eq!(merged.default_stopwords_set.as_deref(), Some("english"));
    }
}
