//! Alias resolution / 索引目标解析

use crate::models::IndexBinding;

/// Name used to address the search engine for a store / 解析推送目标
///
/// alias if non-empty, else index name if non-empty, else no target.
pub fn resolve_target(binding: &IndexBinding) -> Option<&str> {
    let alias = binding.alias.as_deref().map(str::trim).unwrap_or("");
    if !alias.is_empty() {
        return Some(alias);
    }
    let index_name = binding.index_name.trim();
    if !index_name.is_empty() {
        return Some(index_name);
    }
    None
}
