//! Store search configuration / 店铺搜索配置
//!
//! Pure building blocks (schema, merge, validation, target resolution,
//! query defaults) plus the reconciliation orchestrator that persists a
//! configuration and propagates it to the search engine and caches.

pub mod defaults;
pub mod merge;
pub mod reader;
pub mod reconcile;
pub mod schema;
pub mod target;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use defaults::{resolve_for_query, IndexDefaults};
pub use merge::merge;
pub use reader::EffectiveConfigReader;
pub use reconcile::{
    ReconcileOptions, ReconcileOutcome, ReconcileRequest, ReconcileStep, ReconcileWarning, Reconciler, SkipReason,
    StepStatus,
};
pub use schema::{
    field_specs, field_specs_for_index, ConfigField, EffectiveConfig, FieldKind, FieldSpec, PartialConfigUpdate,
    SchemaFields, SearchStrategy, StopwordsSynonymsConfig, SynonymRule,
};
pub use target::resolve_target;
pub use validate::{validate, QueryByRule, ValidationError, ValidationErrors};
