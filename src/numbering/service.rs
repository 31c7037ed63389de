//! Number generation: scheme resolution + sequence allocation + rendering

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::debug;

use crate::numbering::pattern::{render_pattern, PatternValue};
use crate::numbering::scheme::{default_scheme, NumberingScheme};
use crate::traits::LedgerStorage;
use crate::types::LedgerResult;

/// Caller-supplied context merged into the pattern values.
///
/// `year`, `month`, and `day` are always populated from `date` (today when
/// unset) whether or not the pattern uses them; `extra` entries are
/// entity-specific text values.
#[derive(Debug, Clone, Default)]
pub struct NumberContext {
    pub date: Option<NaiveDate>,
    pub prefix: Option<String>,
    pub extra: HashMap<String, String>,
}

impl NumberContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Generates human-readable serials for any entity type
pub struct NumberingService<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> NumberingService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Resolve the active scheme for (entity label, field name), falling
    /// back to the hard-coded default table. Never writes storage.
    pub async fn resolve_scheme(
        &self,
        entity_label: &str,
        field_name: &str,
    ) -> LedgerResult<NumberingScheme> {
        if let Some(scheme) = self.storage.get_scheme(entity_label, field_name).await? {
            if scheme.is_active {
                return Ok(scheme);
            }
        }
        Ok(default_scheme(entity_label, field_name))
    }

    /// Validate and persist a scheme. The `{seq}` placeholder check happens
    /// here, so generation never has to deal with a seq-less pattern.
    pub async fn save_scheme(&mut self, scheme: &NumberingScheme) -> LedgerResult<()> {
        scheme.validate()?;
        self.storage.save_scheme(scheme).await
    }

    /// Generate the next serial for an entity.
    ///
    /// The sequence counter increments even if the caller discards the
    /// returned string; gap-free numbering requires the caller to persist
    /// its entity in the same transaction as the allocation.
    pub async fn generate(
        &mut self,
        entity_label: &str,
        field_name: &str,
        ctx: &NumberContext,
    ) -> LedgerResult<String> {
        let scheme = self.resolve_scheme(entity_label, field_name).await?;
        let date = ctx.date.unwrap_or_else(|| Utc::now().date_naive());
        let period = scheme.reset.period_for(date);

        let seq = self
            .storage
            .next_sequence(entity_label, &period, scheme.start)
            .await?;
        debug!(key = entity_label, %period, seq, "allocated sequence value");

        let mut values = HashMap::new();
        values.insert("year".to_string(), PatternValue::Int(i64::from(date.year())));
        values.insert("month".to_string(), PatternValue::Int(i64::from(date.month())));
        values.insert("day".to_string(), PatternValue::Int(i64::from(date.day())));
        for (key, value) in &ctx.extra {
            values.insert(key.clone(), PatternValue::Text(value.clone()));
        }
        if let Some(prefix) = &ctx.prefix {
            values.insert("prefix".to_string(), PatternValue::Text(prefix.clone()));
        }
        values.insert("seq".to_string(), PatternValue::Uint(seq));

        render_pattern(&scheme.pattern, &values)
    }
}
