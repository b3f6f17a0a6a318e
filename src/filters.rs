//! Filter state for listing screens.
//!
//! `FilterStore` is a plain state container: the screen edits it field by
//! field, and the controller snapshots the criteria when filters are applied.
//! Empty or placeholder values never reach the wire; setting a field to one
//! removes the field instead.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ListError;

pub const FIELD_BRANCH: &str = "filial";
pub const FIELD_REGISTER: &str = "caixa";
pub const FIELD_DATE_FROM: &str = "data_inicio";
pub const FIELD_DATE_TO: &str = "data_fim";
pub const FIELD_ORDER_ID: &str = "pedido";
pub const FIELD_CANCELLATION: &str = "status_cancelamento";
pub const FIELD_STATUS: &str = "status";

/// Wire format of date filters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single scalar filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Int(i64),
    Date(NaiveDate),
    Text(String),
}

impl FilterValue {
    /// Query-string representation.
    pub fn to_query_value(&self) -> String {
        match self {
            FilterValue::Int(n) => n.to_string(),
            FilterValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FilterValue::Text(s) => s.clone(),
        }
    }

    /// True for values a form would submit when nothing was chosen.
    fn is_placeholder(&self) -> bool {
        matches!(self, FilterValue::Text(s) if s.trim().is_empty())
    }

    /// Canonical form: text holding an exact `YYYY-MM-DD` date becomes a
    /// `Date`, so equal queries compare equal whichever way they were typed.
    fn normalized(self) -> Self {
        match self {
            FilterValue::Text(s) => match NaiveDate::parse_from_str(&s, DATE_FORMAT) {
                Ok(d) if d.format(DATE_FORMAT).to_string() == s => FilterValue::Date(d),
                _ => FilterValue::Text(s),
            },
            other => other,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FilterValue::Date(d) => Some(*d),
            FilterValue::Text(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
            FilterValue::Int(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_value())
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int(i64::from(n))
    }
}

impl From<u32> for FilterValue {
    fn from(n: u32) -> Self {
        FilterValue::Int(i64::from(n))
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(d: NaiveDate) -> Self {
        FilterValue::Date(d)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.trim().to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s.trim().to_string())
    }
}

impl From<CancellationFilter> for FilterValue {
    fn from(f: CancellationFilter) -> Self {
        FilterValue::Text(f.as_str().to_string())
    }
}

/// Cancellation filter offered by the sales order screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationFilter {
    #[default]
    Todos,
    SemCancelados,
    ComCancelados,
    ApenasCancelados,
}

impl CancellationFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationFilter::Todos => "todos",
            CancellationFilter::SemCancelados => "sem_cancelados",
            CancellationFilter::ComCancelados => "com_cancelados",
            CancellationFilter::ApenasCancelados => "apenas_cancelados",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "todos" => Some(CancellationFilter::Todos),
            "sem_cancelados" => Some(CancellationFilter::SemCancelados),
            "com_cancelados" => Some(CancellationFilter::ComCancelados),
            "apenas_cancelados" => Some(CancellationFilter::ApenasCancelados),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Field name -> value. Unset fields are absent, never stored as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    fields: BTreeMap<String, FilterValue>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, honouring the placeholder rule.
    pub fn with(mut self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.insert(field, value.into());
        self
    }

    fn insert(&mut self, field: &str, value: FilterValue) {
        let field = field.trim();
        if field.is_empty() {
            return;
        }
        if value.is_placeholder() {
            self.fields.remove(field);
        } else {
            self.fields.insert(field.to_string(), value.normalized());
        }
    }

    pub fn get(&self, field: &str) -> Option<&FilterValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Key/value pairs for the outgoing request, in field-name order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_query_value()))
            .collect()
    }

    /// Check required fields and the date range before anything is sent.
    pub fn validate(&self, required: &[&str]) -> Result<(), ListError> {
        if let Some(missing) = required.iter().find(|f| !self.contains(f)) {
            return Err(ListError::Validation(format!(
                "Missing required filter: {missing}"
            )));
        }

        let from = self.get(FIELD_DATE_FROM);
        let to = self.get(FIELD_DATE_TO);
        for (field, value) in [(FIELD_DATE_FROM, from), (FIELD_DATE_TO, to)] {
            if let Some(v) = value {
                if v.as_date().is_none() {
                    return Err(ListError::Validation(format!(
                        "Invalid date for {field}: {v} (expected YYYY-MM-DD)"
                    )));
                }
            }
        }
        if let (Some(from), Some(to)) = (from.and_then(|v| v.as_date()), to.and_then(|v| v.as_date()))
        {
            if from > to {
                return Err(ListError::Validation(format!(
                    "{FIELD_DATE_FROM} ({from}) must not be after {FIELD_DATE_TO} ({to})"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Editable filter state for one screen.
#[derive(Debug, Clone)]
pub struct FilterStore {
    current: FilterCriteria,
    defaults: FilterCriteria,
}

impl FilterStore {
    pub fn new(defaults: FilterCriteria) -> Self {
        Self {
            current: defaults.clone(),
            defaults,
        }
    }

    pub fn get(&self) -> &FilterCriteria {
        &self.current
    }

    /// Set one field. Empty strings clear the field.
    pub fn set(&mut self, field: &str, value: impl Into<FilterValue>) {
        self.current.insert(field, value.into());
    }

    /// Set or clear a field from an optional value.
    pub fn set_opt<V: Into<FilterValue>>(&mut self, field: &str, value: Option<V>) {
        match value {
            Some(v) => self.set(field, v),
            None => self.unset(field),
        }
    }

    pub fn unset(&mut self, field: &str) {
        self.current.fields.remove(field);
    }

    /// Reset to the defaults supplied at construction.
    pub fn clear(&mut self) {
        self.current = self.defaults.clone();
    }

    pub fn defaults(&self) -> &FilterCriteria {
        &self.defaults
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterCriteria::default())
    }
}
