//! Property filters
//!
//! A filter that matches an instance keeps it alive. Filters are grouped by
//! resource type, with `__global__` applying to every type.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::resource::Properties;

/// Filter group applied to every resource type
pub const GLOBAL_FILTER_KEY: &str = "__global__";

/// Canonical resource type (or [`GLOBAL_FILTER_KEY`]) -> filters
pub type Filters = BTreeMap<String, Vec<Filter>>;

/// How a filter compares the property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    #[default]
    Exact,
    Glob,
    Regex,
    Contains,
    Prefix,
    Suffix,
    In,
    NotIn,
    /// Matches while the property date is younger than the given age, so only older
    /// instances are removed
    DateOlderThan,
}

/// Filter as written in the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterSpec {
    /// Bare string: exact match on the display label
    Label(String),
    Rule(FilterRule),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterRule {
    #[serde(default)]
    pub property: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: FilterType,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub invert: bool,
}

/// Compiled filter.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Property to compare; `None` compares the display label
    property: Option<String>,
    kind: FilterType,
    value: String,
    values: Vec<String>,
    invert: bool,
    pattern: Option<Regex>,
    max_age: Option<TimeDelta>,
}

impl Filter {
    /// Compile a config entry; `resource_type` is only used in error messages.
    pub fn compile(spec: &FilterSpec, resource_type: &str) -> Result<Self, ConfigError> {
        let rule = match spec {
            FilterSpec::Label(label) => FilterRule {
                property: None,
                kind: FilterType::Exact,
                value: label.clone(),
                values: Vec::new(),
                invert: false,
            },
            FilterSpec::Rule(rule) => rule.clone(),
        };

        let invalid = |reason: String| ConfigError::InvalidFilter {
            resource_type: resource_type.to_string(),
            reason,
        };

        let pattern = match rule.kind {
            FilterType::Regex => Some(Regex::new(&rule.value).map_err(|e| invalid(e.to_string()))?),
            FilterType::Glob => {
                Some(Regex::new(&glob_to_regex(&rule.value)).map_err(|e| invalid(e.to_string()))?)
            }
            _ => None,
        };

        let max_age = match rule.kind {
            FilterType::DateOlderThan => Some(
                parse_age(&rule.value)
                    .ok_or_else(|| invalid(format!("invalid duration: {}", rule.value)))?,
            ),
            _ => None,
        };

        if matches!(rule.kind, FilterType::In | FilterType::NotIn) && rule.values.is_empty() {
            return Err(invalid(format!("{:?} filter needs `values`", rule.kind)));
        }

        Ok(Self {
            property: rule.property,
            kind: rule.kind,
            value: rule.value,
            values: rule.values,
            invert: rule.invert,
            pattern,
            max_age,
        })
    }

    /// `property` is not one of `values`.
    pub fn not_in(property: &str, values: &[String]) -> Self {
        Self {
            property: Some(property.to_string()),
            kind: FilterType::NotIn,
            value: String::new(),
            values: values.to_vec(),
            invert: false,
            pattern: None,
            max_age: None,
        }
    }

    /// Whether the instance is protected by this filter.
    pub fn matches(&self, label: &str, props: &Properties) -> bool {
        let subject = match &self.property {
            Some(property) => props.get(property).unwrap_or_default(),
            None => label,
        };

        let matched = match self.kind {
            FilterType::Exact => subject == self.value,
            FilterType::Glob | FilterType::Regex => self
                .pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(subject)),
            FilterType::Contains => subject.contains(&self.value),
            FilterType::Prefix => subject.starts_with(&self.value),
            FilterType::Suffix => subject.ends_with(&self.value),
            FilterType::In => self.values.iter().any(|v| v == subject),
            FilterType::NotIn => !self.values.iter().any(|v| v == subject),
            FilterType::DateOlderThan => match (parse_date(subject), self.max_age) {
                // past the end of representable time counts as young
                (Some(date), Some(age)) => date
                    .checked_add_signed(age)
                    .is_none_or(|threshold| threshold > Utc::now()),
                _ => false,
            },
        };

        matched != self.invert
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let property = self.property.as_deref().unwrap_or("label");
        let kind = format!("{:?}", self.kind).to_lowercase();
        if self.invert {
            write!(f, "not ")?;
        }
        match self.kind {
            FilterType::In | FilterType::NotIn => {
                write!(f, "{} {} [{}]", property, kind, self.values.join(", "))
            }
            _ => write!(f, "{} {} {}", property, kind, self.value),
        }
    }
}

/// Anchored regex for a `*` / `?` glob.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

/// `30s`, `15m`, `24h`, `7d`, or a bare number of seconds. `None` when out of range.
fn parse_age(value: &str) -> Option<TimeDelta> {
    let value = value.trim();
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };
    let amount: i64 = digits.parse().ok()?;
    match unit {
        "s" => TimeDelta::try_seconds(amount),
        "m" => TimeDelta::try_minutes(amount),
        "h" => TimeDelta::try_hours(amount),
        "d" => TimeDelta::try_days(amount),
        _ => None,
    }
}

/// RFC 3339, a plain date, or a unix timestamp.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}
