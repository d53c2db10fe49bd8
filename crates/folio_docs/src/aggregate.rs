//! Grouping flat records by a correlation key and folding each group into a
//! single summary row before rendering.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use serde_json::{Number, Value};
use tracing::debug;

use crate::schema::{Record, stringify_value};

const JOIN_SEPARATOR: &str = " - ";

/// Records sharing one correlation key, in original order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<K, R = Record> {
    pub correlation_key: K,
    pub records: Vec<R>,
}

/// Stable grouping: groups appear in first-seen order and keep their
/// members in input order.
pub fn group_by_correlation_key<K, R, F>(records: impl IntoIterator<Item = R>, mut key_fn: F) -> Vec<Group<K, R>>
where
    K: Eq + Hash + Clone,
    F: FnMut(&R) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Group<K, R>> = Vec::new();

    for record in records {
        let key = key_fn(&record);
        match index.get(&key) {
            Some(&i) => groups[i].records.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    correlation_key: key,
                    records: vec![record],
                });
            }
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Summary rules
// ---------------------------------------------------------------------------

/// How one field of a group collapses into the summary row.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Numeric count-like field; members are added up.
    Sum,
    /// Free text; non-blank values joined with `" - "`.
    Join,
    /// Date-like field; the first member's value wins.
    First,
    /// Status code resolved to its label, then joined.
    Status(Arc<HashMap<String, String>>),
}

/// Per-field rules. Fields without a rule are inferred from their key and
/// values (see [`Summarizer::summarize`]).
#[derive(Debug, Clone, Default)]
pub struct SummaryPlan {
    rules: Vec<(String, FieldRule)>,
}

impl SummaryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, key: impl Into<String>, rule: FieldRule) -> Self {
        let key = key.into();
        self.rules.retain(|(k, _)| *k != key);
        self.rules.push((key, rule));
        self
    }

    pub fn sum(self, key: impl Into<String>) -> Self {
        self.rule(key, FieldRule::Sum)
    }

    pub fn join(self, key: impl Into<String>) -> Self {
        self.rule(key, FieldRule::Join)
    }

    pub fn first(self, key: impl Into<String>) -> Self {
        self.rule(key, FieldRule::First)
    }

    pub fn status<I, C, L>(self, key: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = (C, L)>,
        C: Into<String>,
        L: Into<String>,
    {
        let labels = labels
            .into_iter()
            .map(|(code, label)| (code.into(), label.into()))
            .collect();
        self.rule(key, FieldRule::Status(Arc::new(labels)))
    }

    fn rule_for(&self, key: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }
}

fn is_blank(value: &Value) -> bool {
    stringify_value(value).trim().is_empty()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Keys naming identifiers or phone numbers: `id`, `memberId`, `member_id`,
/// `phoneNumber`.
fn is_identifier_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower == "id" || lower.ends_with("_id") || key.ends_with("Id") || key.ends_with("ID") || lower.contains("phone")
}

/// Numeric for summing purposes. Digit strings with a leading zero or a
/// sign prefix are codes, not quantities.
fn is_quantity(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            let s = s.trim();
            let coded = s.starts_with('+')
                || (s.starts_with('0') && s.chars().nth(1).is_some_and(|c| c.is_ascii_digit()));
            !coded && as_number(value).is_some()
        }
        _ => false,
    }
}

fn infer_rule(key: &str, values: &[&Value]) -> FieldRule {
    if key.to_lowercase().contains("date") {
        return FieldRule::First;
    }
    if is_identifier_key(key) {
        return FieldRule::Join;
    }
    let mut present = values.iter().filter(|v| !is_blank(v)).peekable();
    if present.peek().is_some() && present.all(|v| is_quantity(v)) {
        FieldRule::Sum
    } else {
        FieldRule::Join
    }
}

fn format_sum(sum: f64) -> String {
    if sum.fract() == 0.0 && sum.abs() < 1e15 {
        format!("{}", sum as i64)
    } else {
        sum.to_string()
    }
}

fn sum_values(key: &str, values: &[&Value]) -> Value {
    let mut sum = 0.0;
    let mut textual = false;
    for value in values.iter().filter(|v| !is_blank(v)) {
        textual |= value.is_string();
        match as_number(value) {
            Some(n) => sum += n,
            None => debug!(field = key, value = %value, "Skipping non-numeric value in sum"),
        }
    }

    if textual {
        return Value::String(format_sum(sum));
    }
    if sum.fract() == 0.0 && sum.abs() < 1e15 {
        Value::Number(Number::from(sum as i64))
    } else {
        Number::from_f64(sum).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn join_values(values: impl Iterator<Item = String>) -> Value {
    let parts: Vec<String> = values.filter(|s| !s.trim().is_empty()).collect();
    Value::String(parts.join(JOIN_SEPARATOR))
}

/// Folds groups into summary rows according to a [`SummaryPlan`].
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    plan: SummaryPlan,
}

impl Summarizer {
    pub fn new(plan: SummaryPlan) -> Self {
        Self { plan }
    }

    /// Collapse one group into a single record.
    ///
    /// Fields without an explicit rule: keys containing `date` keep the
    /// first member's value, identifier keys (`id`, `*Id`, `*_id`,
    /// `*phone*`) are joined, fields whose non-blank values are all
    /// quantities are summed, everything else is joined. Returns `None` for
    /// an empty group.
    pub fn summarize(&self, members: &[Record]) -> Option<Record> {
        self.summarize_keyed(members, None)
    }

    fn summarize_keyed(&self, members: &[Record], key_field: Option<&str>) -> Option<Record> {
        let first = members.first()?;

        let mut keys: Vec<&String> = Vec::new();
        for member in members {
            for key in member.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        let keep_first = FieldRule::First;
        let mut summary = Record::new();
        for key in keys {
            let values: Vec<&Value> = members.iter().filter_map(|m| m.get(key)).collect();
            let inferred;
            let rule = match self.plan.rule_for(key) {
                _ if key_field == Some(key.as_str()) => &keep_first,
                Some(rule) => rule,
                None => {
                    inferred = infer_rule(key, &values);
                    &inferred
                }
            };

            let value = match rule {
                FieldRule::Sum => sum_values(key, &values),
                FieldRule::Join => join_values(values.iter().map(|v| stringify_value(v))),
                FieldRule::First => first.get(key).cloned().unwrap_or(Value::Null),
                FieldRule::Status(labels) => join_values(values.iter().map(|v| {
                    let code = stringify_value(v);
                    labels.get(code.trim()).cloned().unwrap_or(code)
                })),
            };
            summary.insert(key.clone(), value);
        }
        Some(summary)
    }

    /// One summary row per non-empty group, in group order. `key_field` is
    /// the field the groups were keyed on; it always keeps the first
    /// member's value.
    pub fn summarize_groups<K>(&self, groups: &[Group<K>], key_field: &str) -> Vec<Record> {
        groups
            .iter()
            .filter_map(|g| self.summarize_keyed(&g.records, Some(key_field)))
            .collect()
    }
}

/// Summarize with inferred rules only.
pub fn summarize(members: &[Record]) -> Option<Record> {
    Summarizer::default().summarize(members)
}
