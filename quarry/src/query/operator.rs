//! Predicate operators and their clause translation
//!
//! Every predicate the builder accepts is a `(field, operator, value)` triple.
//! [`translate`] turns it into a clause fragment and the bool bucket the
//! fragment belongs to.

use crate::error::Error;
use crate::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Bool container bucket a clause is placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Must,
    MustNot,
    Filter,
    Should,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Must => "must",
            Bucket::MustNot => "must_not",
            Bucket::Filter => "filter",
            Bucket::Should => "should",
        }
    }
}

/// Predicate operators accepted by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` exact term
    Eq,
    /// `!=` or `<>`
    NotEq,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
    NotIn,
    /// `like` analyzed full-text match
    Like,
    Regex,
    Prefix,
    /// `filter` inserts `{field: value}` verbatim into the filter bucket
    Filter,
    /// `range` takes `[low, high]`, both inclusive
    Range,
    Nested,
    MultiMatch,
    /// `or` takes a list of `[operator, value]` pairs on the same field
    Or,
}

impl Operator {
    pub const ALL: [Operator; 16] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::Regex,
        Operator::Prefix,
        Operator::Filter,
        Operator::Range,
        Operator::Nested,
        Operator::MultiMatch,
        Operator::Or,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Like => "like",
            Operator::Regex => "regex",
            Operator::Prefix => "prefix",
            Operator::Filter => "filter",
            Operator::Range => "range",
            Operator::Nested => "nested",
            Operator::MultiMatch => "multi match",
            Operator::Or => "or",
        }
    }

    /// Bucket the translated clause is placed in
    pub fn bucket(&self) -> Bucket {
        match self {
            Operator::NotEq | Operator::NotIn => Bucket::MustNot,
            Operator::Filter | Operator::Nested => Bucket::Filter,
            _ => Bucket::Must,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let op = match normalized.as_str() {
            "=" => Operator::Eq,
            "!=" | "<>" => Operator::NotEq,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "like" => Operator::Like,
            "regex" => Operator::Regex,
            "prefix" => Operator::Prefix,
            "filter" => Operator::Filter,
            "range" => Operator::Range,
            "nested" => Operator::Nested,
            "multi match" => Operator::MultiMatch,
            "or" => Operator::Or,
            _ => return Err(Error::InvalidOperator(s.to_string())),
        };
        Ok(op)
    }
}

impl TryFrom<&str> for Operator {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

/// Translate a predicate into its bucket and clause fragment
pub fn translate(field: &str, op: Operator, value: Value) -> Result<(Bucket, Value)> {
    let fragment = clause(field, op, value)?;
    Ok((op.bucket(), fragment))
}

/// Build a `should` group over conditions on one field, at least one must match
pub fn disjunction<I>(field: &str, conditions: I) -> Result<Value>
where
    I: IntoIterator<Item = (Operator, Value)>,
{
    let mut should = Vec::new();
    for (op, value) in conditions {
        if op == Operator::Or {
            return Err(Error::InvalidPredicate(format!(
                "'or' groups on '{}' cannot be nested",
                field
            )));
        }
        should.push(clause(field, op, value)?);
    }

    Ok(json!({
        "bool": {
            "should": should,
            "minimum_should_match": 1
        }
    }))
}

/// `{"term": {field: value}}`
pub fn term(field: &str, value: Value) -> Value {
    json!({"term": {field: value}})
}

/// `{"terms": {field: values}}`
pub fn terms(field: &str, values: Value) -> Value {
    json!({"terms": {field: values}})
}

/// `{"match": {field: value}}`
pub fn full_text(field: &str, value: Value) -> Value {
    json!({"match": {field: value}})
}

/// Range with both bounds inclusive
pub fn inclusive_range(field: &str, low: Value, high: Value) -> Value {
    json!({"range": {field: {"gte": low, "lte": high}}})
}

fn clause(field: &str, op: Operator, value: Value) -> Result<Value> {
    let fragment = match op {
        Operator::Eq | Operator::NotEq => term(field, value),
        Operator::Gt => json!({"range": {field: {"gt": value}}}),
        Operator::Lt => json!({"range": {field: {"lt": value}}}),
        Operator::Gte => json!({"range": {field: {"gte": value}}}),
        Operator::Lte => json!({"range": {field: {"lte": value}}}),
        Operator::In | Operator::NotIn => {
            if !value.is_array() {
                return Err(Error::InvalidPredicate(format!(
                    "'{}' on '{}' expects a list of values",
                    op, field
                )));
            }
            terms(field, value)
        }
        Operator::Like => full_text(field, value),
        Operator::Regex => json!({"regexp": {field: value}}),
        Operator::Prefix => json!({"prefix": {field: value}}),
        Operator::Filter => json!({field: value}),
        Operator::Range => {
            let (low, high) = bounds(field, value)?;
            inclusive_range(field, low, high)
        }
        Operator::Nested => json!({"nested": {"path": field, "query": value}}),
        Operator::MultiMatch => json!({"multi_match": value}),
        Operator::Or => disjunction(field, or_conditions(field, value)?)?,
    };
    Ok(fragment)
}

fn bounds(field: &str, value: Value) -> Result<(Value, Value)> {
    match value {
        Value::Array(items) if items.len() == 2 => {
            let mut items = items.into_iter();
            match (items.next(), items.next()) {
                (Some(low), Some(high)) => Ok((low, high)),
                _ => unreachable!("length checked above"),
            }
        }
        other => Err(Error::InvalidPredicate(format!(
            "'range' on '{}' expects [low, high], got {}",
            field, other
        ))),
    }
}

/// Parse `[[op, value], ...]` as carried by the `or` operator
fn or_conditions(field: &str, value: Value) -> Result<Vec<(Operator, Value)>> {
    let invalid = || {
        Error::InvalidPredicate(format!(
            "'or' on '{}' expects a list of [operator, value] pairs",
            field
        ))
    };

    let Value::Array(items) = value else {
        return Err(invalid());
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Array(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                let op = pair.next().unwrap_or(Value::Null);
                let value = pair.next().unwrap_or(Value::Null);
                let op = op.as_str().ok_or_else(invalid)?.parse::<Operator>()?;
                Ok((op, value))
            }
            _ => Err(invalid()),
        })
        .collect()
}
