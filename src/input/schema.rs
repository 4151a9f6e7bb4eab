//! Declarative request schemas.
//!
//! A [`Schema`] lists the fields an endpoint accepts and the constraints on
//! each. [`Schema::validate`] walks the whole payload and reports every
//! violation with its path; only a fully valid payload is deserialized into
//! the endpoint's typed request.

use std::fmt;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path, with `[i]` for array elements; `$` is the payload itself.
    pub field: String,
    pub reason: String,
}

/// Every violation found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self(vec![FieldError {
            field: field.into(),
            reason: reason.into(),
        }])
    }

    fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", err.field, err.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone)]
enum Kind {
    Str {
        min_len: Option<usize>,
        max_len: Option<usize>,
        pattern: Option<Regex>,
        one_of: Option<Vec<String>>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Array {
        items: Box<Rule>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object(Schema),
}

/// Constraints on a single field.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: Kind,
    required: bool,
}

impl Rule {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            required: true,
        }
    }

    pub fn string() -> Self {
        Self::of(Kind::Str {
            min_len: None,
            max_len: None,
            pattern: None,
            one_of: None,
        })
    }

    pub fn integer() -> Self {
        Self::of(Kind::Integer { min: None, max: None })
    }

    pub fn number() -> Self {
        Self::of(Kind::Number { min: None, max: None })
    }

    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    pub fn array(items: Rule) -> Self {
        Self::of(Kind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    pub fn object(schema: Schema) -> Self {
        Self::of(Kind::Object(schema))
    }

    /// Absent or `null` is accepted.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Character count bounds for strings, item count bounds for arrays.
    pub fn len(mut self, min: usize, max: usize) -> Self {
        match &mut self.kind {
            Kind::Str { min_len, max_len, .. } => {
                *min_len = Some(min);
                *max_len = Some(max);
            }
            Kind::Array {
                min_items,
                max_items,
                ..
            } => {
                *min_items = Some(min);
                *max_items = Some(max);
            }
            _ => {}
        }
        self
    }

    pub fn pattern(mut self, re: Regex) -> Self {
        if let Kind::Str { pattern, .. } = &mut self.kind {
            *pattern = Some(re);
        }
        self
    }

    pub fn one_of(mut self, allowed: &[&str]) -> Self {
        if let Kind::Str { one_of, .. } = &mut self.kind {
            *one_of = Some(allowed.iter().map(|s| s.to_string()).collect());
        }
        self
    }

    /// Inclusive numeric bounds.
    pub fn range(mut self, lo: i64, hi: i64) -> Self {
        match &mut self.kind {
            Kind::Integer { min, max } => {
                *min = Some(lo);
                *max = Some(hi);
            }
            Kind::Number { min, max } => {
                *min = Some(lo as f64);
                *max = Some(hi as f64);
            }
            _ => {}
        }
        self
    }

    fn check(&self, path: &str, value: &Value, errors: &mut ValidationErrors) {
        match (&self.kind, value) {
            (
                Kind::Str {
                    min_len,
                    max_len,
                    pattern,
                    one_of,
                },
                Value::String(s),
            ) => {
                let chars = s.chars().count();
                if let Some(min) = min_len {
                    if chars < *min {
                        errors.push(path, format!("must be at least {min} characters"));
                    }
                }
                if let Some(max) = max_len {
                    if chars > *max {
                        errors.push(path, format!("must be at most {max} characters"));
                    }
                }
                if let Some(re) = pattern {
                    if !re.is_match(s) {
                        errors.push(path, "has an invalid format");
                    }
                }
                if let Some(allowed) = one_of {
                    if !allowed.iter().any(|a| a == s) {
                        errors.push(path, format!("must be one of: {}", allowed.join(", ")));
                    }
                }
            }
            (Kind::Integer { min, max }, Value::Number(n)) => match n.as_i64() {
                Some(v) => {
                    check_bounds(path, v, *min, *max, errors);
                }
                None => errors.push(path, "must be an integer"),
            },
            (Kind::Number { min, max }, Value::Number(n)) => {
                if let Some(v) = n.as_f64() {
                    check_bounds(path, v, *min, *max, errors);
                }
            }
            (Kind::Boolean, Value::Bool(_)) => {}
            (
                Kind::Array {
                    items,
                    min_items,
                    max_items,
                },
                Value::Array(values),
            ) => {
                if let Some(min) = min_items {
                    if values.len() < *min {
                        errors.push(path, format!("must contain at least {min} items"));
                    }
                }
                if let Some(max) = max_items {
                    if values.len() > *max {
                        errors.push(path, format!("must contain at most {max} items"));
                    }
                }
                for (i, item) in values.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    if item.is_null() {
                        errors.push(&item_path, "must not be null");
                    } else {
                        items.check(&item_path, item, errors);
                    }
                }
            }
            (Kind::Object(schema), Value::Object(map)) => schema.check(path, map, errors),
            (kind, _) => errors.push(path, format!("must be {}", kind.describe())),
        }
    }
}

fn check_bounds<T: PartialOrd + fmt::Display>(
    path: &str,
    v: T,
    min: Option<T>,
    max: Option<T>,
    errors: &mut ValidationErrors,
) {
    if let Some(min) = min {
        if v < min {
            errors.push(path, format!("must be at least {min}"));
        }
    }
    if let Some(max) = max {
        if v > max {
            errors.push(path, format!("must be at most {max}"));
        }
    }
}

impl Kind {
    fn describe(&self) -> &'static str {
        match self {
            Kind::Str { .. } => "a string",
            Kind::Integer { .. } => "an integer",
            Kind::Number { .. } => "a number",
            Kind::Boolean => "a boolean",
            Kind::Array { .. } => "an array",
            Kind::Object(_) => "an object",
        }
    }
}

/// The accepted shape of a JSON object.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, Rule)>,
    allow_unknown: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, rule: Rule) -> Self {
        self.fields.push((name.to_string(), rule));
        self
    }

    /// Accept fields the schema does not name. Off by default.
    pub fn allow_unknown_fields(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    /// Check `value` against the schema, reporting every violation.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match value {
            Value::Object(map) => self.check("", map, &mut errors),
            _ => errors.push("$", "must be an object"),
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, then deserialize into the endpoint's request type.
    pub fn parse<T: DeserializeOwned>(&self, value: Value) -> Result<T, ValidationErrors> {
        self.validate(&value)?;
        serde_json::from_value(value).map_err(|e| ValidationErrors::single("$", e.to_string()))
    }

    fn check(&self, prefix: &str, map: &Map<String, Value>, errors: &mut ValidationErrors) {
        for (name, rule) in &self.fields {
            let path = join_path(prefix, name);
            match map.get(name) {
                None | Some(Value::Null) => {
                    if rule.required {
                        errors.push(&path, "is required");
                    }
                }
                Some(value) => rule.check(&path, value, errors),
            }
        }
        if !self.allow_unknown {
            for key in map.keys() {
                if !self.fields.iter().any(|(name, _)| name == key) {
                    errors.push(&join_path(prefix, key), "is not an accepted field");
                }
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// A request body type with a registered schema.
pub trait RequestSchema: DeserializeOwned {
    fn schema() -> &'static Schema;

    /// Top-level fields exempt from sanitization.
    fn raw_fields() -> &'static [&'static str] {
        &[]
    }
}
