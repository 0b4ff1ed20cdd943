//! Schema-validated attribute records.
//!
//! A [`Record`] is a fixed set of named slots described by a static
//! [`Schema`]. Every slot has a declared [`FieldKind`]; assignments go through
//! a single cast path and are rejected with a [`SchemaViolation`] when the
//! field is undeclared or the value cannot be cast. A rejected assignment
//! leaves the record untouched.
//!
//! Each slot may also carry a unit tag (see [`UnitValue`]), which is how
//! `temperature 300.0 K` style lines keep their unit across a round trip.

use super::value::{UnitValue, format_real, is_numeric, parse_real};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("'{field}' is not a declared field of {record}")]
    Undeclared { record: &'static str, field: String },

    #[error("cannot cast {found} into {expected} for field '{field}'")]
    InvalidCast {
        field: String,
        expected: String,
        found: String,
    },

    #[error("field '{field}' expects {expected} element(s), found {found}")]
    TupleArity {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("field '{field}' requires a value")]
    MissingValue { field: String },
}

impl SchemaViolation {
    fn invalid_cast(field: &str, expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Self::InvalidCast {
            field: field.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Str,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Str => "str",
        }
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarKind::Int | ScalarKind::Float)
    }

    /// Casts an already-typed value. Returns `None` when no lossless cast exists.
    pub fn cast(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ScalarKind::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
            (ScalarKind::Bool, Value::Int(i)) => Some(Value::Bool(*i != 0)),
            (ScalarKind::Bool, Value::Str(s)) => parse_switch(s).map(Value::Bool),

            (ScalarKind::Int, Value::Int(i)) => Some(Value::Int(*i)),
            (ScalarKind::Int, Value::Float(f)) => integral(*f).map(Value::Int),
            (ScalarKind::Int, Value::Str(s)) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| parse_real(s).and_then(integral))
                .map(Value::Int),

            (ScalarKind::Float, Value::Float(f)) => Some(Value::Float(*f)),
            (ScalarKind::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
            (ScalarKind::Float, Value::Str(s)) => parse_real(s).map(Value::Float),

            (ScalarKind::Str, Value::Str(s)) => Some(Value::Str(s.clone())),
            (ScalarKind::Str, Value::Int(_) | Value::Float(_) | Value::Bool(_)) => {
                Some(Value::Str(value.to_string()))
            }

            _ => None,
        }
    }

    pub fn parse(self, token: &str) -> Option<Value> {
        self.cast(&Value::Str(token.to_string()))
    }
}

fn parse_switch(token: &str) -> Option<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | ".true." => Some(true),
        "off" | "false" | "no" | "0" | ".false." => Some(false),
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Tuple(&'static [ScalarKind]),
    Nested(&'static Schema),
}

impl FieldKind {
    pub fn describe(&self) -> String {
        match self {
            FieldKind::Scalar(k) => k.name().to_string(),
            FieldKind::Tuple(kinds) => {
                let names: Vec<_> = kinds.iter().map(|k| k.name()).collect();
                format!("({})", names.join(", "))
            }
            FieldKind::Nested(schema) => schema.name.to_string(),
        }
    }

    /// Whether a trailing non-numeric token may be read as a unit tag.
    fn accepts_unit(&self) -> bool {
        match self {
            FieldKind::Scalar(k) => k.is_numeric(),
            FieldKind::Tuple(kinds) => kinds.last().is_some_and(|k| k.is_numeric()),
            FieldKind::Nested(_) => false,
        }
    }

    pub fn cast(&self, field: &str, value: Value) -> Result<Value, SchemaViolation> {
        match self {
            FieldKind::Scalar(kind) => {
                let candidate = match value {
                    Value::Tuple(mut items) if items.len() == 1 => items.remove(0),
                    other => other,
                };
                kind.cast(&candidate).ok_or_else(|| {
                    SchemaViolation::invalid_cast(field, kind.name(), candidate.kind_name())
                })
            }
            FieldKind::Tuple(kinds) => {
                let items = match value {
                    Value::Tuple(items) => items,
                    other => vec![other],
                };
                if items.len() != kinds.len() {
                    return Err(SchemaViolation::TupleArity {
                        field: field.to_string(),
                        expected: kinds.len(),
                        found: items.len(),
                    });
                }
                items
                    .iter()
                    .zip(kinds.iter())
                    .map(|(item, kind)| {
                        kind.cast(item).ok_or_else(|| {
                            SchemaViolation::invalid_cast(field, self.describe(), item)
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Tuple)
            }
            FieldKind::Nested(schema) => match value {
                Value::Record(source) if source.schema.name == schema.name => {
                    let mut rebuilt = Record::new(schema);
                    for (desc, entry) in source.entries() {
                        rebuilt.set_with_unit(desc.name, entry.value.clone(), entry.unit.clone())?;
                    }
                    Ok(Value::Record(Box::new(rebuilt)))
                }
                other => Err(SchemaViolation::invalid_cast(
                    field,
                    schema.name,
                    other.kind_name(),
                )),
            },
        }
    }

    /// Casts textual tokens, splitting a trailing non-numeric token off as
    /// a unit tag when the declared kind is numeric.
    pub fn parse_tokens(
        &self,
        field: &str,
        tokens: &[&str],
    ) -> Result<UnitValue<Value>, SchemaViolation> {
        let expected = match self {
            FieldKind::Scalar(ScalarKind::Bool) => {
                return match tokens {
                    [] => Ok(UnitValue::new(Value::Bool(true))),
                    [token] => parse_switch(token)
                        .map(|b| UnitValue::new(Value::Bool(b)))
                        .ok_or_else(|| SchemaViolation::invalid_cast(field, "bool", token)),
                    _ => Err(SchemaViolation::TupleArity {
                        field: field.to_string(),
                        expected: 1,
                        found: tokens.len(),
                    }),
                };
            }
            FieldKind::Scalar(ScalarKind::Str) => {
                return Ok(UnitValue::new(Value::Str(tokens.join(" "))));
            }
            FieldKind::Scalar(_) => 1,
            FieldKind::Tuple(kinds) => kinds.len(),
            FieldKind::Nested(schema) => {
                return Err(SchemaViolation::invalid_cast(field, schema.name, "text"));
            }
        };

        if tokens.is_empty() {
            return Err(SchemaViolation::MissingValue {
                field: field.to_string(),
            });
        }

        let (values, unit) = match tokens.split_last() {
            Some((last, rest))
                if tokens.len() == expected + 1 && self.accepts_unit() && !is_numeric(last) =>
            {
                (rest, Some(last.to_string()))
            }
            _ => (tokens, None),
        };

        let raw = match values {
            [single] => Value::Str(single.to_string()),
            many => Value::Tuple(many.iter().map(|t| Value::Str(t.to_string())).collect()),
        };
        let value = self.cast(field, raw)?;
        Ok(UnitValue { value, unit })
    }
}

#[derive(Debug, Clone)]
pub enum Preset {
    Unset,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'static str),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: Preset,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            default: Preset::Unset,
        }
    }

    pub const fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self::new(name, FieldKind::Scalar(kind))
    }

    pub const fn tuple(name: &'static str, kinds: &'static [ScalarKind]) -> Self {
        Self::new(name, FieldKind::Tuple(kinds))
    }

    pub const fn nested(name: &'static str, schema: &'static Schema) -> Self {
        Self::new(name, FieldKind::Nested(schema))
    }

    pub const fn with_default(self, default: Preset) -> Self {
        Self {
            name: self.name,
            kind: self.kind,
            default,
        }
    }

    fn initial(&self) -> Option<UnitValue<Value>> {
        let value = match (&self.kind, &self.default) {
            (FieldKind::Nested(schema), _) => Value::Record(Box::new(Record::new(schema))),
            (_, Preset::Unset) => return None,
            (_, Preset::Bool(b)) => Value::Bool(*b),
            (_, Preset::Int(i)) => Value::Int(*i),
            (_, Preset::Float(f)) => Value::Float(*f),
            (_, Preset::Str(s)) => Value::Str(s.to_string()),
        };
        Some(UnitValue::new(value))
    }
}

/// Static field-descriptor table for one record type.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl Schema {
    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|d| d.name == field)
    }

    pub fn descriptor(&self, field: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|d| d.name == field)
    }

    #[inline]
    pub fn declares(&self, field: &str) -> bool {
        self.position(field).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    Record(Box<Record>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(&**r),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => f.write_str("ON"),
            Value::Bool(false) => f.write_str("OFF"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_real(*x)),
            Value::Str(s) => f.write_str(s),
            Value::Tuple(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Record(r) => write!(f, "<{}>", r.schema.name),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Tuple(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Box::new(v))
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    schema: &'static Schema,
    slots: Vec<Option<UnitValue<Value>>>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name && self.slots == other.slots
    }
}

impl Record {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            slots: schema.fields.iter().map(FieldDescriptor::initial).collect(),
        }
    }

    #[inline]
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    fn locate(&self, field: &str) -> Result<usize, SchemaViolation> {
        self.schema
            .position(field)
            .ok_or_else(|| SchemaViolation::Undeclared {
                record: self.schema.name,
                field: field.to_string(),
            })
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), SchemaViolation> {
        self.set_with_unit(field, value, None)
    }

    pub fn set_with_unit(
        &mut self,
        field: &str,
        value: impl Into<Value>,
        unit: Option<String>,
    ) -> Result<(), SchemaViolation> {
        let idx = self.locate(field)?;
        let value = self.schema.fields[idx].kind.cast(field, value.into())?;
        self.slots[idx] = Some(UnitValue { value, unit });
        Ok(())
    }

    pub fn set_tokens(&mut self, field: &str, tokens: &[&str]) -> Result<(), SchemaViolation> {
        let idx = self.locate(field)?;
        let entry = self.schema.fields[idx].kind.parse_tokens(field, tokens)?;
        self.slots[idx] = Some(entry);
        Ok(())
    }

    pub fn unset(&mut self, field: &str) -> Result<(), SchemaViolation> {
        let idx = self.locate(field)?;
        let desc = &self.schema.fields[idx];
        self.slots[idx] = match desc.kind {
            FieldKind::Nested(_) => desc.initial(),
            _ => None,
        };
        Ok(())
    }

    pub fn get(&self, field: &str) -> Result<Option<&Value>, SchemaViolation> {
        Ok(self.entry(field)?.map(|e| &e.value))
    }

    pub fn entry(&self, field: &str) -> Result<Option<&UnitValue<Value>>, SchemaViolation> {
        let idx = self.locate(field)?;
        Ok(self.slots[idx].as_ref())
    }

    pub fn is_set(&self, field: &str) -> bool {
        matches!(self.entry(field), Ok(Some(_)))
    }

    /// Unset flags read as `false`.
    pub fn get_bool(&self, field: &str) -> Result<bool, SchemaViolation> {
        self.typed(field, "bool", Value::as_bool)
            .map(|v| v.unwrap_or(false))
    }

    pub fn get_int(&self, field: &str) -> Result<Option<i64>, SchemaViolation> {
        self.typed(field, "int", Value::as_int)
    }

    pub fn get_float(&self, field: &str) -> Result<Option<f64>, SchemaViolation> {
        self.typed(field, "float", Value::as_float)
    }

    pub fn get_str(&self, field: &str) -> Result<Option<&str>, SchemaViolation> {
        self.typed(field, "str", Value::as_str)
    }

    fn typed<'a, T>(
        &'a self,
        field: &str,
        expected: &str,
        extract: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<Option<T>, SchemaViolation> {
        match self.get(field)? {
            None => Ok(None),
            Some(value) => extract(value)
                .map(Some)
                .ok_or_else(|| SchemaViolation::invalid_cast(field, expected, value.kind_name())),
        }
    }

    pub fn nested(&self, field: &str) -> Result<&Record, SchemaViolation> {
        match self.get(field)? {
            Some(Value::Record(r)) => Ok(&**r),
            _ => Err(SchemaViolation::invalid_cast(field, "record", "scalar")),
        }
    }

    pub fn nested_mut(&mut self, field: &str) -> Result<&mut Record, SchemaViolation> {
        let idx = self.locate(field)?;
        match self.slots[idx].as_mut().map(|e| &mut e.value) {
            Some(Value::Record(r)) => Ok(&mut **r),
            _ => Err(SchemaViolation::invalid_cast(field, "record", "scalar")),
        }
    }

    /// Set slots in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static FieldDescriptor, &UnitValue<Value>)> {
        self.schema
            .fields
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(desc, slot)| slot.as_ref().map(|entry| (desc, entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: Schema = Schema {
        name: "inner",
        fields: &[
            FieldDescriptor::scalar("every", ScalarKind::Int),
            FieldDescriptor::scalar("label", ScalarKind::Str),
        ],
    };

    static OUTER: Schema = Schema {
        name: "outer",
        fields: &[
            FieldDescriptor::scalar("temperature", ScalarKind::Float)
                .with_default(Preset::Float(300.0)),
            FieldDescriptor::scalar("steps", ScalarKind::Int),
            FieldDescriptor::scalar("collect", ScalarKind::Bool),
            FieldDescriptor::tuple("seed", &[ScalarKind::Int, ScalarKind::Int]),
            FieldDescriptor::tuple(
                "minimise",
                &[ScalarKind::Str, ScalarKind::Int, ScalarKind::Float],
            ),
            FieldDescriptor::nested("inner", &INNER),
        ],
    };

    #[test]
    fn defaults_are_applied_and_unset_fields_are_absent() {
        let rec = Record::new(&OUTER);
        assert_eq!(rec.get_float("temperature").unwrap(), Some(300.0));
        assert_eq!(rec.get("steps").unwrap(), None);
        assert!(!rec.get_bool("collect").unwrap());
        assert!(rec.nested("inner").is_ok());
    }

    #[test]
    fn set_then_get_returns_cast_value() {
        let mut rec = Record::new(&OUTER);
        rec.set("steps", 20).unwrap();
        rec.set("temperature", 310).unwrap();
        rec.set("seed", vec![Value::from("1"), Value::from(2)]).unwrap();

        assert_eq!(rec.get_int("steps").unwrap(), Some(20));
        assert_eq!(rec.get_float("temperature").unwrap(), Some(310.0));
        assert_eq!(
            rec.get("seed").unwrap(),
            Some(&Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn undeclared_field_is_rejected() {
        let mut rec = Record::new(&OUTER);
        let err = rec.set("pressure", 1.0).unwrap_err();
        assert!(matches!(err, SchemaViolation::Undeclared { record: "outer", .. }));
        assert!(rec.get("pressure").is_err());
    }

    #[test]
    fn failed_cast_keeps_previous_value() {
        let mut rec = Record::new(&OUTER);
        rec.set("steps", 5).unwrap();
        let err = rec.set("steps", "many").unwrap_err();
        assert!(matches!(err, SchemaViolation::InvalidCast { .. }));
        assert_eq!(rec.get_int("steps").unwrap(), Some(5));

        let err = rec.set("steps", 2.5).unwrap_err();
        assert!(matches!(err, SchemaViolation::InvalidCast { .. }));
    }

    #[test]
    fn tuple_arity_is_enforced() {
        let mut rec = Record::new(&OUTER);
        let err = rec
            .set("seed", vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::TupleArity {
                field: "seed".into(),
                expected: 2,
                found: 3
            }
        );
        assert!(rec.set("seed", 7).is_err());
    }

    #[test]
    fn tokens_split_trailing_unit() {
        let mut rec = Record::new(&OUTER);
        rec.set_tokens("temperature", &["295.5", "K"]).unwrap();
        let entry = rec.entry("temperature").unwrap().unwrap();
        assert_eq!(entry.value, Value::Float(295.5));
        assert_eq!(entry.unit(), Some("K"));

        rec.set_tokens("minimise", &["energy", "100", "0.01"]).unwrap();
        assert!(rec.entry("minimise").unwrap().unwrap().unit.is_none());

        let err = rec.set_tokens("temperature", &["hot", "K"]).unwrap_err();
        assert!(matches!(err, SchemaViolation::InvalidCast { .. }));
    }

    #[test]
    fn bare_flag_token_means_true() {
        let mut rec = Record::new(&OUTER);
        rec.set_tokens("collect", &[]).unwrap();
        assert!(rec.get_bool("collect").unwrap());
        rec.set_tokens("collect", &["off"]).unwrap();
        assert!(!rec.get_bool("collect").unwrap());
    }

    #[test]
    fn nested_records_are_cast_recursively() {
        let mut inner = Record::new(&INNER);
        inner.set("every", 10).unwrap();
        let mut rec = Record::new(&OUTER);
        rec.set("inner", inner).unwrap();
        assert_eq!(rec.nested("inner").unwrap().get_int("every").unwrap(), Some(10));

        rec.nested_mut("inner").unwrap().set("label", "rdf").unwrap();
        assert_eq!(
            rec.nested("inner").unwrap().get_str("label").unwrap(),
            Some("rdf")
        );

        let wrong = Record::new(&OUTER);
        assert!(rec.set("inner", wrong).is_err());
    }

    #[test]
    fn entries_follow_declaration_order() {
        let mut rec = Record::new(&OUTER);
        rec.set("collect", true).unwrap();
        rec.set("steps", 3).unwrap();
        let names: Vec<_> = rec.entries().map(|(d, _)| d.name).collect();
        assert_eq!(names, vec!["temperature", "steps", "collect", "inner"]);

        rec.unset("steps").unwrap();
        assert!(!rec.is_set("steps"));
    }
}
