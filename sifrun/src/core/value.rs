//! Parameter values supplied by callers or derived during resolution.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A parameter value.
///
/// Deserializes untagged so task files can write plain TOML/JSON scalars and
/// string arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl Value {
    /// Truthiness used by `requires` predicates.
    ///
    /// `false`, `0`, `0.0`, `""` and `[]` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short kind label for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            // Whole floats keep one decimal: `1.0`, not `1`.
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::List(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Filename of `path` with its final extension removed.
///
/// `/data/subj.nrrd` -> `subj`, `/data/subj.tar.gz` -> `subj.tar`.
pub fn basename_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_pipeline_conventions() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::List(Vec::new()).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Str("x".to_string()).is_truthy());
        assert!(Value::from(vec!["a"]).is_truthy());
    }

    #[test]
    fn float_display_keeps_fractional_part() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(-3.0).to_string(), "-3.0");
        assert_eq!(Value::Float(0.15).to_string(), "0.15");
        assert_eq!(Value::Int(1).to_string(), "1");
    }

    #[test]
    fn basename_stem_strips_only_final_extension() {
        assert_eq!(basename_stem("/data/subj.nrrd"), "subj");
        assert_eq!(basename_stem("/data/subj.tar.gz"), "subj.tar");
        assert_eq!(basename_stem("relative/noext"), "noext");
        assert_eq!(basename_stem("test_container/test.img"), "test");
    }

    #[test]
    fn untagged_deserialize_picks_natural_variant() {
        let parsed: Vec<Value> =
            serde_json::from_str(r#"[true, 3, 1.5, "s", ["a", "b"]]"#).expect("parse");
        assert_eq!(
            parsed,
            vec![
                Value::Bool(true),
                Value::Int(3),
                Value::Float(1.5),
                Value::Str("s".to_string()),
                Value::from(vec!["a", "b"]),
            ]
        );
    }
}
