//! Declarative parameter descriptors.

use serde::{Deserialize, Serialize};

use super::template::{ArgTemplate, NameTemplate};
use super::value::Value;
use crate::error::{CompileError, CompileResult};

/// Parameter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    /// Boolean that emits its literal argstr when true.
    Flag,
    /// Boolean toggle, usually read by other parameters or the runtime.
    Boolean,
    Scalar,
    Path,
    PathList,
}

impl ParamKind {
    pub fn label(self) -> &'static str {
        match self {
            ParamKind::Flag => "flag",
            ParamKind::Boolean => "boolean",
            ParamKind::Scalar => "scalar",
            ParamKind::Path => "path",
            ParamKind::PathList => "path-list",
        }
    }

    fn is_boolean(self) -> bool {
        matches!(self, ParamKind::Flag | ParamKind::Boolean)
    }
}

/// Ordering class derived from a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PositionClass {
    Leading,
    Unordered,
    Trailing,
}

impl PositionClass {
    pub fn of(position: Option<i32>) -> Self {
        match position {
            None => PositionClass::Unordered,
            Some(p) if p >= 0 => PositionClass::Leading,
            Some(_) => PositionClass::Trailing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PositionClass::Leading => "leading",
            PositionClass::Unordered => "unordered",
            PositionClass::Trailing => "trailing",
        }
    }
}

/// One named parameter of a task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argstr: Option<ArgTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_template: Option<NameTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(default)]
    pub is_container_path: bool,
    #[serde(default)]
    pub exists_required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            argstr: None,
            position: None,
            mandatory: false,
            name_source: None,
            name_template: None,
            requires: Vec::new(),
            is_container_path: false,
            exists_required: false,
            desc: String::new(),
        }
    }

    pub fn flag(name: impl Into<String>, argstr: &str) -> CompileResult<Self> {
        Self::new(name, ParamKind::Flag).with_argstr(argstr)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean)
    }

    pub fn scalar(name: impl Into<String>, argstr: &str) -> CompileResult<Self> {
        Self::new(name, ParamKind::Scalar).with_argstr(argstr)
    }

    pub fn path(name: impl Into<String>, argstr: &str) -> CompileResult<Self> {
        Self::new(name, ParamKind::Path).with_argstr(argstr)
    }

    pub fn path_list(name: impl Into<String>, argstr: &str) -> CompileResult<Self> {
        Self::new(name, ParamKind::PathList).with_argstr(argstr)
    }

    pub fn with_argstr(mut self, argstr: &str) -> CompileResult<Self> {
        self.argstr = Some(ArgTemplate::parse(argstr)?);
        Ok(self)
    }

    pub fn at(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn derived_from(mut self, source: impl Into<String>, template: &str) -> CompileResult<Self> {
        self.name_source = Some(source.into());
        self.name_template = Some(NameTemplate::parse(template)?);
        Ok(self)
    }

    pub fn requires(mut self, names: &[&str]) -> Self {
        self.requires = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn container_path(mut self) -> Self {
        self.is_container_path = true;
        self
    }

    pub fn must_exist(mut self) -> Self {
        self.exists_required = true;
        self
    }

    pub fn describe(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn position_class(&self) -> PositionClass {
        PositionClass::of(self.position)
    }

    /// Check internal consistency: template shape vs. kind, derivation fields.
    pub fn validate(&self) -> CompileResult<()> {
        let invalid = |reason: String| {
            CompileError::InvalidSchema(format!("parameter {}: {}", self.name, reason))
        };
        if self.name.trim().is_empty() {
            return Err(CompileError::InvalidSchema(
                "parameter name must be non-empty".to_string(),
            ));
        }
        if self.name_source.is_some() != self.name_template.is_some() {
            return Err(invalid(
                "name_source and name_template must be set together".to_string(),
            ));
        }
        if let Some(argstr) = &self.argstr {
            if self.kind.is_boolean() && argstr.has_placeholder() {
                return Err(invalid(format!(
                    "{} template '{}' must not contain a placeholder",
                    self.kind.label(),
                    argstr
                )));
            }
            if !self.kind.is_boolean() && !argstr.has_placeholder() {
                return Err(invalid(format!(
                    "{} template '{}' needs a placeholder",
                    self.kind.label(),
                    argstr
                )));
            }
            if argstr.is_repeated() && self.kind != ParamKind::PathList {
                return Err(invalid(format!(
                    "only path-list templates may end with '...', got '{argstr}'"
                )));
            }
        }
        if self.exists_required && !matches!(self.kind, ParamKind::Path | ParamKind::PathList) {
            return Err(invalid("exists_required applies to path kinds only".to_string()));
        }
        if self.requires.iter().any(|name| name == &self.name) {
            return Err(invalid("parameter cannot require itself".to_string()));
        }
        Ok(())
    }

    /// Check that `value` fits this descriptor's kind.
    pub fn check_value(&self, value: &Value) -> CompileResult<()> {
        let fits = match self.kind {
            ParamKind::Flag | ParamKind::Boolean => matches!(value, Value::Bool(_)),
            ParamKind::Scalar => matches!(value, Value::Str(_) | Value::Int(_) | Value::Float(_)),
            ParamKind::Path => matches!(value, Value::Str(_)),
            ParamKind::PathList => matches!(value, Value::List(_) | Value::Str(_)),
        };
        if fits {
            return Ok(());
        }
        Err(CompileError::InvalidValue {
            name: self.name.clone(),
            reason: format!(
                "{} value does not fit {} parameter",
                value.type_name(),
                self.kind.label()
            ),
        })
    }
}
