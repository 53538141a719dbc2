//! Effective parameter values.
//!
//! Each parameter is either explicit (caller supplied), derived (from another
//! parameter's basename through its name template), or undefined. After all
//! values are known, `requires` predicates mark parameters whose
//! prerequisites are falsy or undefined as suppressed: the value stays
//! readable but no token is emitted.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::descriptor::ParameterDescriptor;
use super::schema::Schema;
use super::value::{Value, basename_stem};
use crate::error::{CompileError, CompileResult};

/// Caller-supplied values keyed by parameter name.
pub type Inputs = BTreeMap<String, Value>;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Explicit,
    Derived,
}

/// A defined parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub value: Value,
    pub origin: Origin,
    /// A `requires` prerequisite was falsy; no token is produced.
    pub suppressed: bool,
}

/// Resolved values for a whole schema. Undefined parameters are absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Resolution {
    values: BTreeMap<String, Resolved>,
}

impl Resolution {
    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.values.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(|resolved| &resolved.value)
    }

    /// Undefined counts as falsy.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.value(name).is_some_and(Value::is_truthy)
    }

    pub fn into_values(self) -> BTreeMap<String, Resolved> {
        self.values
    }
}

/// Resolve a single descriptor.
///
/// Returns `None` when the parameter is undefined. `resolved` holds the
/// values already computed for other parameters.
pub fn resolve(
    descriptor: &ParameterDescriptor,
    explicit: Option<&Value>,
    resolved: &BTreeMap<String, Resolved>,
) -> CompileResult<Option<(Value, Origin)>> {
    if let Some(value) = explicit {
        descriptor.check_value(value)?;
        return Ok(Some((value.clone(), Origin::Explicit)));
    }

    let (Some(source), Some(template)) = (&descriptor.name_source, &descriptor.name_template)
    else {
        return Ok(None);
    };
    let Some(source_value) = resolved.get(source).map(|r| &r.value) else {
        return Ok(None);
    };
    let source_text = match source_value {
        Value::Str(s) => s.clone(),
        Value::Int(_) | Value::Float(_) => source_value.to_string(),
        other => {
            return Err(CompileError::InvalidValue {
                name: descriptor.name.clone(),
                reason: format!("cannot derive a name from {} parameter {}", other.type_name(), source),
            });
        }
    };
    let derived = Value::Str(template.apply(&basename_stem(&source_text)));
    descriptor.check_value(&derived)?;
    Ok(Some((derived, Origin::Derived)))
}

/// Resolve every descriptor in `schema`, then apply `requires` suppression
/// and mandatory checks.
pub fn resolve_all(schema: &Schema, inputs: &Inputs) -> CompileResult<Resolution> {
    if let Some(unknown) = inputs.keys().find(|name| !schema.contains(name)) {
        return Err(CompileError::UnknownParameter(unknown.clone()));
    }

    let mut state = Walk {
        schema,
        inputs,
        resolved: BTreeMap::new(),
        undefined: BTreeSet::new(),
        visiting: BTreeSet::new(),
    };
    for param in schema.params() {
        state.visit(&param.name)?;
    }
    let mut values = state.resolved;

    let suppressed: Vec<String> = schema
        .params()
        .iter()
        .filter(|param| {
            param.requires.iter().any(|required| {
                !values
                    .get(required)
                    .is_some_and(|resolved| resolved.value.is_truthy())
            })
        })
        .map(|param| param.name.clone())
        .collect();
    for name in suppressed {
        if let Some(resolved) = values.get_mut(&name) {
            resolved.suppressed = true;
        }
    }

    for param in schema.params() {
        if param.mandatory && !values.contains_key(&param.name) {
            return Err(CompileError::MissingMandatoryParameter(param.name.clone()));
        }
    }

    Ok(Resolution { values })
}

struct Walk<'a> {
    schema: &'a Schema,
    inputs: &'a Inputs,
    resolved: BTreeMap<String, Resolved>,
    undefined: BTreeSet<String>,
    visiting: BTreeSet<String>,
}

impl Walk<'_> {
    fn visit(&mut self, name: &str) -> CompileResult<()> {
        if self.resolved.contains_key(name) || self.undefined.contains(name) {
            return Ok(());
        }
        if !self.visiting.insert(name.to_string()) {
            return Err(CompileError::DerivationCycle(name.to_string()));
        }
        let (schema, inputs) = (self.schema, self.inputs);
        let Some(descriptor) = schema.get(name) else {
            return Err(CompileError::UnknownParameter(name.to_string()));
        };

        let explicit = inputs.get(name);
        if explicit.is_none()
            && let Some(source) = &descriptor.name_source
        {
            self.visit(source)?;
        }

        match resolve(descriptor, explicit, &self.resolved)? {
            Some((value, origin)) => {
                self.resolved.insert(
                    name.to_string(),
                    Resolved {
                        value,
                        origin,
                        suppressed: false,
                    },
                );
            }
            None => {
                self.undefined.insert(name.to_string());
            }
        }
        self.visiting.remove(name);
        Ok(())
    }
}
