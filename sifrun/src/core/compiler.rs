//! Argument compiler: merged schema + inputs + mounts -> ordered command.
//!
//! Tokens are bucketed by position class and emitted as
//! leading (ascending position) ++ unordered (by parameter name) ++ trailing
//! (ascending position), after the runtime prefix. Equal positions keep the
//! merged declaration order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::command::{CompiledCommand, Token};
use super::descriptor::{ParamKind, ParameterDescriptor};
use super::mount::{MountRule, parse_joined, translate};
use super::probe::PathProbe;
use super::resolver::{Inputs, Resolution, resolve_all};
use super::schema::{Schema, merge};
use super::template::ArgTemplate;
use super::value::Value;
use crate::error::{CompileError, CompileResult};

/// Base parameter whose truthiness adds the runtime's debug token.
pub const DEBUG_PARAM: &str = "debug";
/// Base parameter that receives the mount rules as `host:container` strings.
pub const MOUNTS_PARAM: &str = "bind_mounts";

/// Words that start every compiled command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSpec {
    /// Container runtime executable.
    pub binary: String,
    /// Subcommand that runs an image.
    pub subcommand: String,
    /// Inserted between binary and subcommand when `debug` is truthy.
    pub debug_token: String,
}

impl Default for RuntimeSpec {
    fn default() -> Self {
        Self {
            binary: "singularity".to_string(),
            subcommand: "run".to_string(),
            debug_token: "--debug".to_string(),
        }
    }
}

impl RuntimeSpec {
    pub fn prefix(&self, debug: bool) -> Vec<String> {
        let mut prefix = vec![self.binary.clone()];
        if debug {
            prefix.push(self.debug_token.clone());
        }
        prefix.push(self.subcommand.clone());
        prefix
    }
}

/// Compiles schemas into commands. Holds no per-compilation state.
#[derive(Debug, Clone)]
pub struct Compiler<P> {
    runtime: RuntimeSpec,
    probe: P,
}

impl<P: PathProbe> Compiler<P> {
    pub fn new(runtime: RuntimeSpec, probe: P) -> Self {
        Self { runtime, probe }
    }

    pub fn runtime(&self) -> &RuntimeSpec {
        &self.runtime
    }

    /// Merge `base` with `extension` and compile.
    pub fn compile(
        &self,
        base: &Schema,
        extension: &Schema,
        inputs: &Inputs,
        mounts: &[MountRule],
    ) -> CompileResult<CompiledCommand> {
        let schema = merge(base, extension)?;
        self.compile_merged(&schema, inputs, mounts)
    }

    /// Compile an already merged schema.
    pub fn compile_merged(
        &self,
        schema: &Schema,
        inputs: &Inputs,
        mounts: &[MountRule],
    ) -> CompileResult<CompiledCommand> {
        let explicit_mounts = match inputs.get(MOUNTS_PARAM) {
            Some(value) if mounts.is_empty() && schema.contains(MOUNTS_PARAM) => {
                explicit_mount_rules(value)?
            }
            _ => Vec::new(),
        };
        let mounts = if explicit_mounts.is_empty() {
            mounts
        } else {
            explicit_mounts.as_slice()
        };

        let mut inputs = inputs.clone();
        if !mounts.is_empty() && schema.contains(MOUNTS_PARAM) {
            let specs = mounts.iter().map(MountRule::bind_spec).collect();
            inputs.insert(MOUNTS_PARAM.to_string(), Value::List(specs));
        }
        let resolution = resolve_all(schema, &inputs)?;
        self.check_host_paths(schema, &resolution)?;

        let mut leading: Vec<(i32, Token)> = Vec::new();
        let mut unordered: Vec<Token> = Vec::new();
        let mut trailing: Vec<(i32, Token)> = Vec::new();

        for param in schema.params() {
            let Some(resolved) = resolution.get(&param.name) else {
                continue;
            };
            if resolved.suppressed {
                continue;
            }
            let Some(template) = &param.argstr else {
                continue;
            };
            let tokens = self.emit(param, template, &resolved.value, mounts)?;
            match param.position {
                Some(position) if position >= 0 => {
                    leading.extend(tokens.into_iter().map(|token| (position, token)));
                }
                Some(position) => {
                    trailing.extend(tokens.into_iter().map(|token| (position, token)));
                }
                None => unordered.extend(tokens),
            }
        }

        leading.sort_by_key(|(position, _)| *position);
        unordered.sort_by(|a, b| a.param.cmp(&b.param));
        trailing.sort_by_key(|(position, _)| *position);

        let tokens = leading
            .into_iter()
            .map(|(_, token)| token)
            .chain(unordered)
            .chain(trailing.into_iter().map(|(_, token)| token))
            .collect();

        Ok(CompiledCommand {
            prefix: self.runtime.prefix(resolution.is_truthy(DEBUG_PARAM)),
            tokens,
            resolved: resolution.into_values(),
        })
    }

    fn emit(
        &self,
        param: &ParameterDescriptor,
        template: &ArgTemplate,
        value: &Value,
        mounts: &[MountRule],
    ) -> CompileResult<Vec<Token>> {
        match param.kind {
            ParamKind::Flag | ParamKind::Boolean => {
                if value.as_bool() == Some(true) {
                    Ok(vec![Token::argument(&param.name, template.literal_words())])
                } else {
                    Ok(Vec::new())
                }
            }
            ParamKind::Scalar => Ok(vec![make_token(param, template, value)?]),
            ParamKind::Path => {
                let host = value.as_str().ok_or_else(|| not_a_path(param, value))?;
                let shown = container_view(param, host, mounts);
                Ok(vec![make_token(param, template, &Value::Str(shown))?])
            }
            ParamKind::PathList => path_elements(param, value)?
                .into_iter()
                .map(|host| {
                    let shown = container_view(param, host, mounts);
                    make_token(param, template, &Value::Str(shown))
                })
                .collect(),
        }
    }

    /// Every defined `exists_required` value must name an existing host path,
    /// whether or not it is emitted. Runs before any translation.
    fn check_host_paths(&self, schema: &Schema, resolution: &Resolution) -> CompileResult<()> {
        for param in schema.params().iter().filter(|param| param.exists_required) {
            let Some(value) = resolution.value(&param.name) else {
                continue;
            };
            if let Some(missing) = path_elements(param, value)?
                .into_iter()
                .find(|host| !self.probe.exists(Path::new(host)))
            {
                return Err(CompileError::HostPathNotFound {
                    name: param.name.clone(),
                    path: missing.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Host path as the tool sees it: translated for container paths.
fn container_view(param: &ParameterDescriptor, host: &str, mounts: &[MountRule]) -> String {
    if param.is_container_path {
        return translate(host, mounts);
    }
    host.to_string()
}

fn path_elements<'a>(param: &ParameterDescriptor, value: &'a Value) -> CompileResult<Vec<&'a str>> {
    match value {
        Value::List(items) => Ok(items.iter().map(String::as_str).collect()),
        Value::Str(single) => Ok(vec![single.as_str()]),
        other => Err(not_a_path(param, other)),
    }
}

/// Rules from an explicit `bind_mounts` input, in `host:container` form.
fn explicit_mount_rules(value: &Value) -> CompileResult<Vec<MountRule>> {
    match value {
        Value::List(entries) => parse_joined(entries),
        Value::Str(entry) => parse_joined(std::slice::from_ref(entry)),
        other => Err(CompileError::InvalidValue {
            name: MOUNTS_PARAM.to_string(),
            reason: format!("{} value is not a mount list", other.type_name()),
        }),
    }
}

fn make_token(
    param: &ParameterDescriptor,
    template: &ArgTemplate,
    value: &Value,
) -> CompileResult<Token> {
    let words = template.fill(&param.name, value)?;
    if template.is_redirect() {
        return Ok(Token::redirect(&param.name, words, value.to_string()));
    }
    Ok(Token::argument(&param.name, words))
}

fn not_a_path(param: &ParameterDescriptor, value: &Value) -> CompileError {
    CompileError::InvalidValue {
        name: param.name.clone(),
        reason: format!("{} value is not a path", value.type_name()),
    }
}
