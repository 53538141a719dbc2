//! Argument and derivation templates.
//!
//! An argument template (`argstr`) is split into whitespace-separated words.
//! At most one word carries a `%s`, `%d` or `%f` placeholder. A trailing
//! `...` marks the per-element variant used by path lists, and a first word
//! starting with `>` marks output redirection.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::error::{CompileError, CompileResult};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[sdf]").expect("placeholder regex"));

const REPEAT_SUFFIX: &str = "...";

/// Conversion requested by a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `%s`
    Str,
    /// `%d`
    Int,
    /// `%f`
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    word: usize,
    start: usize,
    end: usize,
    conversion: Conversion,
}

/// Parsed `argstr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArgTemplate {
    raw: String,
    words: Vec<String>,
    slot: Option<Slot>,
    repeat: bool,
    redirect: bool,
}

impl ArgTemplate {
    pub fn parse(raw: &str) -> CompileResult<Self> {
        let invalid = |reason: &str| CompileError::InvalidTemplate {
            template: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let (body, repeat) = match trimmed.strip_suffix(REPEAT_SUFFIX) {
            Some(body) => (body, true),
            None => (trimmed, false),
        };
        let words: Vec<String> = body.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return Err(invalid("template is empty"));
        }

        let mut slot = None;
        for (index, word) in words.iter().enumerate() {
            for found in PLACEHOLDER.find_iter(word) {
                if slot.is_some() {
                    return Err(invalid("more than one placeholder"));
                }
                let conversion = match found.as_str() {
                    "%d" => Conversion::Int,
                    "%f" => Conversion::Float,
                    _ => Conversion::Str,
                };
                slot = Some(Slot {
                    word: index,
                    start: found.start(),
                    end: found.end(),
                    conversion,
                });
            }
        }

        let redirect = words[0].starts_with('>');
        if redirect && repeat {
            return Err(invalid("redirection cannot repeat per element"));
        }
        if repeat && slot.is_none() {
            return Err(invalid("repeated template needs a placeholder"));
        }

        Ok(Self {
            raw: raw.to_string(),
            words,
            slot,
            repeat,
            redirect,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn has_placeholder(&self) -> bool {
        self.slot.is_some()
    }

    /// True when the template ends with `...`.
    pub fn is_repeated(&self) -> bool {
        self.repeat
    }

    /// True when the template redirects combined output (`> %s 2>&1`).
    pub fn is_redirect(&self) -> bool {
        self.redirect
    }

    /// Words emitted verbatim, for templates without a placeholder.
    pub fn literal_words(&self) -> Vec<String> {
        self.words.clone()
    }

    /// Substitute `value` into the placeholder word.
    ///
    /// `name` is only used to label errors.
    pub fn fill(&self, name: &str, value: &Value) -> CompileResult<Vec<String>> {
        let Some(slot) = &self.slot else {
            return Ok(self.literal_words());
        };
        let rendered = convert(name, slot.conversion, value)?;
        let mut words = self.words.clone();
        let word = &self.words[slot.word];
        words[slot.word] = format!("{}{}{}", &word[..slot.start], rendered, &word[slot.end..]);
        Ok(words)
    }
}

fn convert(name: &str, conversion: Conversion, value: &Value) -> CompileResult<String> {
    let invalid = |reason: String| CompileError::InvalidValue {
        name: name.to_string(),
        reason,
    };
    match conversion {
        Conversion::Str => match value {
            Value::List(_) => Err(invalid("list cannot fill a %s placeholder".to_string())),
            other => Ok(other.to_string()),
        },
        Conversion::Int => match value {
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok((f.trunc() as i64).to_string()),
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| i.to_string())
                .map_err(|_| invalid(format!("'{s}' is not an integer"))),
            other => Err(invalid(format!("{} cannot fill %d", other.type_name()))),
        },
        Conversion::Float => match value {
            Value::Int(i) => Ok(format!("{:.6}", *i as f64)),
            Value::Float(f) => Ok(format!("{f:.6}")),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| format!("{f:.6}"))
                .map_err(|_| invalid(format!("'{s}' is not a number"))),
            other => Err(invalid(format!("{} cannot fill %f", other.type_name()))),
        },
    }
}

impl TryFrom<String> for ArgTemplate {
    type Error = CompileError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        ArgTemplate::parse(&raw)
    }
}

impl From<ArgTemplate> for String {
    fn from(template: ArgTemplate) -> Self {
        template.raw
    }
}

impl fmt::Display for ArgTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Derivation template with exactly one `%s`, filled with a source basename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NameTemplate(String);

impl NameTemplate {
    pub fn parse(raw: &str) -> CompileResult<Self> {
        let placeholders: Vec<&str> = PLACEHOLDER.find_iter(raw).map(|m| m.as_str()).collect();
        if placeholders != ["%s"] {
            return Err(CompileError::InvalidTemplate {
                template: raw.to_string(),
                reason: "name template needs exactly one %s".to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn apply(&self, stem: &str) -> String {
        self.0.replacen("%s", stem, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NameTemplate {
    type Error = CompileError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        NameTemplate::parse(&raw)
    }
}

impl From<NameTemplate> for String {
    fn from(template: NameTemplate) -> Self {
        template.0
    }
}
