//! Compiled command representation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::resolver::Resolved;
use super::value::Value;

/// How the invoker treats a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TokenRole {
    /// Words passed to the program.
    Argument,
    /// Combined stdout/stderr go to `target`.
    Redirect { target: String },
}

/// One formatted argstr occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Parameter that produced the token.
    pub param: String,
    pub words: Vec<String>,
    pub role: TokenRole,
}

impl Token {
    pub fn argument(param: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            param: param.into(),
            words,
            role: TokenRole::Argument,
        }
    }

    pub fn redirect(param: impl Into<String>, words: Vec<String>, target: String) -> Self {
        Self {
            param: param.into(),
            words,
            role: TokenRole::Redirect { target },
        }
    }

    /// Token as it appears on a command line (`-B /data:/input`).
    pub fn render(&self) -> String {
        self.words.join(" ")
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.role, TokenRole::Redirect { .. })
    }
}

/// Ordered output of one compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledCommand {
    /// Runtime invocation words (`singularity [--debug] run`).
    pub prefix: Vec<String>,
    /// Leading, unordered, then trailing tokens.
    pub tokens: Vec<Token>,
    /// Every defined parameter value, including suppressed ones.
    pub resolved: BTreeMap<String, Resolved>,
}

impl CompiledCommand {
    /// Prefix words followed by rendered tokens.
    pub fn rendered_tokens(&self) -> Vec<String> {
        self.prefix
            .iter()
            .cloned()
            .chain(self.tokens.iter().map(Token::render))
            .collect()
    }

    pub fn cmdline(&self) -> String {
        self.rendered_tokens().join(" ")
    }

    /// Program and arguments for direct execution; redirect tokens excluded.
    pub fn argv(&self) -> Vec<String> {
        self.prefix
            .iter()
            .cloned()
            .chain(
                self.tokens
                    .iter()
                    .filter(|token| !token.is_redirect())
                    .flat_map(|token| token.words.iter().cloned()),
            )
            .collect()
    }

    /// Target of the last redirect token, if any.
    pub fn redirect_target(&self) -> Option<&str> {
        self.tokens.iter().rev().find_map(|token| match &token.role {
            TokenRole::Redirect { target } => Some(target.as_str()),
            TokenRole::Argument => None,
        })
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.resolved.get(name).map(|resolved| &resolved.value)
    }

    /// Tokens produced by `param`.
    pub fn tokens_for<'a>(&'a self, param: &'a str) -> impl Iterator<Item = &'a Token> + 'a {
        self.tokens.iter().filter(move |token| token.param == param)
    }

    pub fn invocation(&self) -> Invocation {
        Invocation {
            argv: self.argv(),
            redirect: self.redirect_target().map(PathBuf::from),
        }
    }
}

/// What the invoker executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub redirect: Option<PathBuf>,
}

impl Invocation {
    pub fn new<S: Into<String>>(argv: impl IntoIterator<Item = S>) -> Self {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            redirect: None,
        }
    }

    pub fn redirect_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.redirect = Some(path.into());
        self
    }
}
