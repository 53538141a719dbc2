//! Bind-mount rules and host-to-container path translation.
//!
//! Rules are applied in list order and the first matching rule wins. Longest
//! prefix does not take precedence: callers control overlap by ordering their
//! mount list.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// A host path prefix and the prefix it appears under inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountRule {
    pub host_prefix: String,
    pub container_prefix: String,
}

impl MountRule {
    pub fn new(host_prefix: impl Into<String>, container_prefix: impl Into<String>) -> Self {
        Self {
            host_prefix: host_prefix.into(),
            container_prefix: container_prefix.into(),
        }
    }

    /// Parse the joined `host:container` form.
    ///
    /// Splits on the first `:`. Paths that themselves contain `:` are not
    /// representable.
    pub fn parse(entry: &str) -> CompileResult<Self> {
        let (host, container) = entry
            .split_once(':')
            .ok_or_else(|| CompileError::MalformedMountRule(entry.to_string()))?;
        if host.is_empty() || container.is_empty() {
            return Err(CompileError::MalformedMountRule(entry.to_string()));
        }
        Ok(Self::new(host, container))
    }

    /// The `host:container` string passed to the runtime's bind flag.
    pub fn bind_spec(&self) -> String {
        format!("{}:{}", self.host_prefix, self.container_prefix)
    }

    /// Translate `path` if it lies under this rule's host prefix.
    ///
    /// The prefix matches on whole path components, so `/data` covers
    /// `/data/x` but not `/database/x`.
    pub fn apply(&self, path: &str) -> Option<String> {
        let relative = Path::new(path).strip_prefix(&self.host_prefix).ok()?;
        if relative.as_os_str().is_empty() {
            return Some(self.container_prefix.clone());
        }
        Some(
            Path::new(&self.container_prefix)
                .join(relative)
                .to_string_lossy()
                .into_owned(),
        )
    }
}

impl fmt::Display for MountRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bind_spec())
    }
}

/// One mount configuration entry: either `"host:container"` or `[host, container]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MountEntry {
    Joined(String),
    Pair(String, String),
}

impl MountEntry {
    /// Convert to a rule. Pairs are joined with `:` and parsed, so both shapes
    /// go through the same parser.
    pub fn to_rule(&self) -> CompileResult<MountRule> {
        match self {
            MountEntry::Joined(entry) => MountRule::parse(entry),
            MountEntry::Pair(host, container) => MountRule::parse(&format!("{host}:{container}")),
        }
    }
}

/// Convert a mount configuration into ordered rules, preserving list order.
pub fn parse_entries(entries: &[MountEntry]) -> CompileResult<Vec<MountRule>> {
    entries.iter().map(MountEntry::to_rule).collect()
}

/// Parse joined `host:container` strings.
pub fn parse_joined<S: AsRef<str>>(entries: &[S]) -> CompileResult<Vec<MountRule>> {
    entries
        .iter()
        .map(|entry| MountRule::parse(entry.as_ref()))
        .collect()
}

/// Build rules from `(host, container)` pairs.
pub fn from_pairs<H: AsRef<str>, C: AsRef<str>>(pairs: &[(H, C)]) -> CompileResult<Vec<MountRule>> {
    pairs
        .iter()
        .map(|(host, container)| {
            MountEntry::Pair(host.as_ref().to_string(), container.as_ref().to_string()).to_rule()
        })
        .collect()
}

/// Map a host path to the path visible inside the container.
///
/// Returns `path` unchanged when no rule matches.
pub fn translate(path: &str, mounts: &[MountRule]) -> String {
    mounts
        .iter()
        .find_map(|rule| rule.apply(path))
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_path_under_prefix() {
        let mounts = vec![MountRule::new("/data", "/input")];
        assert_eq!(
            translate("/data/sub1/file.nrrd", &mounts),
            "/input/sub1/file.nrrd"
        );
    }

    #[test]
    fn unmatched_path_passes_through() {
        let mounts = vec![MountRule::new("/data", "/input")];
        assert_eq!(translate("/scratch/file.nrrd", &mounts), "/scratch/file.nrrd");
        assert_eq!(translate("relative/file.nrrd", &mounts), "relative/file.nrrd");
        assert_eq!(translate("/data/x", &[]), "/data/x");
    }

    #[test]
    fn first_matching_rule_wins_over_longer_prefix() {
        let mounts = vec![
            MountRule::new("/data", "/input"),
            MountRule::new("/data/sub1", "/subject"),
        ];
        assert_eq!(translate("/data/sub1/f.nrrd", &mounts), "/input/sub1/f.nrrd");

        let reversed: Vec<MountRule> = mounts.into_iter().rev().collect();
        assert_eq!(translate("/data/sub1/f.nrrd", &reversed), "/subject/f.nrrd");
    }

    #[test]
    fn prefix_matches_whole_components_only() {
        let mounts = vec![MountRule::new("/data", "/input")];
        assert_eq!(translate("/database/x", &mounts), "/database/x");
    }

    #[test]
    fn trailing_separator_on_prefix_is_ignored() {
        let mounts = vec![MountRule::new("/data/", "/input/")];
        assert_eq!(translate("/data/a/b", &mounts), "/input/a/b");
    }

    #[test]
    fn exact_prefix_maps_to_container_prefix() {
        let mounts = vec![MountRule::new("/data", "/input")];
        assert_eq!(translate("/data", &mounts), "/input");
    }

    #[test]
    fn pair_and_joined_forms_translate_identically() {
        let joined = parse_joined(&["/data:/input", "/scratch:/work"]).expect("joined");
        let pairs = from_pairs(&[("/data", "/input"), ("/scratch", "/work")]).expect("pairs");
        assert_eq!(joined, pairs);
        for path in ["/data/a.nrrd", "/scratch/tmp/b", "/other/c", "/data"] {
            assert_eq!(translate(path, &joined), translate(path, &pairs));
        }
    }

    #[test]
    fn joined_entry_without_separator_is_malformed() {
        let err = MountRule::parse("nodashcolon").unwrap_err();
        assert_eq!(err, CompileError::MalformedMountRule("nodashcolon".to_string()));
    }

    #[test]
    fn empty_side_is_malformed() {
        assert!(matches!(
            MountRule::parse(":/input"),
            Err(CompileError::MalformedMountRule(_))
        ));
        assert!(matches!(
            MountRule::parse("/data:"),
            Err(CompileError::MalformedMountRule(_))
        ));
    }

    #[test]
    fn mixed_entries_deserialize_in_order() {
        let entries: Vec<MountEntry> =
            serde_json::from_str(r#"["/data:/input", ["/scratch", "/work"]]"#).expect("parse");
        let rules = parse_entries(&entries).expect("rules");
        assert_eq!(
            rules,
            vec![
                MountRule::new("/data", "/input"),
                MountRule::new("/scratch", "/work"),
            ]
        );
        assert_eq!(rules[1].bind_spec(), "/scratch:/work");
    }
}
