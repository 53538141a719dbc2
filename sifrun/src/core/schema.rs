//! Parameter descriptor tables and the base/extension merge.
//!
//! A [`Schema`] is read-only once built. Tool integrations declare their
//! leading positions starting from 1; [`merge`] shifts them past the base
//! schema's largest leading position so runtime arguments always come first.

use std::collections::BTreeMap;

use super::descriptor::ParameterDescriptor;
use crate::error::{CompileError, CompileResult};

/// Ordered, name-unique table of descriptors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    params: Vec<ParameterDescriptor>,
    index: BTreeMap<String, usize>,
}

impl Schema {
    /// Build a table, validating each descriptor and name uniqueness.
    ///
    /// Cross-references (`requires`, `name_source`) are checked by
    /// [`Schema::check_references`], since an extension may refer to base
    /// parameters.
    pub fn new(params: Vec<ParameterDescriptor>) -> CompileResult<Self> {
        let mut index = BTreeMap::new();
        for (position, param) in params.iter().enumerate() {
            param.validate()?;
            if index.insert(param.name.clone(), position).is_some() {
                return Err(CompileError::InvalidSchema(format!(
                    "duplicate parameter {}",
                    param.name
                )));
            }
        }
        Ok(Self { params, index })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors in declaration order.
    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    /// Largest non-negative position, or 0 when there is none.
    pub fn max_leading_position(&self) -> i32 {
        self.params
            .iter()
            .filter_map(|param| param.position)
            .filter(|position| *position >= 0)
            .max()
            .unwrap_or(0)
    }

    /// Every `requires` and `name_source` entry must name a parameter in this table.
    pub fn check_references(&self) -> CompileResult<()> {
        for param in &self.params {
            for required in &param.requires {
                if !self.contains(required) {
                    return Err(CompileError::InvalidSchema(format!(
                        "parameter {} requires unknown parameter {}",
                        param.name, required
                    )));
                }
            }
            if let Some(source) = &param.name_source
                && !self.contains(source)
            {
                return Err(CompileError::InvalidSchema(format!(
                    "parameter {} derives from unknown parameter {}",
                    param.name, source
                )));
            }
        }
        Ok(())
    }
}

/// Merge a base (runtime) schema with an extension (tool) schema.
///
/// Base descriptors are kept as declared. Extension descriptors with a
/// non-negative position are shifted by the base's largest leading position;
/// trailing and unordered extension descriptors are unchanged. The merged
/// table lists base descriptors first, then extension descriptors, which is
/// the tie-break order for equal positions.
pub fn merge(base: &Schema, extension: &Schema) -> CompileResult<Schema> {
    let offset = base.max_leading_position();
    let mut params = base.params.clone();
    params.extend(extension.params.iter().cloned().map(|mut param| {
        if let Some(position) = param.position
            && position >= 0
        {
            param.position = Some(position + offset);
        }
        param
    }));
    let merged = Schema::new(params)?;
    merged.check_references()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::ParameterDescriptor;

    fn scalar(name: &str, position: Option<i32>) -> ParameterDescriptor {
        let desc = ParameterDescriptor::scalar(name, "%s").expect("scalar");
        match position {
            Some(p) => desc.at(p),
            None => desc,
        }
    }

    fn base() -> Schema {
        Schema::new(vec![
            scalar("binds", Some(1)),
            scalar("image", Some(2)),
            scalar("inner", Some(3)),
            scalar("log", Some(-1)),
        ])
        .expect("base")
    }

    #[test]
    fn max_leading_position_ignores_trailing() {
        assert_eq!(base().max_leading_position(), 3);
        assert_eq!(Schema::empty().max_leading_position(), 0);
        let only_trailing = Schema::new(vec![scalar("log", Some(-2))]).expect("schema");
        assert_eq!(only_trailing.max_leading_position(), 0);
    }

    #[test]
    fn merge_shifts_only_extension_leading_positions() {
        let ext = Schema::new(vec![
            scalar("subject", Some(1)),
            scalar("atlas", Some(0)),
            scalar("tail", Some(-2)),
            scalar("opt", None),
        ])
        .expect("ext");
        let merged = merge(&base(), &ext).expect("merge");

        let position = |name: &str| merged.get(name).expect(name).position;
        assert_eq!(position("binds"), Some(1));
        assert_eq!(position("inner"), Some(3));
        assert_eq!(position("log"), Some(-1));
        assert_eq!(position("subject"), Some(4));
        assert_eq!(position("atlas"), Some(3));
        assert_eq!(position("tail"), Some(-2));
        assert_eq!(position("opt"), None);
    }

    #[test]
    fn merge_keeps_base_then_extension_order() {
        let ext = Schema::new(vec![scalar("a", Some(1))]).expect("ext");
        let merged = merge(&base(), &ext).expect("merge");
        let names: Vec<&str> = merged.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["binds", "image", "inner", "log", "a"]);
    }

    #[test]
    fn duplicate_names_across_schemas_rejected() {
        let ext = Schema::new(vec![scalar("image", Some(1))]).expect("ext");
        let err = merge(&base(), &ext).unwrap_err();
        assert!(matches!(err, CompileError::InvalidSchema(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn extension_may_reference_base_parameters() {
        let ext = Schema::new(vec![scalar("a", None).requires(&["image"])]).expect("ext");
        assert!(ext.check_references().is_err());
        assert!(merge(&base(), &ext).is_ok());
    }

    #[test]
    fn dangling_name_source_rejected_on_merge() {
        let derived = ParameterDescriptor::path("out", "%s")
            .expect("path")
            .derived_from("missing", "%s.vtk")
            .expect("derived");
        let ext = Schema::new(vec![derived]).expect("ext");
        assert!(merge(&base(), &ext).is_err());
    }
}
