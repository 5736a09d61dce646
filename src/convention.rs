//! Conventions: merged, resolved and cached naming configurations.
//!
//! A convention is defined from an explicit list of parents (most general
//! first) plus its own [`Layer`]. All layers are merged in order by a single
//! function; the result is immutable for the life of the convention.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use tracing::debug;

use crate::compound::{self, Compound, Leaves};
use crate::error::ConfigError;
use crate::layer::{CompoundSpec, Layer};
use crate::pattern::Pattern;

/// Separator used when none is given.
pub const DEFAULT_SEPARATOR: &str = " ";

/// The merged and resolved configuration of a convention.
#[derive(Debug)]
pub(crate) struct Resolved {
    pub name: String,
    pub fields: IndexMap<String, String>,
    pub constants: IndexMap<String, String>,
    /// Compounds in use, in dependency order.
    pub compounds: IndexMap<String, Compound>,
    /// Top-level slots joined by the separator.
    pub layout: Vec<String>,
    /// Trailing slots and their delimiters.
    pub suffixes: Vec<(String, String)>,
}

impl Resolved {
    /// Pattern fragment for `name`, without an enclosing group.
    ///
    /// A compound wins over a field of the same name.
    pub fn pattern_of(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some(compound) = self.compounds.get(name) {
            return Some(Cow::Borrowed(&compound.pattern));
        }
        if let Some(pattern) = self.fields.get(name) {
            return Some(Cow::Borrowed(pattern));
        }
        self.constants
            .get(name)
            .map(|value| Cow::Owned(regex::escape(value)))
    }
}

/// A naming convention.
///
/// ```rust
/// use naming::{Convention, Layer, Name, builtin};
///
/// let project = Convention::define(
///     "Project",
///     &[builtin::pipe_file()],
///     Layer::new().field("year", "[0-9]{4}"),
/// )
/// .unwrap();
///
/// let name = Name::parse(&project, "shot 2017.render.12.exr").unwrap();
/// assert_eq!(name.value("year"), Some("2017"));
/// assert_eq!(name.value("output"), Some("render"));
/// assert_eq!(name.nice_name(), "shot 2017");
/// ```
#[derive(Debug)]
pub struct Convention {
    layers: Vec<Arc<Layer>>,
    resolved: Resolved,
    /// Every field the pattern captures, in pattern order.
    fields: Vec<String>,
    default_pattern: Arc<Pattern>,
    patterns: Mutex<HashMap<String, Arc<Pattern>>>,
}

impl Convention {
    /// Define a convention from its parents (most general first) and its own
    /// declarations.
    ///
    /// Layers shared by several parents are merged once, at their first
    /// position. Fails if the declarations can never produce a valid pattern.
    pub fn define(
        name: impl Into<String>,
        parents: &[&Convention],
        layer: Layer,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let mut layers: Vec<Arc<Layer>> = Vec::new();
        for parent in parents {
            for l in &parent.layers {
                if !layers.iter().any(|seen| Arc::ptr_eq(seen, l)) {
                    layers.push(Arc::clone(l));
                }
            }
        }
        layers.push(Arc::new(layer));

        let resolved = resolve(&name, &layers)?;
        let default_pattern = Pattern::compile(&resolved, DEFAULT_SEPARATOR)
            .map(Arc::new)
            .map_err(|source| ConfigError::InvalidPattern {
                convention: name.clone(),
                source,
            })?;
        let fields = default_pattern
            .capture_names()
            .map(str::to_string)
            .collect();

        debug!(
            convention = %name,
            layers = layers.len(),
            compounds = resolved.compounds.len(),
            layout = ?resolved.layout,
            "resolved convention"
        );

        let patterns = HashMap::from([(DEFAULT_SEPARATOR.to_string(), Arc::clone(&default_pattern))]);
        Ok(Self {
            layers,
            resolved,
            fields,
            default_pattern,
            patterns: Mutex::new(patterns),
        })
    }

    pub fn name(&self) -> &str {
        &self.resolved.name
    }

    /// Every field a name of this convention can carry, in pattern order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Top-level fields joined by the separator.
    pub fn layout(&self) -> &[String] {
        &self.resolved.layout
    }

    /// Trailing slots, with the delimiter that introduces each.
    pub fn suffixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolved
            .suffixes
            .iter()
            .map(|(name, delim)| (name.as_str(), delim.as_str()))
    }

    /// Raw pattern text for a field, compound or constant.
    pub fn field_pattern(&self, field: &str) -> Option<Cow<'_, str>> {
        self.resolved.pattern_of(field)
    }

    /// The compiled pattern for `separator`, built once per separator.
    pub fn pattern(&self, separator: &str) -> Result<Arc<Pattern>, ConfigError> {
        if separator == DEFAULT_SEPARATOR {
            return Ok(Arc::clone(&self.default_pattern));
        }
        let mut patterns = self.patterns.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pattern) = patterns.get(separator) {
            return Ok(Arc::clone(pattern));
        }
        let pattern = Pattern::compile(&self.resolved, separator)
            .map(Arc::new)
            .map_err(|source| ConfigError::InvalidPattern {
                convention: self.name().to_string(),
                source,
            })?;
        patterns.insert(separator.to_string(), Arc::clone(&pattern));
        Ok(pattern)
    }

    pub(crate) fn default_pattern(&self) -> &Arc<Pattern> {
        &self.default_pattern
    }

    pub(crate) fn resolved(&self) -> &Resolved {
        &self.resolved
    }
}

/// Merge `layers` in order and resolve the result.
fn resolve(name: &str, layers: &[Arc<Layer>]) -> Result<Resolved, ConfigError> {
    let drops: HashSet<&str> = layers
        .iter()
        .flat_map(|l| l.drops.iter().map(String::as_str))
        .collect();

    let mut fields: IndexMap<String, String> = IndexMap::new();
    let mut compounds: IndexMap<String, CompoundSpec> = IndexMap::new();
    let mut constants: IndexMap<String, String> = IndexMap::new();
    let mut suffixes: IndexMap<String, String> = IndexMap::new();
    let mut join_sep = String::new();
    let mut explicit_layout: Option<Vec<String>> = None;
    let mut extra_layout: Vec<String> = Vec::new();

    // An override keeps the position of the first declaration.
    for layer in layers {
        fields.extend(layer.fields.iter().cloned());
        compounds.extend(layer.compounds.iter().map(|c| (c.name.clone(), c.clone())));
        constants.extend(layer.constants.iter().cloned());
        suffixes.extend(layer.suffixes.iter().cloned());
        if let Some(sep) = &layer.join_sep {
            join_sep = sep.clone();
        }
        if let Some(layout) = &layer.layout {
            explicit_layout = Some(layout.clone());
            extra_layout.clear();
        }
        extra_layout.extend(layer.extend_layout.iter().cloned());
    }

    fields.retain(|k, _| !drops.contains(k.as_str()));
    compounds.retain(|k, _| !drops.contains(k.as_str()));
    constants.retain(|k, _| !drops.contains(k.as_str()));
    suffixes.retain(|k, _| !drops.contains(k.as_str()));

    let base_layout = explicit_layout.unwrap_or_else(|| default_layout(&fields, &compounds, &suffixes));
    let mut layout: Vec<String> = Vec::new();
    for field in base_layout.into_iter().chain(extra_layout) {
        if !drops.contains(field.as_str()) && !layout.contains(&field) {
            layout.push(field);
        }
    }
    if layout.is_empty() {
        return Err(ConfigError::EmptyLayout {
            convention: name.to_string(),
        });
    }

    let roots: Vec<String> = layout.iter().chain(suffixes.keys()).cloned().collect();
    let leaves = Leaves {
        fields: &fields,
        constants: &constants,
    };
    let resolved_compounds = compound::resolve(name, &compounds, &leaves, &join_sep, &roots)?;

    let resolved = Resolved {
        name: name.to_string(),
        fields,
        constants,
        compounds: resolved_compounds,
        layout,
        suffixes: suffixes.into_iter().collect(),
    };
    if let Some(field) = roots.iter().find(|r| resolved.pattern_of(r).is_none()) {
        return Err(ConfigError::UnknownLayoutField {
            convention: name.to_string(),
            field: field.clone(),
        });
    }
    Ok(resolved)
}

/// Fields in declaration order, minus those consumed by a compound and those
/// rendered as suffixes.
fn default_layout(
    fields: &IndexMap<String, String>,
    compounds: &IndexMap<String, CompoundSpec>,
    suffixes: &IndexMap<String, String>,
) -> Vec<String> {
    let consumed: HashSet<&str> = compounds
        .values()
        .flat_map(|c| {
            c.parts
                .iter()
                .filter(move |p| p.name != c.name)
                .map(|p| p.name.as_str())
        })
        .collect();
    fields
        .keys()
        .filter(|f| !consumed.contains(f.as_str()) && !suffixes.contains_key(*f))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn test_override_keeps_first_position() {
        let sub = Convention::define(
            "SubName",
            &[builtin::name()],
            Layer::new()
                .field("base", r"\w+")
                .field("second_field", "(2nd)")
                .field("third_field", "(3rd)"),
        )
        .unwrap();
        let replace = Convention::define(
            "Replace",
            &[&sub],
            Layer::new()
                .field("base", "(repl)")
                .field("fourth_field", "(4th)"),
        )
        .unwrap();
        assert_eq!(
            replace.layout(),
            ["base", "second_field", "third_field", "fourth_field"]
        );
        assert_eq!(replace.field_pattern("base").as_deref(), Some("(repl)"));
    }

    #[test]
    fn test_drop_wins_over_redeclaration() {
        let dropper = Convention::define(
            "Dropper",
            &[builtin::pipe_file()],
            Layer::new()
                .field("without", "[a-zA-Z0-9]+")
                .field("basename", "[a-zA-Z0-9]+")
                .drop("base"),
        )
        .unwrap();
        let sub = Convention::define(
            "Subdropper",
            &[&dropper],
            Layer::new().field("base", r"\w+").field("subdrop", r"[\w]"),
        )
        .unwrap();
        assert_eq!(sub.layout(), ["without", "basename", "subdrop"]);
        assert!(!sub.has_field("base"));
        assert!(sub.field_pattern("base").is_none());
    }

    #[test]
    fn test_shared_parent_layers_merge_once() {
        let pf = builtin::pipe_file();
        assert_eq!(pf.layers.len(), 4);
        let suffixes: Vec<_> = pf.suffixes().collect();
        assert_eq!(suffixes, [("pipe", "."), ("suffix", ".")]);
    }

    #[test]
    fn test_compound_parts_leave_default_layout() {
        let c = Convention::define(
            "CompUnused",
            &[builtin::name()],
            Layer::new()
                .field("first", "1")
                .field("second", "2")
                .compound("cmp", ["first", "second"]),
        )
        .unwrap();
        assert_eq!(c.layout(), ["base"]);
        assert_eq!(c.fields(), ["base"]);
    }

    #[test]
    fn test_explicit_layout_then_extension() {
        let base = Convention::define(
            "NameAndNumber",
            &[builtin::name()],
            Layer::new()
                .field("first_name", r"\w+")
                .field("second_name", r"\w+")
                .field("n1", r"\d")
                .field("n2", r"\d")
                .compound("full_name", ["first_name", "second_name"])
                .compound("number", ["n1", "n2"])
                .join_sep("-")
                .layout(["full_name", "number"]),
        )
        .unwrap();
        let role = Convention::define(
            "Role",
            &[&base],
            Layer::new().field("role", r"\w+").extend_layout(["role"]),
        )
        .unwrap();
        assert_eq!(role.layout(), ["full_name", "number", "role"]);
        assert_eq!(
            role.field_pattern("number").as_deref(),
            Some(r"(?P<n1>\d)\-(?P<n2>\d)")
        );
    }

    #[test]
    fn test_empty_layout_is_config_error() {
        let base = Convention::define(
            "CompUnused",
            &[builtin::name()],
            Layer::new()
                .field("first", "1")
                .field("second", "2")
                .compound("cmp", ["first", "second"]),
        )
        .unwrap();
        let err = Convention::define(
            "CompAndPropsInvalid",
            &[&base],
            Layer::new()
                .constant("prop", "constant")
                .compound("cmp2", ["base", "prop"]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLayout { .. }));
    }

    #[test]
    fn test_unknown_layout_entry_is_config_error() {
        let err = Convention::define(
            "Typo",
            &[builtin::name()],
            Layer::new().extend_layout(["nope"]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownLayoutField { ref field, .. } if field == "nope"
        ));
    }

    #[test]
    fn test_duplicate_capture_is_config_error() {
        let err = Convention::define(
            "Twice",
            &[builtin::name()],
            Layer::new()
                .field("tag", "[a-z]+")
                .compound("pair", ["tag", "base"])
                .layout(["base", "pair"]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_pattern_is_cached_per_separator() {
        let conv = builtin::pipe_file();
        let a = conv.pattern("_").unwrap();
        let b = conv.pattern("_").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&conv.pattern(" ").unwrap(), conv.default_pattern()));
        assert!(!Arc::ptr_eq(&a, conv.default_pattern()));
    }

    #[test]
    fn test_pattern_compiled_once_across_threads() {
        let patterns: Vec<Arc<Pattern>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| builtin::pipe_file().pattern("__").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let first = &patterns[0];
        assert!(patterns.iter().all(|p| Arc::ptr_eq(p, first)));
        assert!(Arc::ptr_eq(first, &builtin::pipe_file().pattern("__").unwrap()));
    }
}
