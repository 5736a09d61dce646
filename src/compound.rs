//! Compound resolution.
//!
//! Compounds depend on each other when one names another as a part. They are
//! resolved with a worklist: any compound whose compound parts are already
//! resolved is eligible; running out of eligible compounds while some are
//! still pending means they form a cycle.

use std::collections::HashSet;

use indexmap::IndexMap;
use itertools::Itertools;
use regex::Regex;
use tracing::trace;

use crate::error::ConfigError;
use crate::layer::{CompoundSpec, Part};

/// A compound with its pattern built.
#[derive(Debug, Clone)]
pub(crate) struct Compound {
    pub name: String,
    pub parts: Vec<Part>,
    pub join: String,
    pub partial: bool,
    /// Pattern of the whole compound, without an enclosing group.
    pub pattern: String,
    /// Splits a stored compound value to recover a part named after the
    /// compound itself, which the main pattern does not capture.
    self_split: Option<Regex>,
}

impl Compound {
    pub fn is_self_part(&self, part: &Part) -> bool {
        part.name == self.name
    }

    /// Value of the self-referencing part inside a stored compound value.
    pub fn split_self<'v>(&self, value: &'v str) -> Option<&'v str> {
        let caps = self.self_split.as_ref()?.captures(value)?;
        caps.name(&self.name).map(|m| m.as_str())
    }
}

/// Leaf patterns a compound part can fall back to.
pub(crate) struct Leaves<'a> {
    pub fields: &'a IndexMap<String, String>,
    pub constants: &'a IndexMap<String, String>,
}

impl Leaves<'_> {
    fn pattern(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .cloned()
            .or_else(|| self.constants.get(name).map(|v| regex::escape(v)))
    }
}

/// Resolve every compound reachable from `roots`, in dependency order.
///
/// Compounds that nothing uses are left out, even when they are declared.
pub(crate) fn resolve(
    convention: &str,
    declared: &IndexMap<String, CompoundSpec>,
    leaves: &Leaves<'_>,
    join_sep: &str,
    roots: &[String],
) -> Result<IndexMap<String, Compound>, ConfigError> {
    let used = reachable(declared, roots);
    let mut pending: Vec<&CompoundSpec> = declared
        .values()
        .filter(|spec| used.contains(spec.name.as_str()))
        .collect();

    for spec in &pending {
        check(convention, spec, declared, leaves)?;
    }

    let mut resolved: IndexMap<String, Compound> = IndexMap::new();
    while !pending.is_empty() {
        let Some(idx) = pending.iter().position(|spec| {
            compound_deps(spec, declared).all(|dep| resolved.contains_key(dep))
        }) else {
            return Err(ConfigError::CompoundCycle {
                convention: convention.to_string(),
                compounds: pending.iter().map(|spec| spec.name.clone()).collect(),
            });
        };
        let spec = pending.remove(idx);
        let compound = build(convention, spec, leaves, join_sep, &resolved)?;
        trace!(compound = %compound.name, pattern = %compound.pattern, "resolved compound");
        resolved.insert(compound.name.clone(), compound);
    }
    Ok(resolved)
}

/// Compounds reachable from `roots` through compound parts.
fn reachable<'a>(declared: &'a IndexMap<String, CompoundSpec>, roots: &'a [String]) -> HashSet<&'a str> {
    let mut used = HashSet::new();
    let mut work: Vec<&str> = roots.iter().map(String::as_str).collect();
    while let Some(name) = work.pop() {
        let Some(spec) = declared.get(name) else {
            continue;
        };
        if !used.insert(spec.name.as_str()) {
            continue;
        }
        work.extend(
            spec.parts
                .iter()
                .filter(|p| p.name != spec.name)
                .map(|p| p.name.as_str()),
        );
    }
    used
}

/// Parts of `spec` that are themselves compounds.
fn compound_deps<'a>(
    spec: &'a CompoundSpec,
    declared: &'a IndexMap<String, CompoundSpec>,
) -> impl Iterator<Item = &'a str> {
    spec.parts
        .iter()
        .map(|p| p.name.as_str())
        .filter(move |name| *name != spec.name && declared.contains_key(*name))
}

fn check(
    convention: &str,
    spec: &CompoundSpec,
    declared: &IndexMap<String, CompoundSpec>,
    leaves: &Leaves<'_>,
) -> Result<(), ConfigError> {
    if spec.parts.iter().all(|p| p.optional) {
        return Err(ConfigError::NoRequiredPart {
            convention: convention.to_string(),
            compound: spec.name.clone(),
        });
    }
    for part in &spec.parts {
        // a self reference can only mean the field of the same name
        let known = leaves.pattern(&part.name).is_some()
            || (part.name != spec.name && declared.contains_key(&part.name));
        if !known {
            return Err(ConfigError::UnresolvedCompound {
                convention: convention.to_string(),
                compound: spec.name.clone(),
                missing: part.name.clone(),
            });
        }
    }
    Ok(())
}

fn build(
    convention: &str,
    spec: &CompoundSpec,
    leaves: &Leaves<'_>,
    join_sep: &str,
    resolved: &IndexMap<String, Compound>,
) -> Result<Compound, ConfigError> {
    let join = spec.join.clone().unwrap_or_else(|| join_sep.to_string());
    let fragment = |part: &Part, name_self: bool| -> String {
        if part.name == spec.name {
            let leaf = leaves.pattern(&part.name).unwrap_or_default();
            if name_self {
                format!("(?P<{}>{leaf})", part.name)
            } else {
                format!("(?:{leaf})")
            }
        } else if let Some(inner) = resolved.get(&part.name) {
            format!("(?P<{}>{})", part.name, inner.pattern)
        } else {
            let leaf = leaves.pattern(&part.name).unwrap_or_default();
            format!("(?P<{}>{leaf})", part.name)
        }
    };

    let pattern = sequence(&spec.parts, |p| fragment(p, false), &join);
    let self_split = if spec.parts.iter().any(|p| p.name == spec.name) {
        let source = format!("^{}$", sequence(&spec.parts, |p| fragment(p, true), &join));
        Some(Regex::new(&source).map_err(|source| ConfigError::InvalidPattern {
            convention: convention.to_string(),
            source,
        })?)
    } else {
        None
    };

    Ok(Compound {
        name: spec.name.clone(),
        parts: spec.parts.clone(),
        join,
        partial: spec.partial,
        pattern,
        self_split,
    })
}

/// Join part fragments so that the join string only sits between parts that
/// are present. Optional parts before the first required one carry their
/// join after them, the rest carry it before.
fn sequence(parts: &[Part], fragment: impl Fn(&Part) -> String, join: &str) -> String {
    let join = regex::escape(join);
    let anchor = parts.iter().position(|p| !p.optional).unwrap_or(0);
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let frag = fragment(part);
            match (i.cmp(&anchor), part.optional) {
                (std::cmp::Ordering::Less, _) => format!("(?:{frag}{join})?"),
                (std::cmp::Ordering::Equal, _) => frag,
                (std::cmp::Ordering::Greater, true) => format!("(?:{join}{frag})?"),
                (std::cmp::Ordering::Greater, false) => format!("{join}{frag}"),
            }
        })
        .join("")
}
