//! Building name strings from stored values and overrides.
//!
//! Lookup order for a top-level slot: override, synthesized compound, stored
//! value, constant, then the `{field}` placeholder. An override holding the
//! empty string clears the field instead of setting it.

use std::collections::HashMap;

use itertools::Itertools;

use crate::Values;
use crate::compound::Compound;
use crate::convention::Resolved;

/// Field values that take precedence over stored ones for a single render.
pub(crate) type Overrides = HashMap<String, String>;

/// Stand-in for a field with no known value.
pub fn placeholder(field: &str) -> String {
    format!("{{{field}}}")
}

/// A compound value built during rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Synthesized {
    /// Every part known; a value the pattern accepts.
    Value(String),
    /// Some parts are placeholders.
    Partial(String),
}

impl Synthesized {
    fn text(&self) -> &str {
        match self {
            Self::Value(s) | Self::Partial(s) => s,
        }
    }
}

enum PartValue<'a> {
    Known(&'a str),
    Partial(&'a str),
    Unknown,
}

/// Render a name followed by its first `suffixes` trailing slots.
///
/// `0` gives the nice name; `usize::MAX` the full name.
pub(crate) fn render(
    resolved: &Resolved,
    stored: &Values,
    overrides: &Overrides,
    separator: &str,
    suffixes: usize,
) -> String {
    let synthesized = synthesize(resolved, stored, overrides);
    let text = |name: &str| -> String {
        match overrides.get(name) {
            Some(value) if value.is_empty() => return placeholder(name),
            Some(value) => return value.clone(),
            None => {}
        }
        if let Some(s) = synthesized.get(name) {
            return s.text().to_string();
        }
        stored
            .get(name)
            .or_else(|| resolved.constants.get(name))
            .cloned()
            .unwrap_or_else(|| placeholder(name))
    };

    let mut out = resolved.layout.iter().map(|name| text(name.as_str())).join(separator);
    for (name, delim) in resolved.suffixes.iter().take(suffixes) {
        out.push_str(delim);
        out.push_str(&text(name.as_str()));
    }
    out
}

/// Rebuild every compound touched by an override, in dependency order.
///
/// Compounds that are overridden directly, or whose parts are all
/// untouched, keep whatever value they already have.
fn synthesize<'r>(
    resolved: &'r Resolved,
    stored: &Values,
    overrides: &Overrides,
) -> HashMap<&'r str, Synthesized> {
    let mut out: HashMap<&'r str, Synthesized> = HashMap::new();
    for compound in resolved.compounds.values() {
        if overrides.contains_key(&compound.name) {
            continue;
        }
        let touched = compound.parts.iter().any(|p| {
            !compound.is_self_part(p)
                && (overrides.contains_key(&p.name) || out.contains_key(p.name.as_str()))
        });
        if !touched {
            continue;
        }
        if let Some(value) = join_parts(compound, resolved, stored, overrides, &out) {
            out.insert(compound.name.as_str(), value);
        }
    }
    out
}

fn join_parts(
    compound: &Compound,
    resolved: &Resolved,
    stored: &Values,
    overrides: &Overrides,
    done: &HashMap<&str, Synthesized>,
) -> Option<Synthesized> {
    let values: Vec<PartValue<'_>> = compound
        .parts
        .iter()
        .map(|part| {
            if compound.is_self_part(part) {
                return stored
                    .get(&compound.name)
                    .and_then(|v| compound.split_self(v))
                    .map_or(PartValue::Unknown, PartValue::Known);
            }
            if let Some(value) = overrides.get(&part.name) {
                return if value.is_empty() {
                    PartValue::Unknown
                } else {
                    PartValue::Known(value)
                };
            }
            match done.get(part.name.as_str()) {
                Some(Synthesized::Value(v)) => PartValue::Known(v),
                Some(Synthesized::Partial(v)) => PartValue::Partial(v),
                None => stored
                    .get(&part.name)
                    .or_else(|| resolved.constants.get(&part.name))
                    .map_or(PartValue::Unknown, |v| PartValue::Known(v)),
            }
        })
        .collect();

    // An unknown optional part can only be left out when no later optional
    // part is present.
    let last_optional = compound
        .parts
        .iter()
        .zip(&values)
        .rposition(|(part, value)| part.optional && !matches!(value, PartValue::Unknown));

    let mut complete = true;
    let mut any_present = false;
    let mut items: Vec<String> = Vec::new();
    for (i, (part, value)) in compound.parts.iter().zip(&values).enumerate() {
        match value {
            PartValue::Known(v) => {
                any_present = true;
                items.push(v.to_string());
            }
            PartValue::Partial(v) => {
                any_present = true;
                complete = false;
                items.push(v.to_string());
            }
            PartValue::Unknown if part.optional && last_optional.is_none_or(|j| j < i) => {}
            PartValue::Unknown => {
                complete = false;
                items.push(placeholder(&part.name));
            }
        }
    }

    let text = items.join(compound.join.as_str());
    if complete {
        Some(Synthesized::Value(text))
    } else if compound.partial && any_present {
        Some(Synthesized::Partial(text))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    fn overrides(pairs: &[(&str, &str)]) -> Overrides {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn render_empty(pairs: &[(&str, &str)]) -> String {
        let conv = builtin::pipe();
        render(conv.resolved(), &Values::new(), &overrides(pairs), " ", usize::MAX)
    }

    #[test]
    fn test_placeholder_format() {
        assert_eq!(placeholder("base"), "{base}");
    }

    #[test]
    fn test_pipe_renders_known_parts() {
        assert_eq!(render_empty(&[]), "{base}.{pipe}");
        assert_eq!(render_empty(&[("version", "10")]), "{base}.10");
        assert_eq!(
            render_empty(&[("version", "10"), ("output", "geo")]),
            "{base}.geo.10"
        );
        assert_eq!(
            render_empty(&[("version", "10"), ("output", "geo"), ("frame", "25")]),
            "{base}.geo.10.25"
        );
    }

    #[test]
    fn test_pipe_inline_placeholders() {
        assert_eq!(render_empty(&[("frame", "101")]), "{base}.{output}.{version}.101");
        assert_eq!(
            render_empty(&[("version", "10"), ("frame", "25")]),
            "{base}.{output}.10.25"
        );
        assert_eq!(render_empty(&[("output", "cache")]), "{base}.cache.{version}");
    }

    #[test]
    fn test_direct_compound_override_wins() {
        assert_eq!(
            render_empty(&[("pipe", "out.7"), ("version", "3")]),
            "{base}.out.7"
        );
    }

    #[test]
    fn test_empty_override_clears_stored_value() {
        let conv = builtin::file();
        let stored: Values = [("base", "myfile"), ("suffix", "ext")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let out = render(
            conv.resolved(),
            &stored,
            &overrides(&[("suffix", "")]),
            " ",
            usize::MAX,
        );
        assert_eq!(out, "myfile.{suffix}");
    }

    #[test]
    fn test_without_suffixes() {
        let conv = builtin::pipe_file();
        let out = render(
            conv.resolved(),
            &Values::new(),
            &overrides(&[("base", "shot")]),
            " ",
            0,
        );
        assert_eq!(out, "shot");
    }

    #[test]
    fn test_stops_after_requested_slots() {
        let conv = builtin::pipe_file();
        let out = render(
            conv.resolved(),
            &Values::new(),
            &overrides(&[("version", "3"), ("suffix", "exr")]),
            " ",
            1,
        );
        assert_eq!(out, "{base}.3");
    }
}
