//! The anchored regular expression a convention parses and validates with.

use itertools::Itertools;
use regex::Regex;
use tracing::trace;

use crate::convention::Resolved;
use crate::render::{self, Overrides};
use crate::Values;

/// A convention's fields joined by one separator into a single anchored
/// regular expression, one named group per field.
#[derive(Debug)]
pub struct Pattern {
    regex: Regex,
    separator: String,
    /// The name an empty instance renders to, e.g. `{base}.{pipe}`.
    template: String,
}

impl Pattern {
    pub(crate) fn compile(resolved: &Resolved, separator: &str) -> Result<Self, regex::Error> {
        let group = |name: &String| {
            let inner = resolved.pattern_of(name).unwrap_or_default();
            format!("(?P<{name}>{inner})")
        };
        let body = resolved
            .layout
            .iter()
            .map(group)
            .join(&regex::escape(separator));
        let tail: String = resolved
            .suffixes
            .iter()
            .map(|(name, delim)| format!("{}{}", regex::escape(delim), group(name)))
            .collect();
        let source = format!("^{body}{tail}$");
        trace!(convention = %resolved.name, pattern = %source, "compiled pattern");

        let template = render::render(
            resolved,
            &Values::new(),
            &Overrides::new(),
            separator,
            usize::MAX,
        );
        Ok(Self {
            regex: Regex::new(&source)?,
            separator: separator.to_string(),
            template,
        })
    }

    /// The full pattern text.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// A well-formed name made only of placeholders.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Names of every capture group, in pattern order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }

    /// The value of every group that took part in the match.
    pub fn parse(&self, name: &str) -> Option<Values> {
        let caps = self.regex.captures(name)?;
        Some(
            self.regex
                .capture_names()
                .flatten()
                .filter_map(|group| caps.name(group).map(|m| (group.to_string(), m.as_str().to_string())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::builtin;

    #[test]
    fn test_pipe_file_pattern_text() {
        let pattern = builtin::pipe_file().pattern("_").unwrap();
        assert_eq!(
            pattern.as_str(),
            r"^(?P<base>\w+)\.(?P<pipe>(?:(?P<output>\w+)\.)?(?P<version>\d+)(?:\.(?P<frame>\d+))?)\.(?P<suffix>\w+)$"
        );
        assert_eq!(pattern.separator(), "_");
        assert_eq!(pattern.template(), "{base}.{pipe}.{suffix}");
    }

    #[test]
    fn test_separator_is_escaped() {
        let conv = crate::Convention::define(
            "Two",
            &[builtin::name()],
            crate::Layer::new().field("tail", r"\d+"),
        )
        .unwrap();
        let pattern = conv.pattern(".*").unwrap();
        assert!(pattern.is_match("abc.*12"));
        assert!(!pattern.is_match("abc.xx12"));
        assert_eq!(pattern.template(), "{base}.*{tail}");
    }

    #[test]
    fn test_match_is_anchored() {
        let pattern = builtin::file().pattern(" ").unwrap();
        assert!(pattern.is_match("hello.png"));
        assert!(!pattern.is_match("hello.png "));
        assert!(!pattern.is_match(" hello.png"));
        assert!(pattern.parse("not matching").is_none());
    }

    #[test]
    fn test_parse_skips_groups_that_did_not_take_part() {
        let pattern = builtin::pipe().pattern(" ").unwrap();
        let values = pattern.parse("initname.7").unwrap();
        let keys: Vec<_> = values.keys().map(String::as_str).collect();
        assert_eq!(keys, ["base", "pipe", "version"]);
        assert_eq!(values["pipe"], "7");

        let values = pattern.parse("initname.geo.0.1").unwrap();
        assert_eq!(values["output"], "geo");
        assert_eq!(values["version"], "0");
        assert_eq!(values["frame"], "1");
    }
}
