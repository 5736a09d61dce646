//! Declarations made by one level of a convention hierarchy.
//!
//! A [`Layer`] only records what a level declares. Merging layers and
//! resolving compounds happens in [`crate::convention`].

/// One part of a compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub optional: bool,
}

/// A field whose value is the concatenation of other fields' values.
///
/// Parts are joined with `join` (or the convention's join separator when
/// unset). Optional parts are positional: a later optional part can only be
/// present when every earlier optional part is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSpec {
    pub name: String,
    pub parts: Vec<Part>,
    pub join: Option<String>,
    /// Render known parts with inline placeholders for the unknown ones
    /// instead of falling back to the compound's own placeholder.
    pub partial: bool,
}

impl CompoundSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
            join: None,
            partial: false,
        }
    }

    /// A compound made only of required parts.
    pub fn of<I, S>(name: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        parts.into_iter().fold(Self::new(name), Self::part)
    }

    pub fn part(mut self, name: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            optional: false,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            optional: true,
        });
        self
    }

    pub fn join(mut self, join: impl Into<String>) -> Self {
        self.join = Some(join.into());
        self
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }
}

/// The declarations of a single convention level.
///
/// ```rust
/// use naming::{CompoundSpec, Layer};
///
/// let layer = Layer::new()
///     .field("first", r"\d+")
///     .field("second", "[a-zA-Z]+")
///     .compound("base", ["first", "second"])
///     .drop("legacy");
/// # let _ = layer;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) compounds: Vec<CompoundSpec>,
    pub(crate) constants: Vec<(String, String)>,
    pub(crate) suffixes: Vec<(String, String)>,
    pub(crate) drops: Vec<String>,
    pub(crate) join_sep: Option<String>,
    pub(crate) layout: Option<Vec<String>>,
    pub(crate) extend_layout: Vec<String>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or override) a field and its regex fragment.
    pub fn field(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.fields.push((name.into(), pattern.into()));
        self
    }

    /// Declare a compound of required parts.
    pub fn compound<I, S>(self, name: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compound_with(CompoundSpec::of(name, parts))
    }

    pub fn compound_with(mut self, spec: CompoundSpec) -> Self {
        self.compounds.push(spec);
        self
    }

    /// A fixed value, matched literally and always rendered.
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.push((name.into(), value.into()));
        self
    }

    /// A trailing slot introduced by `delimiter` rather than the separator.
    pub fn suffix(mut self, name: impl Into<String>, delimiter: impl Into<String>) -> Self {
        self.suffixes.push((name.into(), delimiter.into()));
        self
    }

    /// Remove a name from this convention and everything derived from it.
    pub fn drop(mut self, name: impl Into<String>) -> Self {
        self.drops.push(name.into());
        self
    }

    /// Default join string for compounds that don't set their own.
    pub fn join_sep(mut self, join: impl Into<String>) -> Self {
        self.join_sep = Some(join.into());
        self
    }

    /// Replace the inherited top-level field order.
    pub fn layout<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layout = Some(names.into_iter().map(Into::into).collect());
        self.extend_layout.clear();
        self
    }

    /// Append to the inherited top-level field order.
    pub fn extend_layout<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend_layout.extend(names.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_of_marks_parts_required() {
        let spec = CompoundSpec::of("base", ["first", "second"]);
        assert_eq!(spec.parts.len(), 2);
        assert!(spec.parts.iter().all(|p| !p.optional));
        assert_eq!(spec.join, None);
        assert!(!spec.partial);
    }

    #[test]
    fn test_compound_builder_keeps_part_order() {
        let spec = CompoundSpec::new("pipe")
            .optional("output")
            .part("version")
            .optional("frame")
            .join(".")
            .partial();
        let names: Vec<_> = spec.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["output", "version", "frame"]);
        assert_eq!(
            spec.parts.iter().map(|p| p.optional).collect::<Vec<_>>(),
            [true, false, true]
        );
        assert_eq!(spec.join.as_deref(), Some("."));
        assert!(spec.partial);
    }

    #[test]
    fn test_layout_replaces_pending_extension() {
        let layer = Layer::new().extend_layout(["role"]).layout(["full_name"]);
        assert_eq!(layer.layout, Some(vec!["full_name".to_string()]));
        assert!(layer.extend_layout.is_empty());
    }
}
