//! A single name bound to a convention.
//!
//! A [`Name`] is either empty or bound to a string the convention's pattern
//! accepts. Every mutation re-renders the whole name and re-parses it, and a
//! failed mutation leaves the instance exactly as it was.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::convention::Convention;
use crate::error::{ConfigError, Error, ValidationError};
use crate::pattern::Pattern;
use crate::render::{self, Overrides};


/// Field values keyed by field name, in pattern order.
pub type Values = IndexMap<String, String>;

/// A name following a [`Convention`].
#[derive(Debug, Clone)]
pub struct Name<'c> {
    convention: &'c Convention,
    pattern: Arc<Pattern>,
    /// The raw string last accepted; `None` while empty.
    name: Option<String>,
    values: Values,
}

impl<'c> Name<'c> {
    /// An empty name using the default separator.
    pub fn new(convention: &'c Convention) -> Self {
        Self {
            convention,
            pattern: Arc::clone(convention.default_pattern()),
            name: None,
            values: Values::new(),
        }
    }

    pub fn with_separator(convention: &'c Convention, separator: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: convention.pattern(separator)?,
            ..Self::new(convention)
        })
    }

    /// Parse `initial` with the default separator. An empty string gives an
    /// empty name.
    pub fn parse(convention: &'c Convention, initial: &str) -> Result<Self, ValidationError> {
        let mut name = Self::new(convention);
        name.set_name(initial)?;
        Ok(name)
    }

    pub fn parse_with_separator(
        convention: &'c Convention,
        initial: &str,
        separator: &str,
    ) -> Result<Self, Error> {
        let mut name = Self::with_separator(convention, separator)?;
        name.set_name(initial)?;
        Ok(name)
    }

    pub fn convention(&self) -> &'c Convention {
        self.convention
    }

    /// The raw string this name is bound to.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.name.is_some()
    }

    pub fn clear(&mut self) {
        self.name = None;
        self.values.clear();
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Every field this name can carry.
    pub fn fields(&self) -> &'c [String] {
        self.convention.fields()
    }

    /// Bind to `name`, replacing every stored value.
    ///
    /// The empty string clears the name. On failure nothing changes.
    pub fn set_name(&mut self, name: &str) -> Result<(), ValidationError> {
        if name.is_empty() {
            self.clear();
            return Ok(());
        }
        match self.pattern.parse(name) {
            Some(values) => {
                self.name = Some(name.to_string());
                self.values = values;
                Ok(())
            }
            None => {
                debug!(
                    convention = self.convention.name(),
                    input = name,
                    pattern = self.pattern.as_str(),
                    "rejected name"
                );
                Err(ValidationError::InvalidName {
                    input: name.to_string(),
                    pattern: self.pattern.as_str().to_string(),
                    template: self.pattern.template().to_string(),
                })
            }
        }
    }

    /// The current name. Unknown fields render as `{field}` placeholders.
    pub fn get_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.render(&Overrides::new(), usize::MAX),
        }
    }

    /// The name with some fields replaced, without changing this instance.
    ///
    /// An empty override value clears that field.
    pub fn get_name_with<I, K, V>(&self, overrides: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let overrides: Overrides = overrides
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        if overrides.is_empty() {
            return self.get_name();
        }
        self.render(&overrides, usize::MAX)
    }

    /// The separator-joined fields, without trailing suffix slots.
    pub fn nice_name(&self) -> String {
        self.render(&Overrides::new(), 0)
    }

    /// The nice name followed by the `pipe` slot, e.g. `shot.geo.12`.
    ///
    /// `None` when the convention has no `pipe` slot.
    pub fn pipe_name(&self) -> Option<String> {
        let slot = self.convention.suffixes().position(|(name, _)| name == "pipe")?;
        Some(self.render(&Overrides::new(), slot + 1))
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// A snapshot of every field that has a value.
    pub fn values(&self) -> Values {
        self.values.clone()
    }

    /// Set one field by re-rendering and re-parsing the whole name.
    ///
    /// Setting a field to its current value does nothing. The empty string
    /// clears the field. The call fails, leaving the name untouched, if the
    /// rendered name does not parse or reads back a different value.
    pub fn set_value(&mut self, field: &str, value: impl ToString) -> Result<(), ValidationError> {
        if !self.convention.has_field(field) {
            return Err(ValidationError::UnknownField {
                input: self.get_name(),
                field: field.to_string(),
                convention: self.convention.name().to_string(),
            });
        }
        let value = value.to_string();
        if self.value(field).unwrap_or_default() == value {
            return Ok(());
        }

        let overrides = Overrides::from([(field.to_string(), value.clone())]);
        let candidate = self.render(&overrides, usize::MAX);
        let Some(values) = self.pattern.parse(&candidate) else {
            debug!(
                convention = self.convention.name(),
                field,
                value = %value,
                input = %candidate,
                "rejected field value"
            );
            return Err(ValidationError::InvalidField {
                field: field.to_string(),
                value,
                field_pattern: self
                    .convention
                    .field_pattern(field)
                    .map(Cow::into_owned)
                    .unwrap_or_default(),
                input: candidate,
                pattern: self.pattern.as_str().to_string(),
            });
        };

        let found = values.get(field);
        let stable = if value.is_empty() {
            found.is_none()
        } else {
            found == Some(&value)
        };
        if !stable {
            return Err(ValidationError::Unstable {
                input: candidate,
                field: field.to_string(),
                expected: value,
                found: found.cloned(),
            });
        }

        self.name = Some(candidate);
        self.values = values;
        Ok(())
    }

    pub fn separator(&self) -> &str {
        self.pattern.separator()
    }

    /// Switch to another separator, re-rendering a bound name with it.
    ///
    /// Fails, leaving the name untouched, if the new separator makes any
    /// stored value read back differently.
    pub fn set_separator(&mut self, separator: &str) -> Result<(), Error> {
        if separator == self.separator() {
            return Ok(());
        }
        let pattern = self.convention.pattern(separator)?;
        if !self.is_bound() {
            self.pattern = pattern;
            return Ok(());
        }

        let candidate = render::render(
            self.convention.resolved(),
            &self.values,
            &Overrides::new(),
            separator,
            usize::MAX,
        );
        let Some(values) = pattern.parse(&candidate) else {
            return Err(ValidationError::InvalidName {
                input: candidate,
                pattern: pattern.as_str().to_string(),
                template: pattern.template().to_string(),
            }
            .into());
        };
        for (field, expected) in &self.values {
            let found = values.get(field);
            if found != Some(expected) {
                debug!(
                    convention = self.convention.name(),
                    separator,
                    field = %field,
                    "separator changes a stored value"
                );
                return Err(ValidationError::Unstable {
                    input: candidate,
                    field: field.clone(),
                    expected: expected.clone(),
                    found: found.cloned(),
                }
                .into());
            }
        }

        self.pattern = pattern;
        self.name = Some(candidate);
        self.values = values;
        Ok(())
    }

    fn render(&self, overrides: &Overrides, suffixes: usize) -> String {
        render::render(
            self.convention.resolved(),
            &self.values,
            overrides,
            self.pattern.separator(),
            suffixes,
        )
    }
}

impl fmt::Display for Name<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_name())
    }
}
