//! Error types for convention resolution and name validation.

use thiserror::Error;

/// A convention was declared in a way that can never produce a valid pattern.
///
/// Raised once, when the convention is resolved. A convention that fails to
/// resolve cannot be used to create names.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A compound names a part that is neither a field, a constant nor
    /// another compound.
    #[error("{convention}: compound '{compound}' has unresolvable part '{missing}'")]
    UnresolvedCompound {
        convention: String,
        compound: String,
        missing: String,
    },

    /// Compounds that depend on each other in a loop.
    #[error("{convention}: compound cycle between {}", .compounds.join(", "))]
    CompoundCycle {
        convention: String,
        compounds: Vec<String>,
    },

    /// Every part of the compound is optional, so it could match nothing.
    #[error("{convention}: compound '{compound}' has no required part")]
    NoRequiredPart {
        convention: String,
        compound: String,
    },

    /// Nothing is left to build a name from.
    #[error("{convention}: no fields left to build a name from")]
    EmptyLayout { convention: String },

    /// A name in the layout has no pattern.
    #[error("{convention}: layout entry '{field}' is not a field, compound or constant")]
    UnknownLayoutField { convention: String, field: String },

    /// The combined pattern does not compile, e.g. a field captured twice.
    #[error("{convention}: invalid pattern: {source}")]
    InvalidPattern {
        convention: String,
        #[source]
        source: regex::Error,
    },
}

/// A name string, or a field value, was rejected by a convention's pattern.
///
/// Always recoverable: the name that produced it is left exactly as it was.
/// Pattern text is reported raw, as declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "Can not set invalid name \"{input}\". A valid name should match pattern: {pattern} (e.g. \"{template}\")"
    )]
    InvalidName {
        input: String,
        pattern: String,
        template: String,
    },

    #[error(
        "Can't set field '{field}' with invalid value '{value}' on name \"{input}\". A valid field value should match pattern: {field_pattern}"
    )]
    InvalidField {
        field: String,
        value: String,
        field_pattern: String,
        input: String,
        pattern: String,
    },

    /// `input` is the name the field was to be set on.
    #[error("Unknown field '{field}' for convention {convention} on name \"{input}\"")]
    UnknownField {
        field: String,
        convention: String,
        input: String,
    },

    /// The name matched, but reading it back changes a field value.
    /// Typically a separator that also occurs inside a field value.
    #[error("Name \"{input}\" does not keep field '{field}' as '{expected}' (parsed as {found:?})")]
    Unstable {
        input: String,
        field: String,
        expected: String,
        found: Option<String>,
    },
}

impl ValidationError {
    /// The name that was rejected, or the name a rejected field was to be
    /// set on.
    pub fn input(&self) -> &str {
        match self {
            Self::InvalidName { input, .. }
            | Self::InvalidField { input, .. }
            | Self::UnknownField { input, .. }
            | Self::Unstable { input, .. } => input,
        }
    }

    /// The pattern the input was checked against, if one was involved.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::InvalidName { pattern, .. } | Self::InvalidField { pattern, .. } => Some(pattern),
            Self::UnknownField { .. } | Self::Unstable { .. } => None,
        }
    }
}

/// Either kind of failure, for calls that can hit both.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
