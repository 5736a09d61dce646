//! Conventions every other convention builds on.
//!
//! | Convention | Parents    | Empty name               |
//! |------------|------------|--------------------------|
//! | `Name`     |            | `{base}`                 |
//! | `File`     | Name       | `{base}.{suffix}`        |
//! | `Pipe`     | Name       | `{base}.{pipe}`          |
//! | `PipeFile` | Pipe, File | `{base}.{pipe}.{suffix}` |

use std::sync::LazyLock;

use phf::{Map, phf_map};

use crate::convention::Convention;
use crate::layer::{CompoundSpec, Layer};

static NAME: LazyLock<Convention> =
    LazyLock::new(|| builtin("Name", &[], Layer::new().field("base", r"\w+")));

static FILE: LazyLock<Convention> = LazyLock::new(|| {
    builtin(
        "File",
        &[name()],
        Layer::new().field("suffix", r"\w+").suffix("suffix", "."),
    )
});

static PIPE: LazyLock<Convention> = LazyLock::new(|| {
    builtin(
        "Pipe",
        &[name()],
        Layer::new()
            .field("output", r"\w+")
            .field("version", r"\d+")
            .field("frame", r"\d+")
            .compound_with(
                CompoundSpec::new("pipe")
                    .optional("output")
                    .part("version")
                    .optional("frame")
                    .join(".")
                    .partial(),
            )
            .suffix("pipe", "."),
    )
});

static PIPE_FILE: LazyLock<Convention> =
    LazyLock::new(|| builtin("PipeFile", &[pipe(), file()], Layer::new()));

fn builtin(name: &str, parents: &[&Convention], layer: Layer) -> Convention {
    Convention::define(name, parents, layer)
        .unwrap_or_else(|err| panic!("built-in convention {name} is invalid: {err}"))
}

/// A single `base` field.
pub fn name() -> &'static Convention {
    &NAME
}

/// `base` plus a `.suffix` extension.
pub fn file() -> &'static Convention {
    &FILE
}

/// `base` plus a `.output.version.frame` pipeline slot where only the
/// version is required.
pub fn pipe() -> &'static Convention {
    &PIPE
}

pub fn pipe_file() -> &'static Convention {
    &PIPE_FILE
}

type Builtin = fn() -> &'static Convention;

/// Built-in conventions by lowercase name.
const BUILTINS: Map<&'static str, Builtin> = phf_map! {
    "file" => file as Builtin,
    "name" => name as Builtin,
    "pipe" => pipe as Builtin,
    "pipefile" => pipe_file as Builtin,
};

/// Look up a built-in convention, ignoring case.
pub fn lookup(name: &str) -> Option<&'static Convention> {
    BUILTINS.get(name.to_ascii_lowercase().as_str()).map(|get| get())
}

/// Names accepted by [`lookup`].
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Name;

    #[test]
    fn test_empty_names() {
        assert_eq!(Name::new(name()).get_name(), "{base}");
        assert_eq!(Name::new(file()).get_name(), "{base}.{suffix}");
        assert_eq!(Name::new(pipe()).get_name(), "{base}.{pipe}");
        assert_eq!(Name::new(pipe_file()).get_name(), "{base}.{pipe}.{suffix}");
    }

    #[test]
    fn test_pipe_fields() {
        assert_eq!(pipe().layout(), ["base"]);
        assert_eq!(
            pipe().fields(),
            ["base", "pipe", "output", "version", "frame"]
        );
        assert_eq!(
            pipe_file().fields(),
            ["base", "pipe", "output", "version", "frame", "suffix"]
        );
    }

    #[test]
    fn test_pipe_values() {
        let n = Name::parse(pipe(), "initname.cache.7.101").unwrap();
        assert_eq!(n.value("output"), Some("cache"));
        assert_eq!(n.value("version"), Some("7"));
        assert_eq!(n.value("frame"), Some("101"));
        assert_eq!(n.nice_name(), "initname");
        assert!(Name::parse(pipe(), "initname").is_err());
    }

    #[test]
    fn test_lookup() {
        assert!(std::ptr::eq(lookup("PipeFile").unwrap(), pipe_file()));
        assert!(std::ptr::eq(lookup("file").unwrap(), file()));
        assert!(lookup("nope").is_none());
        let mut names: Vec<_> = names().collect();
        names.sort_unstable();
        assert_eq!(names, ["file", "name", "pipe", "pipefile"]);
    }
}
