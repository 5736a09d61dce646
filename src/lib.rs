//! Structured names built from regex-governed fields.
//!
//! A [`Convention`] describes how a name is put together: named fields, each
//! with a pattern fragment, joined by a separator. Conventions inherit from
//! each other, may combine fields into compounds and may drop inherited
//! fields. A [`Name`] holds one string following a convention and lets you
//! read and change its fields without breaking it.
//!
//! # Example
//!
//! ```rust
//! use naming::{Convention, Layer, Name, builtin};
//!
//! let shot = Convention::define(
//!     "Shot",
//!     &[builtin::pipe_file()],
//!     Layer::new().field("sequence", "[a-z]{3}").field("shot", r"\d{4}"),
//! )
//! .unwrap();
//!
//! let mut name = Name::new(&shot);
//! assert_eq!(name.get_name(), "{base} {sequence} {shot}.{pipe}.{suffix}");
//!
//! name.set_name("plate abc 0010.1.exr").unwrap();
//! name.set_value("output", "comp").unwrap();
//! name.set_value("version", 12).unwrap();
//! assert_eq!(name.to_string(), "plate abc 0010.comp.12.exr");
//! assert_eq!(name.nice_name(), "plate abc 0010");
//! ```

pub mod builtin;
mod compound;
mod convention;
mod error;
mod layer;
mod name;
mod pattern;
mod render;

pub use convention::{Convention, DEFAULT_SEPARATOR};
pub use error::{ConfigError, Error, ValidationError};
pub use layer::{CompoundSpec, Layer, Part};
pub use name::{Name, Values};
pub use pattern::Pattern;
pub use render::placeholder;
