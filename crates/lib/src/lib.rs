//! spackle-lib: recipe resolution and build plan compilation.
//!
//! This crate turns declarative package recipes into concrete build plans:
//! - `recipe`: package definitions, their TOML format and the `Registry`
//! - `matcher`: `when` predicates over (partially) resolved specs
//! - `inherit`: variant values forced across dependency edges
//! - `resolve`: the dependency closure of a `Request`
//! - `plan`: ordered environment and tool steps for each resolved `Spec`

pub mod config;
pub mod consts;
pub mod inherit;
pub mod matcher;
pub mod placeholder;
pub mod plan;
pub mod recipe;
pub mod request;
pub mod resolve;
pub mod spec;
mod syntax;
pub mod util;
pub mod version;

pub use syntax::SyntaxError;
