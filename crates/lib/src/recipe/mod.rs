//! Package recipes: the declarative input to resolution.
//!
//! A recipe names a package, its versions and where to retrieve them, its
//! boolean variants with their build effects, the dependencies it may pull
//! in, and how it is built. Recipes are validated once when loaded and are
//! immutable afterwards; all of them live in a [`Registry`].

mod error;
mod load;
mod registry;
mod types;

pub use error::DefinitionError;
pub use load::{load_recipe, parse_recipe};
pub(crate) use load::is_valid_name;
pub use registry::Registry;
pub use types::{
  BuildRecipe, BuildSystem, DependencyDecl, Effect, GitReference, PackageDefinition, PatchDecl, Source, Variant,
  VersionDecl,
};
