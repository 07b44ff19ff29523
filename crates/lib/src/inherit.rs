//! Variant values forced across a dependency edge by its inheritance set.

use std::collections::BTreeMap;

use tracing::trace;

use crate::matcher::SpecView;
use crate::recipe::{DefinitionError, DependencyDecl, PackageDefinition};

/// Variant assignments a dependency must take from its dependent.
pub type ForcedVariants = BTreeMap<String, bool>;

/// Compute what `decl` forces onto `child` given `parent`'s current values.
///
/// A name the parent does not declare is a recipe defect. A name the child
/// does not declare is skipped: inheritance is best-effort on the receiving
/// side. The parent must have settled every inherited variant already.
pub fn propagate(
  parent: &impl SpecView,
  parent_def: &PackageDefinition,
  decl: &DependencyDecl,
  child: &PackageDefinition,
) -> Result<ForcedVariants, DefinitionError> {
  let mut forced = ForcedVariants::new();

  for name in &decl.inherit {
    let unknown = || DefinitionError::UnknownVariant {
      package: parent_def.name.clone(),
      variant: name.clone(),
      context: format!("inherit list of dependency '{}'", decl.package),
    };

    if !parent_def.has_variant(name) {
      return Err(unknown());
    }
    let Some(value) = parent.variant(name) else {
      return Err(unknown());
    };

    if !child.has_variant(name) {
      trace!(
        parent = parent.package(),
        child = %child.name,
        variant = %name,
        "dependency does not declare inherited variant, skipping"
      );
      continue;
    }

    forced.insert(name.clone(), value);
  }

  Ok(forced)
}
