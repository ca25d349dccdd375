use kube::{Resource, ResourceExt};
use snafu::OptionExt;

use super::{Error, error};
use crate::site::StaticSite;

/// Stamps `object` with a controller reference back to `site`.
///
/// The reference lets the garbage collector cascade deletion of the site to
/// `object` and lets the controller map events on `object` back to `site`.
/// Re-attaching replaces a previous reference to the same site.
///
/// # Errors
///
/// Returns [`Error::OwnerReference`] if `site` lacks the name or uid the
/// reference needs, which only happens for sites that were never persisted.
pub fn attach_owner<K>(site: &StaticSite, object: &mut K) -> Result<(), Error>
where
    K: Resource<DynamicType = ()>,
{
    let owner = site.controller_owner_ref(&()).with_context(|| error::OwnerReferenceSnafu {
        kind: K::kind(&()).to_string(),
        name: object.meta().name.clone().unwrap_or_default(),
        site: site.name_any(),
    })?;

    let owner_references = object.meta_mut().owner_references.get_or_insert_with(Vec::new);
    owner_references.retain(|reference| reference.uid != owner.uid);
    owner_references.push(owner);
    Ok(())
}
