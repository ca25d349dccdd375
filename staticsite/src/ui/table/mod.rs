//! Table rendering for command output.

mod site_list_ext;

/// Re-exports the [`SiteListExt`] trait, which renders a slice of sites as
/// the table printed by `list`.
pub use self::site_list_ext::SiteListExt;
