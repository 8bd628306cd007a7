//! Derived single-site fields
//!
//! An interactive front end pre-fills the subnet and SPN fields from the
//! branch number and region, and refreshes them whenever either changes.
//! The core keeps no form state; callers invoke [`DerivedFields::recompute`]
//! on every upstream change.

use crate::region;
use crate::subnet::SubnetList;

/// Values a single-site form pre-fills
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFields {
    /// Comma-joined derived subnets, or the placeholder
    pub subnets: String,
    /// Default SPN of the region; `None` when the region is unknown
    pub spn: Option<&'static str>,
}

impl DerivedFields {
    pub fn recompute(branch: &str, region: &str) -> Self {
        Self {
            subnets: SubnetList::derived(branch).to_form_text(),
            spn: region::lookup(region).map(|entry| entry.spn),
        }
    }
}
