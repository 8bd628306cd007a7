//! Region registry
//!
//! Maps the region names operators type in to the canonical region id used
//! in onboarding object names and the default SPN for that region.
//!
//! | Display name | Canonical id | Default SPN |
//! |--------------|--------------|-------------|
//! | US Central | `us-central` | `us-central-tanoak` |
//! | US East | `us-east` | `us-east-butternut` |
//! | US Southeast | `us-southeast` | `us-southeast-mahogony` |
//! | US Northwest | `us-northwest` | `us-northwest-scabiosa` |
//! | US West | `us-southwest` | `us-southwest-argan` |
//! | US Northeast | `us-east` | `us-east-butternut` |
//! | US Southwest | `us-southwest` | `us-southwest-argan` |
//!
//! US West and US Northeast share their ids and SPNs with US Southwest and
//! US East. These rows are kept exactly as provisioned.

/// One registry row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEntry {
    /// Name shown to operators and emitted in the onboarding `region` field
    pub display: &'static str,
    /// Canonical id used in generated object names
    pub id: &'static str,
    /// Default service-processing-node name
    pub spn: &'static str,
}

const REGIONS: &[RegionEntry] = &[
    RegionEntry {
        display: "US Central",
        id: "us-central",
        spn: "us-central-tanoak",
    },
    RegionEntry {
        display: "US East",
        id: "us-east",
        spn: "us-east-butternut",
    },
    RegionEntry {
        display: "US Southeast",
        id: "us-southeast",
        spn: "us-southeast-mahogony",
    },
    RegionEntry {
        display: "US Northwest",
        id: "us-northwest",
        spn: "us-northwest-scabiosa",
    },
    RegionEntry {
        display: "US West",
        id: "us-southwest",
        spn: "us-southwest-argan",
    },
    RegionEntry {
        display: "US Northeast",
        id: "us-east",
        spn: "us-east-butternut",
    },
    RegionEntry {
        display: "US Southwest",
        id: "us-southwest",
        spn: "us-southwest-argan",
    },
];

/// Look up a region by its exact display name
pub fn lookup(display: &str) -> Option<&'static RegionEntry> {
    REGIONS.iter().find(|entry| entry.display == display)
}

/// All registry rows, in display order
pub fn all() -> &'static [RegionEntry] {
    REGIONS
}
