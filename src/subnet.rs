//! Branch subnet derivation
//!
//! Every branch gets three /24s keyed to its number so that ranges never
//! have to be tracked by hand. For branch value `v`, with `d = v / 100` and
//! `o = v % 100`:
//!
//! ```text
//! 10.{d}.{o}.0/24
//! 10.{120 + d}.{o}.0/24
//! 10.{130 + d}.{o}.0/24
//! ```
//!
//! Branch "351" therefore yields `10.3.51.0/24`, `10.123.51.0/24` and
//! `10.133.51.0/24`.

/// Emitted when a branch identifier carries no usable number
pub const PLACEHOLDER: &str = "10.x.x.0/24";

const SECONDARY_OFFSET: u64 = 120;
const TERTIARY_OFFSET: u64 = 130;

/// Derive the subnets for a branch identifier
///
/// Only the decimal digits of `branch` are considered, so "B-351" and
/// "351" derive the same ranges. Never fails: without digits (or with a
/// number too large to parse) the single placeholder is returned.
pub fn derive(branch: &str) -> Vec<String> {
    let digits: String = branch.chars().filter(char::is_ascii_digit).collect();
    let Ok(val) = digits.parse::<u64>() else {
        return vec![PLACEHOLDER.to_string()];
    };

    let digit1 = val / 100;
    let octet3 = val % 100;
    vec![
        format!("10.{digit1}.{octet3}.0/24"),
        format!("10.{}.{octet3}.0/24", SECONDARY_OFFSET + digit1),
        format!("10.{}.{octet3}.0/24", TERTIARY_OFFSET + digit1),
    ]
}

/// Subnets that end up in the onboarding record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetList {
    networks: Vec<String>,
}

impl SubnetList {
    /// Parse an operator-supplied override
    ///
    /// Quote characters are dropped and surrounding whitespace trimmed. A
    /// comma-separated value is split into its trimmed segments; anything
    /// else passes through as a single network. Returns `None` when nothing
    /// is left, so the caller falls back to derivation.
    pub fn from_override(raw: &str) -> Option<Self> {
        let cleaned: String = raw.chars().filter(|c| !matches!(c, '"' | '\'')).collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return None;
        }

        let networks = if cleaned.contains(',') {
            cleaned
                .split(',')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            vec![cleaned.to_string()]
        };

        if networks.is_empty() {
            return None;
        }
        Some(Self { networks })
    }

    pub fn derived(branch: &str) -> Self {
        Self {
            networks: derive(branch),
        }
    }

    /// Use the override when it has content, otherwise derive from the branch
    pub fn resolve(override_value: Option<&str>, branch: &str) -> Self {
        override_value
            .and_then(Self::from_override)
            .unwrap_or_else(|| Self::derived(branch))
    }

    pub fn networks(&self) -> &[String] {
        &self.networks
    }

    /// Comma-joined form, as pre-filled into an editable subnet field
    pub fn to_form_text(&self) -> String {
        self.networks.join(", ")
    }
}
