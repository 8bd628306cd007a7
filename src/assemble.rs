//! Config block assembly
//!
//! Turns one [`BranchInput`] into the ordered configuration lines for that
//! branch:
//!
//! 1. Banner naming the branch and region
//! 2. Primary IKE gateway and IPSec tunnel
//! 3. Backup IKE gateway and IPSec tunnel (only when backup is enabled)
//! 4. Remote-network onboarding record
//!
//! Object names are pure functions of the branch number, the region's
//! canonical id and the configured domain, so regenerating a branch always
//! yields identical text.
//!
//! # Failure
//!
//! A block fails when the region is missing from the registry or when a
//! pre-shared key holds a line break (or another control character other
//! than tab) that cannot be carried verbatim. Callers that need text rather
//! than a `Result` use [`Assembler::render`], which degrades to a single
//! line starting with [`ERROR_PREFIX`].

use crate::config::Config;
use crate::peer;
use crate::region;
use crate::statement::{self, comment, Statement};
use crate::subnet::SubnetList;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix of the diagnostic line produced in place of a block
pub const ERROR_PREFIX: &str = "# ERROR:";

const LICENSE_TYPE: &str = "FWAAS-AGGREGATE";
const LOCAL_INTERFACE: &str = "vlan";
const TUNNEL_INTERFACE: &str = "tunnel";
const BANNER_RULE: &str =
    "-------------------------------------------------------------------------";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("Region '{region}' not recognized (branch {branch})")]
    UnknownRegion { region: String, branch: String },
    #[error("{field} for branch {branch} contains control character {found:?}")]
    UnrepresentableKey {
        field: &'static str,
        branch: String,
        found: char,
    },
}

impl AssembleError {
    /// The single comment line emitted instead of a block
    pub fn diagnostic_line(&self) -> String {
        comment(&format!("ERROR: {self}"))
    }
}

/// Parameters for one branch site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInput {
    /// Branch number; only its digits matter for subnet derivation
    pub branch: String,
    /// Region display name, must match a registry entry
    pub region: String,
    /// Subnet override, comma-separated or a single network
    pub subnets: Option<String>,
    pub psk: String,
    /// "dynamic" or a literal address
    pub peer_ip: String,
    pub backup_enabled: bool,
    pub backup_peer_ip: String,
    /// Falls back to `psk` when absent or empty
    pub backup_psk: Option<String>,
    /// Overrides the region's default SPN when non-empty
    pub spn: Option<String>,
}

impl Default for BranchInput {
    fn default() -> Self {
        Self {
            branch: String::new(),
            region: String::new(),
            subnets: None,
            psk: String::new(),
            peer_ip: peer::DYNAMIC.to_string(),
            backup_enabled: false,
            backup_peer_ip: peer::DYNAMIC.to_string(),
            backup_psk: None,
            spn: None,
        }
    }
}

impl BranchInput {
    pub fn new(branch: &str, region: &str, psk: &str) -> Self {
        Self {
            branch: branch.to_string(),
            region: region.to_string(),
            psk: psk.to_string(),
            ..Self::default()
        }
    }
}

/// Names of the objects behind one tunnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelNames {
    pub gateway: String,
    pub tunnel: String,
    pub peer_id: String,
}

/// Every generated object name for a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    /// `b<branch>`
    pub branch_id: String,
    pub primary: TunnelNames,
    pub backup: TunnelNames,
    /// `b<branch>-rn-<region id>`
    pub onboarding: String,
}

impl ObjectNames {
    pub fn new(branch: &str, region_id: &str, domain: &str) -> Self {
        let branch_id = format!("b{branch}");
        Self {
            primary: TunnelNames {
                gateway: format!("{branch_id}-ikegw-pri"),
                tunnel: format!("{branch_id}-ipsec-pri"),
                peer_id: format!("{branch_id}-primary.{domain}"),
            },
            backup: TunnelNames {
                gateway: format!("{branch_id}-ikegw-bak"),
                tunnel: format!("{branch_id}-ipsec-bak"),
                peer_id: format!("{branch_id}-backup.{domain}"),
            },
            onboarding: format!("{branch_id}-rn-{region_id}"),
            branch_id,
        }
    }
}

/// Generated configuration for exactly one branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
    lines: Vec<String>,
}

impl ConfigBlock {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Newline-terminated text of the whole block
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for ConfigBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Single-tunnel layout, no primary/backup labels
    Sole,
    Primary,
    Backup,
}

impl Role {
    fn header(self, object: &str) -> String {
        match self {
            Role::Sole => comment(&format!("--- {object} ---")),
            Role::Primary => comment(&format!("--- PRIMARY {object} ---")),
            Role::Backup => comment(&format!("--- BACKUP {object} ---")),
        }
    }

    fn qualifier(self) -> &'static str {
        match self {
            Role::Sole => "",
            Role::Primary => " (Primary)",
            Role::Backup => " (Backup)",
        }
    }
}

/// Builds config blocks against one resolved [`Config`]
pub struct Assembler<'a> {
    config: &'a Config,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn assemble(&self, input: &BranchInput) -> Result<ConfigBlock, AssembleError> {
        let Some(entry) = region::lookup(&input.region) else {
            return Err(AssembleError::UnknownRegion {
                region: input.region.clone(),
                branch: input.branch.clone(),
            });
        };

        let spn = input
            .spn
            .as_deref()
            .map(str::trim)
            .filter(|spn| !spn.is_empty())
            .unwrap_or(entry.spn);
        let subnets = SubnetList::resolve(input.subnets.as_deref(), &input.branch);
        let names = ObjectNames::new(&input.branch, entry.id, &self.config.naming.domain);

        let backup_support = self.config.generation.backup_support;
        if input.backup_enabled && !backup_support {
            warn!(
                "Branch {}: backup requested but backup support is disabled, ignoring",
                input.branch
            );
        }
        let with_backup = backup_support && input.backup_enabled;
        let backup_psk = input
            .backup_psk
            .as_deref()
            .filter(|key| !key.is_empty())
            .unwrap_or(input.psk.as_str());

        check_key("PSK", &input.branch, &input.psk)?;
        if with_backup {
            check_key("Backup PSK", &input.branch, backup_psk)?;
        }
        let primary_role = if backup_support {
            Role::Primary
        } else {
            Role::Sole
        };

        let mut lines = vec![
            comment(BANNER_RULE),
            comment(&format!("BRANCH {} [{}]", input.branch, input.region)),
            comment(BANNER_RULE),
            String::new(),
        ];

        lines.extend(self.gateway_block(
            primary_role,
            &names,
            &names.primary,
            &input.peer_ip,
            &input.psk,
            &input.region,
        ));
        lines.push(String::new());
        lines.extend(self.tunnel_block(primary_role, &names, &names.primary, &input.region));
        lines.push(String::new());

        if with_backup {
            lines.extend(self.gateway_block(
                Role::Backup,
                &names,
                &names.backup,
                &input.backup_peer_ip,
                backup_psk,
                &input.region,
            ));
            lines.push(String::new());
            lines.extend(self.tunnel_block(Role::Backup, &names, &names.backup, &input.region));
            lines.push(String::new());
        }

        lines.extend(self.onboarding_block(&names, &input.region, with_backup, &subnets, spn));

        debug!(
            "Assembled branch {} ({} lines, backup={})",
            input.branch,
            lines.len(),
            with_backup
        );
        Ok(ConfigBlock { lines })
    }

    /// Block text, or the diagnostic line when the region is unknown
    pub fn render(&self, input: &BranchInput) -> String {
        match self.assemble(input) {
            Ok(block) => block.render(),
            Err(e) => {
                warn!("{}", e);
                let mut line = e.diagnostic_line();
                line.push('\n');
                line
            }
        }
    }

    fn gateway_block(
        &self,
        role: Role,
        names: &ObjectNames,
        tunnel: &TunnelNames,
        peer_ip: &str,
        psk: &str,
        region: &str,
    ) -> Vec<String> {
        let naming = &self.config.naming;
        let gw = || Statement::ike_gateway(&naming.template, &tunnel.gateway);

        let mut lines = vec![
            role.header("IKE GATEWAY"),
            gw().words("protocol version ikev2").build(),
            gw().words("protocol ikev2 dpd enable yes").build(),
            gw().words("protocol ikev2 ike-crypto-profile")
                .value(&naming.ike_crypto_profile)
                .build(),
            gw().words("local-address interface")
                .words(LOCAL_INTERFACE)
                .build(),
        ];
        lines.extend(peer::resolve(&naming.template, &tunnel.gateway, peer_ip));
        lines.extend([
            gw().words("protocol-common nat-traversal enable yes").build(),
            gw().words("protocol-common fragmentation enable no").build(),
            gw().words("peer-id type fqdn id").value(&tunnel.peer_id).build(),
            gw().words("authentication pre-shared-key key").value(psk).build(),
            gw().words("comment")
                .quoted(&format!(
                    "{} - IKE Gateway - {region}{}",
                    names.branch_id,
                    role.qualifier()
                ))
                .build(),
        ]);
        lines
    }

    fn tunnel_block(
        &self,
        role: Role,
        names: &ObjectNames,
        tunnel: &TunnelNames,
        region: &str,
    ) -> Vec<String> {
        let naming = &self.config.naming;
        let ipsec = || Statement::ipsec_tunnel(&naming.template, &tunnel.tunnel);

        vec![
            role.header("IPSEC TUNNEL"),
            ipsec().words("auto-key ike-gateway").value(&tunnel.gateway).build(),
            ipsec().words("auto-key ipsec-crypto-profile")
                .value(&naming.ipsec_crypto_profile)
                .build(),
            ipsec().words("tunnel-monitor enable no").build(),
            ipsec().words("tunnel-interface").words(TUNNEL_INTERFACE).build(),
            ipsec().words("comment")
                .quoted(&format!(
                    "{} - IPSec Tunnel - {region}{}",
                    names.branch_id,
                    role.qualifier()
                ))
                .build(),
        ]
    }

    fn onboarding_block(
        &self,
        names: &ObjectNames,
        region: &str,
        with_backup: bool,
        subnets: &SubnetList,
        spn: &str,
    ) -> Vec<String> {
        let rn = || Statement::onboarding(&self.config.naming.tenant, &names.onboarding);

        let mut lines = vec![
            comment("--- ONBOARDING ---"),
            rn().words("protocol bgp enable no").build(),
            rn().words("region").quoted(region).build(),
            rn().words("ipsec-tunnel").value(&names.primary.tunnel).build(),
            rn().words("secondary-wan-enabled")
                .words(if with_backup { "yes" } else { "no" })
                .build(),
        ];
        if with_backup {
            lines.push(
                rn().words("secondary-ipsec-tunnel")
                    .value(&names.backup.tunnel)
                    .build(),
            );
        }
        lines.extend([
            rn().words("subnets").list(subnets.networks()).build(),
            rn().words("spn-name").value(spn).build(),
            rn().words("license-type").words(LICENSE_TYPE).build(),
        ]);
        lines
    }
}

fn check_key(field: &'static str, branch: &str, key: &str) -> Result<(), AssembleError> {
    match statement::unrepresentable(key) {
        Some(found) => Err(AssembleError::UnrepresentableKey {
            field,
            branch: branch.to_string(),
            found,
        }),
        None => Ok(()),
    }
}
