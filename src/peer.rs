//! IKE peer address policy
//!
//! A gateway either knows its remote peer's address up front or it does
//! not. An unknown ("dynamic") peer must initiate, so the gateway is put in
//! passive mode. A static peer gets its literal address and no passive-mode
//! statement.

use crate::statement::{comment, Statement};
use std::net::IpAddr;
use tracing::{debug, warn};

/// Keyword operators use for a peer without a fixed address
pub const DYNAMIC: &str = "dynamic";

/// Comment emitted in place of passive mode for a static peer
pub const STATIC_PEER_NOTE: &str = "Note: Passive mode removed for static peer";

/// Remote peer of an IKE gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddress {
    /// Address unknown in advance, peer initiates
    Dynamic,
    /// Literal peer address, as entered
    Static(String),
}

impl PeerAddress {
    /// Classify a peer IP field
    ///
    /// Empty input and any casing of "dynamic" mean [`PeerAddress::Dynamic`].
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(DYNAMIC) {
            PeerAddress::Dynamic
        } else {
            PeerAddress::Static(value.to_string())
        }
    }
}

impl From<&str> for PeerAddress {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// Peer-address lines for one gateway
pub fn resolve(template: &str, gateway: &str, peer_ip: &str) -> Vec<String> {
    peer_lines(template, gateway, &PeerAddress::parse(peer_ip))
}

pub fn peer_lines(template: &str, gateway: &str, peer: &PeerAddress) -> Vec<String> {
    match peer {
        PeerAddress::Dynamic => {
            debug!("Gateway {}: dynamic peer, passive mode", gateway);
            vec![
                Statement::ike_gateway(template, gateway)
                    .words("peer-address dynamic")
                    .build(),
                Statement::ike_gateway(template, gateway)
                    .words("protocol-common passive-mode yes")
                    .build(),
            ]
        }
        PeerAddress::Static(ip) => {
            if ip.parse::<IpAddr>().is_err() {
                warn!("Gateway {}: peer '{}' is not an IP address", gateway, ip);
            }
            debug!("Gateway {}: static peer {}", gateway, ip);
            vec![
                Statement::ike_gateway(template, gateway)
                    .words("peer-address ip")
                    .value(ip)
                    .build(),
                comment(STATIC_PEER_NOTE),
            ]
        }
    }
}
