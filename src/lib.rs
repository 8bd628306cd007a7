//! Prisma RN Config - remote-network tunnel config generator
//!
//! This crate turns a handful of per-branch parameters (branch number,
//! region, subnets, pre-shared key, peer IP, optional backup tunnel) into
//! the CLI statements that provision a branch's IKE gateway, IPSec tunnel
//! and remote-network onboarding record.
//!
//! # Architecture
//!
//! - `config`: Naming constants and generation mode (TOML)
//! - `region`: Region display name to canonical id and default SPN
//! - `subnet`: Branch number to /24 subnet derivation
//! - `statement`: Statement builder with value escaping
//! - `peer`: Dynamic vs static peer policy
//! - `assemble`: Per-branch config block assembly
//! - `form`: Derived fields for single-site entry
//! - `batch`: Row files, normalization and batch runs
//!
//! # Usage
//!
//! ```bash
//! prisma-rn generate --branch 351 --region "US Central" --psk Secret123
//! prisma-rn batch branches.toml --output bulk_prisma_config.txt
//! ```

pub mod assemble;
pub mod batch;
pub mod config;
pub mod form;
pub mod peer;
pub mod region;
pub mod statement;
pub mod subnet;

pub use assemble::{AssembleError, Assembler, BranchInput, ConfigBlock};
pub use batch::{BatchError, BatchResult, InputRow};
pub use config::Config;
pub use form::DerivedFields;
