//! Network specification parsing and validation.
//!
//! The specification is a tree of JSON objects.  Loading follows `include`
//! references recursively (an included file replaces the whole definition),
//! validates every IP literal and label, and produces an immutable
//! [`NetworkConfig`] that the rest of the compiler reads but never mutates.

pub mod machine;
pub mod registry;

pub use machine::{Machine, NetworkInterface, Overrides, RawMachine, Role, WanConnection};
pub use registry::{MachineId, Registry};

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::SpecError;
use crate::resolve::defaults;

/// Maximum depth of the `include` chain before loading fails.
const MAX_INCLUDE_DEPTH: usize = 8;

/// Raw serde shape of a specification document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSpec {
    include: Option<PathBuf>,
    dns: Vec<String>,
    configip: Option<String>,
    myuser: Option<String>,
    domain: Option<String>,
    dtls: Option<bool>,
    adblocking: Option<bool>,
    autogenpasswds: Option<bool>,
    vpnonly: Option<bool>,
    autoguest: Option<bool>,
    hypervisor: Overrides,
    // serde_json's map preserves key order, so section iteration below is
    // source-file order.
    servers: Map<String, Value>,
    internaldevices: Map<String, Value>,
    externaldevices: Map<String, Value>,
    users: Map<String, Value>,
    // Any remaining top-level key that names an override becomes part of the
    // network-wide service-defaults overlay.
    #[serde(flatten)]
    defaults: Overrides,
}

/// The root aggregate: everything the specification says about the network.
///
/// Built once per run and read-only thereafter.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)] // independent feature flags
pub struct NetworkConfig {
    config_ip: Option<IpAddr>,
    /// DNS domain for the network.
    pub domain: String,
    /// Label of the primary admin user, if declared.
    pub my_user: Option<String>,
    /// Upstream DNS servers.
    pub upstream_dns: BTreeSet<IpAddr>,
    /// Whether upstream DNS uses DTLS.
    pub dtls: bool,
    /// Whether the router blocks ads.
    pub ad_blocking: bool,
    /// Whether passphrases are auto-generated for users without one.
    pub auto_gen_passphrases: bool,
    /// Whether the network is reachable over VPN only.
    pub vpn_only: bool,
    /// Whether to build an automatic guest network.
    pub auto_guest: bool,
    /// Network-wide fallback values for server and service properties.
    pub service_defaults: Overrides,
    /// Network-wide fallback values for hypervisor properties.
    pub hypervisor_defaults: Overrides,
    /// All machines, partitioned by role.
    pub registry: Registry,
}

impl NetworkConfig {
    /// Load a specification from disk, following `include` references.
    ///
    /// Relative `include` paths are resolved against the including file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] when a file cannot be read, the JSON is
    /// malformed, an IP literal is invalid, a label is duplicated, the
    /// include chain is too deep, or no user is declared.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        Self::load_at_depth(path, 0)
    }

    /// Load a specification from an in-memory string.
    ///
    /// An `include` reference in the text is resolved relative to the
    /// current working directory.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`NetworkConfig::load`].
    pub fn load_str(text: &str) -> Result<Self, SpecError> {
        Self::parse(text, None, 0)
    }

    fn load_at_depth(path: &Path, depth: usize) -> Result<Self, SpecError> {
        let text = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, path.parent(), depth)
    }

    fn parse(text: &str, base_dir: Option<&Path>, depth: usize) -> Result<Self, SpecError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(SpecError::IncludeDepth {
                max: MAX_INCLUDE_DEPTH,
            });
        }

        let raw: RawSpec = serde_json::from_str(text)?;

        // An include is exclusive: the referenced file is the entire
        // definition and every inline key is ignored.
        if let Some(include) = raw.include {
            let target = match base_dir {
                Some(dir) if include.is_relative() => dir.join(include),
                _ => include,
            };
            tracing::debug!("following include to {}", target.display());
            return Self::load_at_depth(&target, depth + 1);
        }

        Self::build(raw)
    }

    fn build(raw: RawSpec) -> Result<Self, SpecError> {
        let config_ip = raw
            .configip
            .as_deref()
            .map(machine::parse_ip)
            .transpose()?;

        let mut upstream_dns = BTreeSet::new();
        for entry in &raw.dns {
            upstream_dns.insert(machine::parse_ip(entry)?);
        }

        let mut registry = Registry::default();

        for (label, value) in &raw.servers {
            let entry: RawMachine = serde_json::from_value(value.clone())?;
            let mut roles = vec![Role::Server];
            for kind in &entry.types {
                match kind.as_str() {
                    "service" => roles.push(Role::Service),
                    "hypervisor" => roles.push(Role::Hypervisor),
                    // Other type strings only select profiles; validated there.
                    _ => {}
                }
            }
            let m = Machine::from_raw(label, entry)?;
            registry.insert(m, &roles, "servers")?;
        }

        for (label, value) in &raw.internaldevices {
            let entry: RawMachine = serde_json::from_value(value.clone())?;
            let m = Machine::from_raw(label, entry)?;
            registry.insert(m, &[Role::Device, Role::InternalOnly], "internaldevices")?;
        }

        for (label, value) in &raw.externaldevices {
            let entry: RawMachine = serde_json::from_value(value.clone())?;
            let m = Machine::from_raw(label, entry)?;
            registry.insert(m, &[Role::Device, Role::ExternalOnly], "externaldevices")?;
        }

        for (label, value) in &raw.users {
            let entry: RawMachine = serde_json::from_value(value.clone())?;
            let m = Machine::from_raw(label, entry)?;
            registry.insert(m, &[Role::Device, Role::User], "users")?;
        }

        // We will *always* need user devices, or there is no way to SSH in.
        if registry.role_count(Role::User) == 0 {
            return Err(SpecError::NoValidUsers);
        }

        Ok(Self {
            config_ip,
            domain: raw.domain.unwrap_or_else(|| defaults::DOMAIN.to_string()),
            my_user: raw.myuser,
            upstream_dns,
            dtls: raw.dtls.unwrap_or(defaults::DTLS),
            ad_blocking: raw.adblocking.unwrap_or(defaults::AD_BLOCKING),
            auto_gen_passphrases: raw.autogenpasswds.unwrap_or(defaults::AUTO_GEN_PASSPHRASES),
            vpn_only: raw.vpnonly.unwrap_or(defaults::VPN_ONLY),
            auto_guest: raw.autoguest.unwrap_or(defaults::AUTO_GUEST),
            service_defaults: raw.defaults,
            hypervisor_defaults: raw.hypervisor,
            registry,
        })
    }

    /// The network's own address: the router IP from inside, the public IP
    /// for an external resource.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingConfigIp`] when the specification never
    /// declared one.
    pub fn config_ip(&self) -> Result<IpAddr, SpecError> {
        self.config_ip.ok_or(SpecError::MissingConfigIp)
    }
}
