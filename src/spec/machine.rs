//! Machine records and the raw serde shapes they parse from.

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::SpecError;

/// A classification a machine may hold one or more of.
///
/// Role tags are projections over one underlying [`Machine`]: an internal
/// device, for example, is simultaneously `Device` and `InternalOnly`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// A configured server.
    Server,
    /// A service VM running on a hypervisor.
    Service,
    /// Any managed endpoint that is not a server.
    Device,
    /// A device that must never reach the WAN.
    InternalOnly,
    /// A device that only talks to the WAN.
    ExternalOnly,
    /// A user's endpoint; grants remote access.
    User,
    /// A machine hosting service VMs.
    Hypervisor,
}

impl Role {
    /// Stable lower-case name for logs and rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Service => "service",
            Self::Device => "device",
            Self::InternalOnly => "internal-only",
            Self::ExternalOnly => "external-only",
            Self::User => "user",
            Self::Hypervisor => "hypervisor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a server reaches the WAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WanConnection {
    /// Address from upstream DHCP.
    Dhcp,
    /// Statically configured address.
    Static,
    /// PPP dial-up/DSL style connection.
    Ppp,
}

/// One network interface on a machine.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInterface {
    /// Interface name, e.g. `eth0`.
    pub iface: String,
    /// Statically assigned address, if any.
    #[serde(default)]
    pub address: Option<IpAddr>,
    /// Hardware address, if pinned.
    #[serde(default)]
    pub mac: Option<String>,
}

/// Nullable per-machine configuration values.
///
/// The same record doubles as a default overlay: parsed from the top level of
/// the specification it provides the network-wide fallback layer consulted by
/// the resolver.  "Unset" is distinct from "explicitly false/zero" at every
/// layer, which is why every field is an `Option`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Overrides {
    /// RAM in MiB for a service VM.
    pub ram: Option<u32>,
    /// CPU count for a service VM.
    pub cpus: Option<u32>,
    /// SSH listening port.
    #[serde(rename = "sshport")]
    pub ssh_port: Option<u16>,
    /// Administrative interface port.
    #[serde(rename = "adminport")]
    pub admin_port: Option<u16>,
    /// Whether unattended updates are on.
    pub update: Option<bool>,
    /// KeePass database file name.
    #[serde(rename = "keepassdb")]
    pub keepass_db: Option<String>,
    /// Debian net-install ISO URL.
    #[serde(rename = "debianisourl")]
    pub debian_iso_url: Option<String>,
    /// SHA512 checksum of the net-install ISO.
    #[serde(rename = "debianisosha512")]
    pub debian_iso_sha512: Option<String>,
    /// Debian mirror host.
    #[serde(rename = "debianmirror")]
    pub debian_mirror: Option<String>,
    /// Directory on the Debian mirror.
    #[serde(rename = "debiandir")]
    pub debian_directory: Option<String>,
    /// WAN connection mode.
    #[serde(rename = "wanconnection")]
    pub wan_connection: Option<WanConnection>,
    /// Base directory for VM storage on a hypervisor.
    #[serde(rename = "vmbase")]
    pub vm_base: Option<PathBuf>,
}

/// Raw serde shape of one machine entry in a specification section.
///
/// Unknown keys are tolerated; recognised override keys land in the flattened
/// [`Overrides`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMachine {
    /// Per-machine override values.
    #[serde(flatten)]
    pub overrides: Overrides,
    /// Server type strings (e.g. `service`, `hypervisor`, `dedicated`).
    pub types: Vec<String>,
    /// Alternative DNS names.
    pub cnames: Vec<String>,
    /// Externally routable addresses, as strings pending validation.
    #[serde(rename = "externalips")]
    pub external_ips: Vec<String>,
    /// LAN-facing interfaces.
    pub lan: Vec<NetworkInterface>,
    /// WAN-facing interfaces.
    pub wan: Vec<NetworkInterface>,
    /// User labels with administrative access to this machine.
    pub admins: Vec<String>,
}

/// A network-addressable entity under management.
///
/// The label is the sole lookup key and is unique across the whole network
/// regardless of role.
#[derive(Debug, Clone)]
pub struct Machine {
    label: String,
    roles: BTreeSet<Role>,
    /// Server type strings, as declared.
    pub types: Vec<String>,
    /// Alternative DNS names.
    pub cnames: Vec<String>,
    /// Externally routable addresses.
    pub external_ips: Vec<IpAddr>,
    /// LAN-facing interfaces.
    pub lan: Vec<NetworkInterface>,
    /// WAN-facing interfaces.
    pub wan: Vec<NetworkInterface>,
    /// User labels with administrative access.
    pub admins: Vec<String>,
    /// Per-machine override values consulted first by the resolver.
    pub overrides: Overrides,
}

impl Machine {
    /// Build a machine from its raw serde shape, validating IP literals.
    pub(crate) fn from_raw(label: &str, raw: RawMachine) -> Result<Self, SpecError> {
        let mut external_ips = Vec::with_capacity(raw.external_ips.len());
        for ip in &raw.external_ips {
            external_ips.push(parse_ip(ip)?);
        }
        Ok(Self {
            label: label.to_string(),
            roles: BTreeSet::new(),
            types: raw.types,
            cnames: raw.cnames,
            external_ips,
            lan: raw.lan,
            wan: raw.wan,
            admins: raw.admins,
            overrides: raw.overrides,
        })
    }

    /// Unique, case-sensitive label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the machine carries the given role tag.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// All role tags this machine carries.
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    pub(crate) fn add_role(&mut self, role: Role) {
        self.roles.insert(role);
    }
}

/// Parse an IP address literal, mapping failure to the data-validation error.
pub(crate) fn parse_ip(value: &str) -> Result<IpAddr, SpecError> {
    value
        .trim()
        .parse()
        .map_err(|_| SpecError::InvalidIpAddress(value.to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn raw_machine_parses_overrides_and_attributes() {
        let raw: RawMachine = serde_json::from_str(
            r#"{
                "sshport": 2222,
                "ram": 4096,
                "update": false,
                "types": ["service"],
                "cnames": ["www"],
                "externalips": ["198.51.100.7"],
                "lan": [{"iface": "eth0", "address": "10.0.0.2"}]
            }"#,
        )
        .unwrap();
        assert_eq!(raw.overrides.ssh_port, Some(2222));
        assert_eq!(raw.overrides.ram, Some(4096));
        assert_eq!(raw.overrides.update, Some(false));
        assert_eq!(raw.types, vec!["service"]);
        assert_eq!(raw.lan[0].iface, "eth0");
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let raw: RawMachine = serde_json::from_str(r#"{"futureknob": true}"#).unwrap();
        assert!(raw.overrides.ssh_port.is_none());
    }

    #[test]
    fn machine_from_raw_validates_external_ips() {
        let raw: RawMachine =
            serde_json::from_str(r#"{"externalips": ["not-an-ip"]}"#).unwrap();
        let err = Machine::from_raw("web1", raw).unwrap_err();
        assert!(matches!(err, SpecError::InvalidIpAddress(v) if v == "not-an-ip"));
    }

    #[test]
    fn wan_connection_parses_lowercase() {
        let raw: RawMachine = serde_json::from_str(r#"{"wanconnection": "dhcp"}"#).unwrap();
        assert_eq!(raw.overrides.wan_connection, Some(WanConnection::Dhcp));
    }

    #[test]
    fn roles_accumulate() {
        let mut m = Machine::from_raw("sensor1", RawMachine::default()).unwrap();
        m.add_role(Role::Device);
        m.add_role(Role::InternalOnly);
        assert!(m.has_role(Role::Device));
        assert!(m.has_role(Role::InternalOnly));
        assert!(!m.has_role(Role::Server));
        assert_eq!(m.roles().count(), 2);
    }

    #[test]
    fn parse_ip_trims_whitespace() {
        assert_eq!(
            parse_ip(" 192.0.2.1 ").unwrap(),
            "192.0.2.1".parse::<IpAddr>().unwrap()
        );
    }
}
