//! Compiled-in fallback values, the last layer of every resolution chain.

use std::time::Duration;

/// Netmask for point-to-point machine links.
pub const NETMASK: &str = "/30";
/// SSH listening port.
pub const SSH_PORT: u16 = 65422;
/// Administrative interface port.
pub const ADMIN_PORT: u16 = 65422;
/// Service VM RAM in MiB.
pub const RAM_MB: u32 = 2048;
/// Service VM CPU count.
pub const CPUS: u32 = 1;
/// Unattended updates on by default.
pub const AUTO_UPDATE: bool = true;
/// KeePass database file name.
pub const KEEPASS_DB: &str = "ThornSec.kdbx";
/// Debian mirror host.
pub const DEBIAN_MIRROR: &str = "free.hands.com";
/// Directory on the Debian mirror.
pub const DEBIAN_DIRECTORY: &str = "/debian";
/// Base URL listing current Debian net-install images.
pub const DEBIAN_ISO_BASE: &str =
    "https://gensho.ftp.acc.umu.se/debian-cd/current/amd64/iso-cd/";
/// Base directory for VM storage on a hypervisor.
pub const BASE_DIRECTORY: &str = "/srv/ThornSec";

/// DNS domain.
pub const DOMAIN: &str = "lan";
/// Upstream DNS over DTLS.
pub const DTLS: bool = true;
/// Ad blocking at the router.
pub const AD_BLOCKING: bool = false;
/// Auto-generated user passphrases.
pub const AUTO_GEN_PASSPHRASES: bool = false;
/// VPN-only network.
pub const VPN_ONLY: bool = false;
/// Automatic guest network.
pub const AUTO_GUEST: bool = false;

/// Upper bound on the optional upstream metadata fetch.  The fetch must never
/// block a run indefinitely; on timeout the property resolves to absent.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
