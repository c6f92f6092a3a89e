//! Layered configuration resolution.
//!
//! For any configurable property the chain is: value set on the named
//! machine → value set on the appropriate default overlay → compiled-in
//! constant.  The first present value wins, and "unset" is distinct from
//! "explicitly false/zero" at every layer.  The ISO URL and checksum carry a
//! fourth layer, the memoized upstream fetch in [`iso`].

pub mod defaults;
pub mod iso;

pub use iso::{HttpIsoSource, IsoCache, IsoMetadata, IsoSource};

use std::path::Path;

use crate::error::LookupError;
use crate::spec::{Machine, NetworkConfig, WanConnection};

/// Resolves properties against one immutable [`NetworkConfig`].
///
/// A pure view over shared data: cheap to copy, safe to consult from any
/// number of parallel per-machine compilations.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    network: &'a NetworkConfig,
    iso: &'a IsoCache,
}

impl<'a> Resolver<'a> {
    /// Resolver over a loaded network and a per-run ISO cache.
    #[must_use]
    pub const fn new(network: &'a NetworkConfig, iso: &'a IsoCache) -> Self {
        Self { network, iso }
    }

    /// The network this resolver reads.
    #[must_use]
    pub const fn network(&self) -> &'a NetworkConfig {
        self.network
    }

    fn machine(&self, label: &str) -> Result<&'a Machine, LookupError> {
        self.network.registry.machine(label)
    }

    /// Netmask for machine links; fixed, not overridable.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn netmask(&self) -> &'static str {
        defaults::NETMASK
    }

    /// SSH listening port for a machine.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn ssh_port(&self, label: &str) -> Result<u16, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .ssh_port
            .or(self.network.service_defaults.ssh_port)
            .unwrap_or(defaults::SSH_PORT))
    }

    /// Administrative interface port for a machine.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn admin_port(&self, label: &str) -> Result<u16, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .admin_port
            .or(self.network.service_defaults.admin_port)
            .unwrap_or(defaults::ADMIN_PORT))
    }

    /// RAM in MiB for a service VM.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn ram(&self, label: &str) -> Result<u32, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .ram
            .or(self.network.service_defaults.ram)
            .unwrap_or(defaults::RAM_MB))
    }

    /// CPU count for a service VM.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn cpus(&self, label: &str) -> Result<u32, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .cpus
            .or(self.network.service_defaults.cpus)
            .unwrap_or(defaults::CPUS))
    }

    /// Whether unattended updates are on for a machine.
    ///
    /// An explicit `false` at any layer wins over the fallback `true`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn auto_update(&self, label: &str) -> Result<bool, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .update
            .or(self.network.service_defaults.update)
            .unwrap_or(defaults::AUTO_UPDATE))
    }

    /// KeePass database file name for a machine.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn keepass_db(&self, label: &str) -> Result<&'a str, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .keepass_db
            .as_deref()
            .or(self.network.service_defaults.keepass_db.as_deref())
            .unwrap_or(defaults::KEEPASS_DB))
    }

    /// Debian mirror host for a machine.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn debian_mirror(&self, label: &str) -> Result<&'a str, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .debian_mirror
            .as_deref()
            .or(self.network.service_defaults.debian_mirror.as_deref())
            .unwrap_or(defaults::DEBIAN_MIRROR))
    }

    /// Directory on the Debian mirror for a machine.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn debian_directory(&self, label: &str) -> Result<&'a str, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .debian_directory
            .as_deref()
            .or(self.network.service_defaults.debian_directory.as_deref())
            .unwrap_or(defaults::DEBIAN_DIRECTORY))
    }

    /// WAN connection mode, if declared at any layer.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn wan_connection(&self, label: &str) -> Result<Option<WanConnection>, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .wan_connection
            .or(self.network.service_defaults.wan_connection))
    }

    /// VM storage base directory on a hypervisor.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn vm_base(&self, label: &str) -> Result<&'a Path, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .vm_base
            .as_deref()
            .or(self.network.hypervisor_defaults.vm_base.as_deref())
            .unwrap_or_else(|| Path::new(defaults::BASE_DIRECTORY)))
    }

    /// Debian net-install ISO URL for a service.
    ///
    /// Falls through to the memoized upstream image list; resolves to `None`
    /// when no layer has a value and the fetch failed.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn debian_iso_url(&self, label: &str) -> Result<Option<&'a str>, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .debian_iso_url
            .as_deref()
            .or(self.network.service_defaults.debian_iso_url.as_deref())
            .or_else(|| {
                self.iso
                    .get(defaults::DEBIAN_ISO_BASE)
                    .map(|meta| meta.url.as_str())
            }))
    }

    /// SHA512 checksum of the net-install ISO for a service.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn debian_iso_sha512(&self, label: &str) -> Result<Option<&'a str>, LookupError> {
        let m = self.machine(label)?;
        Ok(m.overrides
            .debian_iso_sha512
            .as_deref()
            .or(self.network.service_defaults.debian_iso_sha512.as_deref())
            .or_else(|| {
                self.iso
                    .get(defaults::DEBIAN_ISO_BASE)
                    .map(|meta| meta.sha512.as_str())
            }))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use anyhow::bail;

    /// Source that always fails, for resolver tests that must not fetch.
    #[derive(Debug)]
    struct OfflineSource;

    impl IsoSource for OfflineSource {
        fn fetch(&self, _base_url: &str) -> anyhow::Result<IsoMetadata> {
            bail!("offline")
        }
    }

    fn offline_cache() -> IsoCache {
        IsoCache::new(Box::new(OfflineSource))
    }

    fn load(spec: &str) -> NetworkConfig {
        NetworkConfig::load_str(spec).unwrap()
    }

    // -----------------------------------------------------------------------
    // override precedence
    // -----------------------------------------------------------------------

    #[test]
    fn machine_override_beats_overlay_beats_constant() {
        let net = load(
            r#"{
                "sshport": 3333,
                "servers": {"web1": {"sshport": 2222}, "web2": {}},
                "users": {"alice": {}}
            }"#,
        );
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        // machine-level value
        assert_eq!(r.ssh_port("web1").unwrap(), 2222);
        // overlay value
        assert_eq!(r.ssh_port("web2").unwrap(), 3333);
    }

    #[test]
    fn constant_is_last_resort() {
        let net = load(r#"{"servers": {"web1": {}}, "users": {"alice": {}}}"#);
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert_eq!(r.ssh_port("web1").unwrap(), 65422);
        assert_eq!(r.admin_port("web1").unwrap(), 65422);
        assert_eq!(r.ram("web1").unwrap(), 2048);
        assert_eq!(r.cpus("web1").unwrap(), 1);
        assert!(r.auto_update("web1").unwrap());
        assert_eq!(r.keepass_db("web1").unwrap(), "ThornSec.kdbx");
        assert_eq!(r.debian_mirror("web1").unwrap(), "free.hands.com");
        assert_eq!(r.debian_directory("web1").unwrap(), "/debian");
        assert_eq!(r.vm_base("web1").unwrap(), Path::new("/srv/ThornSec"));
        assert_eq!(r.netmask(), "/30");
    }

    #[test]
    fn explicit_false_wins_over_default_true() {
        let net = load(r#"{"servers": {"web1": {"update": false}}, "users": {"a": {}}}"#);
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert!(!r.auto_update("web1").unwrap());
    }

    #[test]
    fn overlay_false_wins_when_machine_is_silent() {
        let net = load(r#"{"update": false, "servers": {"web1": {}}, "users": {"a": {}}}"#);
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert!(!r.auto_update("web1").unwrap());
    }

    #[test]
    fn wan_connection_resolves_to_none_when_unset() {
        let net = load(r#"{"servers": {"web1": {}}, "users": {"a": {}}}"#);
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert_eq!(r.wan_connection("web1").unwrap(), None);
    }

    #[test]
    fn hypervisor_overlay_feeds_vm_base() {
        let net = load(
            r#"{
                "hypervisor": {"vmbase": "/srv/vms"},
                "servers": {"metal1": {"types": ["hypervisor"]}},
                "users": {"a": {}}
            }"#,
        );
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert_eq!(r.vm_base("metal1").unwrap(), Path::new("/srv/vms"));
    }

    #[test]
    fn unknown_machine_is_a_lookup_error() {
        let net = load(r#"{"users": {"a": {}}}"#);
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert!(r.ssh_port("ghost").is_err());
    }

    // -----------------------------------------------------------------------
    // ISO fourth layer
    // -----------------------------------------------------------------------

    #[derive(Debug)]
    struct FixedSource;

    impl IsoSource for FixedSource {
        fn fetch(&self, base_url: &str) -> anyhow::Result<IsoMetadata> {
            Ok(IsoMetadata {
                url: format!("{base_url}debian-netinst.iso"),
                sha512: "cafe".to_string(),
            })
        }
    }

    #[test]
    fn iso_url_override_skips_the_fetch() {
        let net = load(
            r#"{"servers": {"vm1": {"debianisourl": "https://local/iso"}}, "users": {"a": {}}}"#,
        );
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert_eq!(r.debian_iso_url("vm1").unwrap(), Some("https://local/iso"));
    }

    #[test]
    fn iso_url_falls_through_to_upstream() {
        let net = load(r#"{"servers": {"vm1": {}}, "users": {"a": {}}}"#);
        let iso = IsoCache::new(Box::new(FixedSource));
        let r = Resolver::new(&net, &iso);
        let url = r.debian_iso_url("vm1").unwrap().unwrap();
        assert!(url.ends_with("debian-netinst.iso"));
        assert!(url.starts_with(defaults::DEBIAN_ISO_BASE));
        assert_eq!(r.debian_iso_sha512("vm1").unwrap(), Some("cafe"));
    }

    #[test]
    fn failed_fetch_resolves_to_absent_not_error() {
        let net = load(r#"{"servers": {"vm1": {}}, "users": {"a": {}}}"#);
        let iso = offline_cache();
        let r = Resolver::new(&net, &iso);
        assert_eq!(r.debian_iso_url("vm1").unwrap(), None);
        assert_eq!(r.debian_iso_sha512("vm1").unwrap(), None);
    }
}
