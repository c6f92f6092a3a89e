//! Dedicated-server profile.
//!
//! A dedicated server is something the network needs to know about but should
//! not attempt to configure beyond baseline egress: it still needs to reach
//! the Debian and VirtualBox CDNs to keep itself updated.

use crate::error::CompilerError;
use crate::resolve::Resolver;
use crate::spec::Machine;
use crate::unit::Unit;

const EGRESS_HOSTS: [&str; 4] = [
    "cdn.debian.net",
    "security-cdn.debian.org",
    "prod.debian.map.fastly.net",
    "download.virtualbox.org",
];

/// Emits egress-allow firewall units only.
#[derive(Debug, Clone, Copy)]
pub struct Dedicated;

impl super::Profile for Dedicated {
    fn name(&self) -> &str {
        "dedicated"
    }

    fn persistent_firewall(
        &self,
        _machine: &Machine,
        _resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        let mut units = Vec::with_capacity(EGRESS_HOSTS.len() * 2);
        for host in EGRESS_HOSTS {
            for port in [80u16, 443] {
                units.push(egress(host, port));
            }
        }
        Ok(units)
    }
}

fn egress(host: &str, port: u16) -> Unit {
    let slug = host.replace(['.', '-'], "_");
    let rule = format!("OUTPUT -p tcp -d {host} --dport {port} -j ACCEPT");
    Unit::new(
        format!("egress_{slug}_{port}"),
        None,
        format!("sudo iptables -C {rule} > /dev/null 2>&1 && echo pass || echo fail"),
        format!("sudo iptables -A {rule}"),
        "pass",
        format!("Couldn't allow egress to {host}:{port}; updates may fail"),
    )
}
