//! Remote-access profile: every managed server runs a locked-down sshd.

use crate::error::CompilerError;
use crate::resolve::Resolver;
use crate::spec::Machine;
use crate::unit::{FileUnit, Unit, pkg};

/// Installs and configures the OpenSSH daemon on the resolved port.
///
/// Remote access is the one service every server carries — it is how the
/// executor reaches the machine at all, so its units anchor most
/// precondition chains.
#[derive(Debug, Clone, Copy)]
pub struct RemoteAccess;

impl super::Profile for RemoteAccess {
    fn name(&self) -> &str {
        "remote-access"
    }

    fn installed(&self, _machine: &Machine, _resolver: &Resolver) -> Result<Vec<Unit>, CompilerError> {
        Ok(vec![pkg::installed("sshd_installed", None, "openssh-server")])
    }

    fn persistent_config(
        &self,
        machine: &Machine,
        resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        let port = resolver.ssh_port(machine.label())?;

        let mut config = FileUnit::with_message(
            "sshd_config",
            Some("sshd_installed"),
            "/etc/ssh/sshd_config",
            "Couldn't write sshd_config; you may be locked out of this machine",
        );
        config.append_line(format!("Port {port}"));
        config.append_line("Protocol 2");
        config.append_line("PermitRootLogin no");
        config.append_line("PasswordAuthentication no");
        config.append_line("ChallengeResponseAuthentication no");
        config.append_line("X11Forwarding no");
        if !machine.admins.is_empty() {
            config.append_blank();
            config.append_line(format!("AllowUsers {}", machine.admins.join(" ")));
        }

        Ok(vec![
            config.into_unit(),
            pkg::enabled("sshd_enabled", Some("sshd_config"), "ssh"),
        ])
    }

    fn live_config(
        &self,
        _machine: &Machine,
        _resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        Ok(vec![pkg::running("sshd_running", Some("sshd_enabled"), "ssh")])
    }

    fn persistent_firewall(
        &self,
        machine: &Machine,
        resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        let port = resolver.ssh_port(machine.label())?;
        let rule = format!("INPUT -p tcp --dport {port} -j ACCEPT");
        Ok(vec![Unit::new(
            "sshd_ingress",
            Some("sshd_running"),
            format!("sudo iptables -C {rule} > /dev/null 2>&1 && echo pass || echo fail"),
            format!("sudo iptables -A {rule}"),
            "pass",
            format!("Couldn't open port {port}; remote access will be blocked"),
        )])
    }
}
