//! Package and service unit constructors.
//!
//! Small helpers for the recurring shapes profiles emit: "this package is
//! installed", "this service is running", "this service is enabled".

use super::Unit;

/// Unit asserting a Debian package is installed.
#[must_use]
pub fn installed(name: &str, precondition: Option<&str>, package: &str) -> Unit {
    Unit::new(
        name,
        precondition,
        format!("sudo dpkg-query -W -f='${{Status}}' {package} 2>&1"),
        format!("sudo apt-get -y install {package}"),
        "install ok installed",
        format!("Couldn't install {package}; dependent services will not work"),
    )
}

/// Unit asserting a systemd service is active.
#[must_use]
pub fn running(name: &str, precondition: Option<&str>, service: &str) -> Unit {
    Unit::new(
        name,
        precondition,
        format!("sudo systemctl is-active {service} 2>&1"),
        format!("sudo systemctl restart {service}"),
        "active",
        format!("{service} is not running; check its logs on the machine"),
    )
}

/// Unit asserting a systemd service is enabled at boot.
#[must_use]
pub fn enabled(name: &str, precondition: Option<&str>, service: &str) -> Unit {
    Unit::new(
        name,
        precondition,
        format!("sudo systemctl is-enabled {service} 2>&1"),
        format!("sudo systemctl enable {service}"),
        "enabled",
        format!("{service} will not start at boot"),
    )
}
