//! The `check` subcommand: load and validate a specification without
//! compiling any plans.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::GlobalOpts;
use crate::profiles::profiles_for;
use crate::spec::{NetworkConfig, Role};

/// Load the specification, resolve profiles for every server, and report a
/// one-line summary.
///
/// # Errors
///
/// Returns an error when the specification fails to load or a server
/// declares an unknown type.
pub fn run(global: &GlobalOpts) -> Result<()> {
    let network = NetworkConfig::load(&global.spec)
        .with_context(|| format!("loading {}", global.spec.display()))?;

    // Surface unknown server types now rather than at compile time.
    for machine in network.registry.by_role(Role::Server) {
        let profiles = profiles_for(machine)?;
        debug!(
            "{}: {}",
            machine.label(),
            profiles
                .iter()
                .map(|p| p.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    info!(
        "{} is valid: {} machines ({} servers, {} users), domain {}",
        global.spec.display(),
        network.registry.len(),
        network.registry.role_count(Role::Server),
        network.registry.role_count(Role::User),
        network.domain,
    );
    Ok(())
}
