//! Profile modules that emit units for a service or machine category.
//!
//! A profile consumes the registry and resolver and contributes units to the
//! four compilation phases.  Profiles are independent of each other; the
//! dependency compiler is what ties their units into one ordered plan.

pub mod dedicated;
pub mod ssh;

pub use dedicated::Dedicated;
pub use ssh::RemoteAccess;

use crate::error::{CompilerError, LookupError};
use crate::resolve::Resolver;
use crate::spec::Machine;
use crate::unit::{Phase, Unit};

/// An independent module contributing units for one machine.
///
/// Each phase method returns the units for that phase, empty by default.
/// Units may name preconditions emitted by the same profile, another
/// profile, or an earlier phase.
pub trait Profile: Send + Sync + std::fmt::Debug {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Units for the install phase.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilerError`] when a resolution the profile needs
    /// fails.
    fn installed(&self, machine: &Machine, resolver: &Resolver) -> Result<Vec<Unit>, CompilerError> {
        let _ = (machine, resolver);
        Ok(Vec::new())
    }

    /// Units for the persistent-config phase.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilerError`] when a resolution the profile needs
    /// fails.
    fn persistent_config(
        &self,
        machine: &Machine,
        resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        let _ = (machine, resolver);
        Ok(Vec::new())
    }

    /// Units for the live-config phase.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilerError`] when a resolution the profile needs
    /// fails.
    fn live_config(
        &self,
        machine: &Machine,
        resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        let _ = (machine, resolver);
        Ok(Vec::new())
    }

    /// Units for the firewall phase.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilerError`] when a resolution the profile needs
    /// fails.
    fn persistent_firewall(
        &self,
        machine: &Machine,
        resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        let _ = (machine, resolver);
        Ok(Vec::new())
    }

    /// Dispatch to the phase method.
    ///
    /// # Errors
    ///
    /// Returns a [`CompilerError`] when a resolution the profile needs
    /// fails.
    fn units_for(
        &self,
        phase: Phase,
        machine: &Machine,
        resolver: &Resolver,
    ) -> Result<Vec<Unit>, CompilerError> {
        match phase {
            Phase::Install => self.installed(machine, resolver),
            Phase::PersistentConfig => self.persistent_config(machine, resolver),
            Phase::LiveConfig => self.live_config(machine, resolver),
            Phase::Firewall => self.persistent_firewall(machine, resolver),
        }
    }
}

/// The active profiles for a machine, selected by its declared types.
///
/// Every server gets [`RemoteAccess`].  A type string no profile claims is a
/// lookup error.
///
/// # Errors
///
/// Returns [`LookupError::UnknownServerType`] for an unclaimed type string.
pub fn profiles_for(machine: &Machine) -> Result<Vec<Box<dyn Profile>>, LookupError> {
    let mut active: Vec<Box<dyn Profile>> = vec![Box::new(RemoteAccess)];
    for kind in &machine.types {
        match kind.as_str() {
            "dedicated" => active.push(Box::new(Dedicated)),
            // Role tags, not profiles.
            "service" | "hypervisor" => {}
            other => {
                return Err(LookupError::UnknownServerType {
                    label: machine.label().to_string(),
                    kind: other.to_string(),
                });
            }
        }
    }
    Ok(active)
}
