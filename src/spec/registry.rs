//! Arena-backed machine registry: one machine per label, many role views.
//!
//! Machines live in a flat arena; role views hold [`MachineId`] indices so a
//! machine registered under several role tags is always the same underlying
//! record.  Insertion order is preserved per role for reproducible output.

use std::collections::{BTreeMap, HashMap};

use crate::error::{LookupError, SpecError};
use crate::spec::machine::{Machine, Role};

/// Index of a machine in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineId(usize);

/// The two-level role → label → machine mapping, immutable after load.
#[derive(Debug, Default)]
pub struct Registry {
    machines: Vec<Machine>,
    // label → (arena index, section it was declared in)
    by_label: HashMap<String, (MachineId, &'static str)>,
    by_role: BTreeMap<Role, Vec<MachineId>>,
}

impl Registry {
    /// Register a machine under every given role tag.
    ///
    /// `section` is the specification section the entry came from, used to
    /// report duplicate labels.  A label seen in two sections is a
    /// data-validation error rather than a silent overwrite.
    pub(crate) fn insert(
        &mut self,
        mut machine: Machine,
        roles: &[Role],
        section: &'static str,
    ) -> Result<MachineId, SpecError> {
        if let Some((_, first)) = self.by_label.get(machine.label()) {
            return Err(SpecError::DuplicateLabel {
                label: machine.label().to_string(),
                first: (*first).to_string(),
                second: section.to_string(),
            });
        }

        for role in roles {
            machine.add_role(*role);
        }

        let id = MachineId(self.machines.len());
        self.by_label
            .insert(machine.label().to_string(), (id, section));
        for role in roles {
            self.by_role.entry(*role).or_default().push(id);
        }
        self.machines.push(machine);
        Ok(id)
    }

    /// Look up a machine by label, anywhere in the network.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMachine`] when no machine carries the
    /// label.
    pub fn machine(&self, label: &str) -> Result<&Machine, LookupError> {
        self.by_label
            .get(label)
            .and_then(|(id, _)| self.machines.get(id.0))
            .ok_or_else(|| LookupError::UnknownMachine(label.to_string()))
    }

    /// Machines carrying the given role tag, in specification order.
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &Machine> {
        self.by_role
            .get(&role)
            .into_iter()
            .flatten()
            .filter_map(|id| self.machines.get(id.0))
    }

    /// Number of machines with the given role tag.
    #[must_use]
    pub fn role_count(&self, role: Role) -> usize {
        self.by_role.get(&role).map_or(0, Vec::len)
    }

    /// Total number of distinct machines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    /// Whether the registry holds no machines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// All machines in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }
}
