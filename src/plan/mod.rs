//! The unit dependency compiler.
//!
//! Collects the units every profile contributed for a machine, validates the
//! precondition graph exhaustively, and emits one linear, idempotent
//! [`ExecutionPlan`] per phase.  Determinism is part of the contract: the
//! same units in the same contribution order always compile to a
//! byte-identical plan.

mod graph;

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{DependencyError, DependencyIssue};
use crate::unit::{Phase, Unit};

/// Units contributed for one machine, bucketed by phase in contribution
/// order.
#[derive(Debug, Default)]
pub struct PhaseUnits {
    install: Vec<Unit>,
    persistent_config: Vec<Unit>,
    live_config: Vec<Unit>,
    firewall: Vec<Unit>,
}

impl PhaseUnits {
    /// Add one unit to a phase.
    pub fn push(&mut self, phase: Phase, unit: Unit) {
        self.bucket_mut(phase).push(unit);
    }

    /// Add units to a phase, preserving their order.
    pub fn extend(&mut self, phase: Phase, units: impl IntoIterator<Item = Unit>) {
        self.bucket_mut(phase).extend(units);
    }

    /// Units contributed to a phase so far.
    #[must_use]
    pub fn get(&self, phase: Phase) -> &[Unit] {
        match phase {
            Phase::Install => &self.install,
            Phase::PersistentConfig => &self.persistent_config,
            Phase::LiveConfig => &self.live_config,
            Phase::Firewall => &self.firewall,
        }
    }

    fn bucket_mut(&mut self, phase: Phase) -> &mut Vec<Unit> {
        match phase {
            Phase::Install => &mut self.install,
            Phase::PersistentConfig => &mut self.persistent_config,
            Phase::LiveConfig => &mut self.live_config,
            Phase::Firewall => &mut self.firewall,
        }
    }

    fn into_buckets(self) -> [(Phase, Vec<Unit>); 4] {
        [
            (Phase::Install, self.install),
            (Phase::PersistentConfig, self.persistent_config),
            (Phase::LiveConfig, self.live_config),
            (Phase::Firewall, self.firewall),
        ]
    }
}

/// The ordered unit sequence for one phase of one machine.
///
/// Invariants: every precondition appears strictly earlier (or in an earlier
/// phase); no name repeats; the sequence is a valid topological order of the
/// precondition graph.
#[derive(Debug, Serialize)]
pub struct ExecutionPlan {
    phase: Phase,
    units: Vec<Unit>,
}

impl ExecutionPlan {
    /// The phase this plan belongs to.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Units in execution order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Number of units in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the plan holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// All four phase plans for one machine.
#[derive(Debug, Serialize)]
pub struct MachinePlan {
    machine: String,
    phases: Vec<ExecutionPlan>,
}

impl MachinePlan {
    /// Label of the machine this plan converges.
    #[must_use]
    pub fn machine(&self) -> &str {
        &self.machine
    }

    /// Phase plans in execution order (install first, firewall last).
    #[must_use]
    pub fn phases(&self) -> &[ExecutionPlan] {
        &self.phases
    }

    /// Total unit count across phases.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.phases.iter().map(ExecutionPlan::len).sum()
    }

    /// Names of every unit whose transitive precondition chain includes
    /// `failed`, in plan order.
    ///
    /// This is the set an executor must halt when `failed` ends in the
    /// `Failed` state; units outside it may still proceed.  The failed unit
    /// itself is not included.
    #[must_use]
    pub fn halted_by(&self, failed: &str) -> Vec<String> {
        let mut halted: Vec<String> = Vec::new();
        let mut blocked: HashSet<&str> = HashSet::new();
        blocked.insert(failed);
        for plan in &self.phases {
            for unit in &plan.units {
                if let Some(pre) = unit.precondition()
                    && blocked.contains(pre)
                {
                    blocked.insert(unit.name());
                    halted.push(unit.name().to_string());
                }
            }
        }
        halted
    }

    /// Human-readable rendering, stable across runs.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "machine {}", self.machine);
        for plan in &self.phases {
            if plan.is_empty() {
                continue;
            }
            let _ = writeln!(out, "[{}]", plan.phase());
            for unit in plan.units() {
                match unit.precondition() {
                    Some(pre) => {
                        let _ = writeln!(out, "  {} (requires {pre})", unit.name());
                    }
                    None => {
                        let _ = writeln!(out, "  {}", unit.name());
                    }
                }
            }
        }
        out
    }
}

/// Compile one phase in isolation.
///
/// Preconditions must name units in the same set; see [`compile_machine`]
/// for the cross-phase rules.
///
/// # Errors
///
/// Returns a [`DependencyError`] listing every duplicate name, dangling
/// precondition, and cycle found.
pub fn compile(phase: Phase, units: Vec<Unit>) -> Result<ExecutionPlan, DependencyError> {
    let mut source = PhaseUnits::default();
    source.extend(phase, units);
    let plan = compile_machine("", source)?;
    plan.phases
        .into_iter()
        .find(|p| p.phase() == phase)
        .ok_or(DependencyError { issues: vec![] })
}

/// Compile all four phases for one machine.
///
/// A later phase's units may name an earlier phase's units as
/// preconditions; the reverse direction, duplicate names, dangling
/// references, and cycles are collected exhaustively into one
/// [`DependencyError`].  On error no plan is returned, partial or otherwise.
///
/// # Errors
///
/// Returns a [`DependencyError`] listing every issue found across all four
/// phases.
pub fn compile_machine(
    machine: &str,
    units: PhaseUnits,
) -> Result<MachinePlan, DependencyError> {
    let buckets = units.into_buckets();
    let mut issues = Vec::new();

    // Pass 1: map every name to its phase, catching duplicates across the
    // whole machine plan.
    let mut phase_of: HashMap<String, Phase> = HashMap::new();
    for (phase, bucket) in &buckets {
        for unit in bucket {
            if phase_of.insert(unit.name().to_string(), *phase).is_some() {
                issues.push(DependencyIssue::DuplicateName(unit.name().to_string()));
            }
        }
    }

    // Pass 2: per phase, classify preconditions and order the graph.
    let mut phases = Vec::with_capacity(buckets.len());
    for (phase, bucket) in buckets {
        let index_of: HashMap<&str, usize> = bucket
            .iter()
            .enumerate()
            .map(|(i, u)| (u.name(), i))
            .collect();

        let mut edges = Vec::new();
        for (i, unit) in bucket.iter().enumerate() {
            let Some(pre) = unit.precondition() else {
                continue;
            };
            if let Some(&from) = index_of.get(pre) {
                edges.push((from, i));
            } else {
                match phase_of.get(pre) {
                    // Satisfied by an earlier phase: treat as a root.
                    Some(&other) if other < phase => {}
                    Some(&other) => issues.push(DependencyIssue::PhaseOrderViolation {
                        unit: unit.name().to_string(),
                        unit_phase: phase,
                        precondition: pre.to_string(),
                        precondition_phase: other,
                    }),
                    None => issues.push(DependencyIssue::UnknownPrecondition {
                        unit: unit.name().to_string(),
                        precondition: pre.to_string(),
                    }),
                }
            }
        }

        match graph::stable_topo(bucket.len(), &edges) {
            Ok(order) => {
                let mut slots: Vec<Option<Unit>> = bucket.into_iter().map(Some).collect();
                let units = order
                    .into_iter()
                    .filter_map(|i| slots.get_mut(i).and_then(Option::take))
                    .collect();
                phases.push(ExecutionPlan { phase, units });
            }
            Err(stuck) => {
                let members = stuck
                    .into_iter()
                    .filter_map(|i| bucket.get(i).map(|u| u.name().to_string()))
                    .collect();
                issues.push(DependencyIssue::Cycle { members });
            }
        }
    }

    if issues.is_empty() {
        Ok(MachinePlan {
            machine: machine.to_string(),
            phases,
        })
    } else {
        Err(DependencyError { issues })
    }
}
