//! The `compile` subcommand: specification in, one ordered plan per managed
//! server out.
//!
//! Machines compile independently, in parallel by default.  One machine's
//! dependency errors never block another machine's plan; failures are
//! reported together at the end.

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use tracing::{debug, error};

use crate::cli::{CompileOpts, GlobalOpts};
use crate::error::CompilerError;
use crate::plan::{self, MachinePlan, PhaseUnits};
use crate::profiles::profiles_for;
use crate::resolve::{IsoCache, Resolver};
use crate::spec::{Machine, NetworkConfig, Role};
use crate::unit::Phase;

/// Compile one machine's plan from its active profiles.
///
/// Units land in contribution order: phase by phase, profile by profile, in
/// each profile's emission order.  The dependency compiler takes it from
/// there.
///
/// # Errors
///
/// Returns a [`CompilerError`] on an unknown server type, a failed
/// resolution, or a dependency-graph problem.
pub fn build_plan(machine: &Machine, resolver: Resolver<'_>) -> Result<MachinePlan, CompilerError> {
    let profiles = profiles_for(machine)?;
    let mut units = PhaseUnits::default();
    for phase in Phase::ALL {
        for profile in &profiles {
            units.extend(phase, profile.units_for(phase, machine, &resolver)?);
        }
    }
    debug!("{}: compiling {} profiles", machine.label(), profiles.len());
    Ok(plan::compile_machine(machine.label(), units)?)
}

/// Run the subcommand.
///
/// # Errors
///
/// Returns an error when the specification fails to load, `--machine` names
/// an unknown label, or any machine fails to compile.
pub fn run(global: &GlobalOpts, opts: &CompileOpts) -> Result<()> {
    let network = NetworkConfig::load(&global.spec)
        .with_context(|| format!("loading {}", global.spec.display()))?;
    let iso = IsoCache::http();
    let resolver = Resolver::new(&network, &iso);

    let targets: Vec<&Machine> = match &opts.machine {
        Some(label) => vec![network.registry.machine(label)?],
        None => network.registry.by_role(Role::Server).collect(),
    };

    let results: Vec<(&str, Result<MachinePlan, CompilerError>)> = if global.parallel {
        targets
            .par_iter()
            .map(|m| (m.label(), build_plan(m, resolver)))
            .collect()
    } else {
        targets
            .iter()
            .map(|m| (m.label(), build_plan(m, resolver)))
            .collect()
    };

    let mut plans = Vec::with_capacity(results.len());
    let mut failed = 0usize;
    for (label, result) in results {
        match result {
            Ok(plan) => plans.push(plan),
            Err(e) => {
                failed += 1;
                error!("{label}: {e:#}");
            }
        }
    }

    emit(&plans, opts.json)?;

    if failed > 0 {
        bail!("{failed} of {} machines failed to compile", targets.len());
    }
    Ok(())
}

/// Plans go to stdout, in specification order, so the output can be piped.
#[allow(clippy::print_stdout)]
fn emit(plans: &[MachinePlan], json: bool) -> Result<()> {
    if json {
        let body = serde_json::to_string_pretty(plans).context("serializing plans")?;
        println!("{body}");
    } else {
        for plan in plans {
            print!("{}", plan.render());
        }
    }
    Ok(())
}
