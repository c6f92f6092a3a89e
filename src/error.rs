//! Domain-specific error types for the provisioning compiler.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`SpecError`],
//! [`DependencyError`]) while command handlers at the CLI boundary convert
//! them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! CompilerError
//! ├── Spec(SpecError)             — malformed or semantically invalid specification
//! ├── Lookup(LookupError)         — reference to an unknown machine or server type
//! └── Dependency(DependencyError) — duplicate names, dangling preconditions, cycles
//! ```
//!
//! Transient upstream failures (the optional ISO-metadata fetch) never appear
//! here: they are recovered locally, logged at `warn`, and the affected
//! property resolves to absent.

use std::fmt;

use thiserror::Error;

use crate::unit::Phase;

/// Top-level error type for the provisioning compiler.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum CompilerError {
    /// Specification loading or validation error; always fatal to the load.
    #[error("specification error: {0}")]
    Spec(#[from] SpecError),

    /// Reference to a label that does not exist in the registry.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Unit dependency graph error; no plan is emitted for the machine.
    #[error("dependency error: {0}")]
    Dependency(#[from] DependencyError),
}

/// Errors that arise from loading and validating the network specification.
#[derive(Error, Debug)]
pub enum SpecError {
    /// A string could not be parsed as an IP address.
    #[error("invalid IP address '{0}'")]
    InvalidIpAddress(String),

    /// The specification declares no address for this network.
    #[error("no config IP address declared for this network")]
    MissingConfigIp,

    /// The specification has no usable `users` section.
    ///
    /// A network without user devices has no remote-access path, so this is
    /// always fatal.
    #[error("no valid users: the specification must declare at least one user")]
    NoValidUsers,

    /// The same machine label appears in more than one section.
    #[error("duplicate machine label '{label}' ('{first}' section, again in '{second}')")]
    DuplicateLabel {
        /// The offending label.
        label: String,
        /// Section the label was first declared in.
        first: String,
        /// Section the label was redeclared in.
        second: String,
    },

    /// The specification is not syntactically valid JSON, or a field has the
    /// wrong shape.
    #[error("malformed specification: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An I/O error occurred while reading a specification file.
    #[error("IO error reading specification {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The `include` chain is deeper than the supported limit.
    #[error("include chain exceeds {max} levels; is there an include loop?")]
    IncludeDepth {
        /// Maximum supported include depth.
        max: usize,
    },
}

/// Errors that arise from resolving a reference against the registry.
#[derive(Error, Debug)]
pub enum LookupError {
    /// No machine with this label exists anywhere in the network.
    #[error("unknown machine '{0}'")]
    UnknownMachine(String),

    /// A server declares a type no profile knows how to build.
    #[error("unknown server type '{kind}' on machine '{label}'")]
    UnknownServerType {
        /// Label of the machine declaring the type.
        label: String,
        /// The unrecognised type string.
        kind: String,
    },
}

/// A single problem found while compiling a unit dependency graph.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DependencyIssue {
    /// Two units declare the same name within one machine's plan.
    #[error("duplicate unit name '{0}'")]
    DuplicateName(String),

    /// A unit names a precondition that exists nowhere in the plan.
    #[error("unit '{unit}' requires '{precondition}', which does not exist")]
    UnknownPrecondition {
        /// The unit declaring the precondition.
        unit: String,
        /// The missing precondition name.
        precondition: String,
    },

    /// The precondition graph contains a cycle.
    ///
    /// Members are the units that could not be scheduled: every unit on the
    /// cycle plus any unit downstream of it.
    #[error("precondition cycle involving: {}", .members.join(", "))]
    Cycle {
        /// Names of the unschedulable units, in contribution order.
        members: Vec<String>,
    },

    /// A unit in an earlier phase requires a unit from a later phase.
    #[error(
        "unit '{unit}' ({unit_phase}) requires '{precondition}' from the later {precondition_phase} phase"
    )]
    PhaseOrderViolation {
        /// The unit declaring the precondition.
        unit: String,
        /// Phase the unit is compiled into.
        unit_phase: Phase,
        /// The precondition name.
        precondition: String,
        /// Phase the precondition belongs to.
        precondition_phase: Phase,
    },
}

/// All problems found while compiling one machine's unit dependency graph.
///
/// Issues are collected exhaustively before compilation aborts, so a single
/// run reports every duplicate, dangling reference, and cycle at once.
#[derive(Debug)]
pub struct DependencyError {
    /// Every issue found, in detection order.
    pub issues: Vec<DependencyIssue>,
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dependency issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DependencyError {}
