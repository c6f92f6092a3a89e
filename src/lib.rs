//! Network provisioning compiler.
//!
//! Takes a declarative JSON description of a network (servers, devices,
//! users, per-machine overrides) and produces idempotent, dependency-ordered
//! provisioning plans that converge each managed machine to the described
//! state.  No remote execution happens here — the output is the plan.
//!
//! The public API is organised into five layers:
//!
//! - **[`spec`]** — parse and validate the network specification into a typed,
//!   immutable registry of machines
//! - **[`resolve`]** — layered property resolution (machine override →
//!   network default → compiled-in constant)
//! - **[`unit`]** — atomic idempotent actions with `test + configure`
//!   semantics, including whole-file management
//! - **[`plan`]** — the dependency compiler that orders units into
//!   deterministic per-machine execution plans
//! - **[`profiles`]** — modules that emit units for a service or machine
//!   category, consuming the registry and resolver
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod plan;
pub mod profiles;
pub mod resolve;
pub mod spec;
pub mod unit;
