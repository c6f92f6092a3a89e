#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! End-to-end tests: specification file on disk in, compiled plans out.
//!
//! These exercise the whole pipeline — load, registry, layered resolution,
//! profile selection, dependency compilation — the way the `compile`
//! subcommand drives it, with no real network access.

mod common;

use thornsec::commands::compile::build_plan;
use thornsec::error::SpecError;
use thornsec::resolve::Resolver;
use thornsec::spec::{NetworkConfig, Role};
use thornsec::unit::Unit;

fn unit_names(plan: &thornsec::plan::MachinePlan) -> Vec<&str> {
    plan.phases()
        .iter()
        .flat_map(|p| p.units().iter().map(Unit::name))
        .collect()
}

// ---------------------------------------------------------------------------
// Resolution end to end
// ---------------------------------------------------------------------------

/// A machine-level override must flow all the way into the emitted units,
/// while untouched properties fall back to the compiled-in constants.
#[test]
fn machine_override_reaches_the_plan() {
    let ctx = common::SpecContext::new();
    let net = ctx.load(
        r#"{
            "users": {"alice": {}},
            "servers": {"web1": {"sshport": 2222}}
        }"#,
    );
    let iso = common::offline_cache();
    let resolver = Resolver::new(&net, &iso);

    assert_eq!(resolver.ssh_port("web1").unwrap(), 2222);
    assert_eq!(resolver.admin_port("web1").unwrap(), 65422);

    let plan = build_plan(net.registry.machine("web1").unwrap(), resolver).unwrap();
    let config = plan.phases()[1]
        .units()
        .iter()
        .find(|u| u.name() == "sshd_config")
        .expect("sshd_config unit");
    assert!(config.expected().contains("Port 2222"));

    let ingress = plan.phases()[3]
        .units()
        .iter()
        .find(|u| u.name() == "sshd_ingress")
        .expect("sshd_ingress unit");
    assert!(ingress.config().contains("--dport 2222"));
}

/// A top-level default applies to every server that does not override it.
#[test]
fn network_default_applies_to_silent_machines() {
    let ctx = common::SpecContext::new();
    let net = ctx.load(
        r#"{
            "sshport": 4444,
            "users": {"alice": {}},
            "servers": {"web1": {"sshport": 2222}, "web2": {}}
        }"#,
    );
    let iso = common::offline_cache();
    let resolver = Resolver::new(&net, &iso);

    assert_eq!(resolver.ssh_port("web1").unwrap(), 2222);
    assert_eq!(resolver.ssh_port("web2").unwrap(), 4444);
}

/// The upstream image list is the last resort for the ISO URL, and its result
/// is shared by every machine in the run.
#[test]
fn iso_metadata_falls_through_to_upstream() {
    let ctx = common::SpecContext::new();
    let net = ctx.load(
        r#"{
            "users": {"alice": {}},
            "servers": {"vm1": {"types": ["service"]}, "vm2": {"types": ["service"]}}
        }"#,
    );
    let iso = common::fixed_cache();
    let resolver = Resolver::new(&net, &iso);

    let url = resolver.debian_iso_url("vm1").unwrap().expect("iso url");
    assert!(url.ends_with("debian-netinst.iso"));
    assert_eq!(resolver.debian_iso_url("vm2").unwrap(), Some(url));
    assert_eq!(resolver.debian_iso_sha512("vm1").unwrap(), Some("feedbeef"));
}

// ---------------------------------------------------------------------------
// Include redirection
// ---------------------------------------------------------------------------

/// A spec whose only meaningful key is `include` loads the target instead,
/// resolved relative to the including file.
#[test]
fn include_redirects_to_sibling_file() {
    let ctx = common::SpecContext::new();
    ctx.write(
        "networks/real.json",
        r#"{"users": {"alice": {}}, "servers": {"web1": {}}}"#,
    );
    let pointer = ctx.write("networks/entry.json", r#"{"include": "real.json"}"#);

    let net = NetworkConfig::load(&pointer).unwrap();
    assert_eq!(net.registry.role_count(Role::Server), 1);
    assert!(net.registry.machine("web1").is_ok());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A network with no users is not a valid network.
#[test]
fn spec_without_users_is_rejected() {
    let ctx = common::SpecContext::new();
    let path = ctx.write("network.json", r#"{"servers": {"web1": {}}}"#);
    let err = NetworkConfig::load(&path).unwrap_err();
    assert!(matches!(err, SpecError::NoValidUsers));
}

/// One label in two sections is a conflict, not an overwrite.
#[test]
fn duplicate_label_across_sections_is_rejected() {
    let ctx = common::SpecContext::new();
    let path = ctx.write(
        "network.json",
        r#"{"users": {"box": {}}, "servers": {"box": {}}}"#,
    );
    let err = NetworkConfig::load(&path).unwrap_err();
    assert!(matches!(err, SpecError::DuplicateLabel { label, .. } if label == "box"));
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compiling the same specification twice yields byte-identical plans.
#[test]
fn compilation_is_reproducible() {
    let spec = r#"{
        "users": {"alice": {}},
        "servers": {
            "metal1": {"types": ["dedicated"], "admins": ["alice"]},
            "web1": {"sshport": 2222}
        }
    }"#;

    let render = || {
        let ctx = common::SpecContext::new();
        let net = ctx.load(spec);
        let iso = common::offline_cache();
        let resolver = Resolver::new(&net, &iso);
        net.registry
            .by_role(Role::Server)
            .map(|m| build_plan(m, resolver).unwrap())
            .map(|p| serde_json::to_string(&p).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(render(), render());
}

/// Every server carries the remote-access chain; a dedicated server adds its
/// egress rules after it.
#[test]
fn dedicated_server_plan_layers_profiles() {
    let ctx = common::SpecContext::new();
    let net = ctx.load(
        r#"{
            "users": {"alice": {}},
            "servers": {"metal1": {"types": ["dedicated"]}}
        }"#,
    );
    let iso = common::offline_cache();
    let resolver = Resolver::new(&net, &iso);

    let plan = build_plan(net.registry.machine("metal1").unwrap(), resolver).unwrap();
    let names = unit_names(&plan);
    assert_eq!(names[0], "sshd_installed");
    assert!(names.contains(&"sshd_ingress"));
    assert!(names.contains(&"egress_cdn_debian_net_443"));
    assert_eq!(plan.unit_count(), 5 + 8);
}

/// A failed unit halts its transitive dependents and nothing else.
#[test]
fn failure_isolation_follows_precondition_chains() {
    let ctx = common::SpecContext::new();
    let net = ctx.load(
        r#"{
            "users": {"alice": {}},
            "servers": {"metal1": {"types": ["dedicated"]}}
        }"#,
    );
    let iso = common::offline_cache();
    let resolver = Resolver::new(&net, &iso);

    let plan = build_plan(net.registry.machine("metal1").unwrap(), resolver).unwrap();
    let halted = plan.halted_by("sshd_installed");
    assert_eq!(
        halted,
        vec!["sshd_config", "sshd_enabled", "sshd_running", "sshd_ingress"]
    );
    // Egress rules have no preconditions and survive.
    assert!(halted.iter().all(|n| !n.starts_with("egress_")));
}

/// Stable human-readable rendering of a small network.
#[test]
fn rendered_plan_snapshot() {
    let ctx = common::SpecContext::new();
    let net = ctx.load(
        r#"{
            "users": {"alice": {}},
            "servers": {"web1": {"admins": ["alice"]}}
        }"#,
    );
    let iso = common::offline_cache();
    let resolver = Resolver::new(&net, &iso);

    let plan = build_plan(net.registry.machine("web1").unwrap(), resolver).unwrap();
    insta::assert_snapshot!(plan.render(), @r"
    machine web1
    [install]
      sshd_installed
    [persistent-config]
      sshd_config (requires sshd_installed)
      sshd_enabled (requires sshd_config)
    [live-config]
      sshd_running (requires sshd_enabled)
    [firewall]
      sshd_ingress (requires sshd_running)
    ");
}
