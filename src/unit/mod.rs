//! Atomic idempotent configuration actions (test + configure pattern).
//!
//! A [`Unit`] declares how to *test* whether a machine already matches the
//! desired state and how to *configure* it when it does not.  Units never
//! execute anything themselves — the executor consuming a compiled plan is
//! responsible for enforcing the semantics captured by [`UnitState`].

pub mod file;
pub mod pkg;

pub use file::FileUnit;

use std::fmt;

use serde::Serialize;

/// The compilation phase a unit belongs to.
///
/// Phases compile independently, each producing its own plan.  A later
/// phase's units may name an earlier phase's units as preconditions, never
/// the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Package and software installation.
    Install,
    /// Configuration that survives reboots (files, service enablement).
    PersistentConfig,
    /// Configuration of the running system (service state).
    LiveConfig,
    /// Firewall policy.
    Firewall,
}

impl Phase {
    /// All phases in compilation order.
    pub const ALL: [Self; 4] = [
        Self::Install,
        Self::PersistentConfig,
        Self::LiveConfig,
        Self::Firewall,
    ];

    /// Stable lower-case name, used in rendered plans and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::PersistentConfig => "persistent-config",
            Self::LiveConfig => "live-config",
            Self::Firewall => "firewall",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic idempotent action.
///
/// Immutable once constructed.  Identity is the `name`: two units with the
/// same name in the same machine's plan is a compiler error.
///
/// The contract an executor must enforce: run `test`; if its output equals
/// `expected` the unit is a no-op; otherwise run `config`, re-run `test`,
/// and surface `message` to the operator if the output still differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    precondition: Option<String>,
    test: String,
    config: String,
    expected: String,
    message: String,
}

impl Unit {
    /// Build a unit.
    ///
    /// `precondition` names another unit that must already have passed, or
    /// `None` for a root unit eligible to run first.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        precondition: Option<&str>,
        test: impl Into<String>,
        config: impl Into<String>,
        expected: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            precondition: precondition.map(str::to_string),
            test: test.into(),
            config: config.into(),
            expected: expected.into(),
            message: message.into(),
        }
    }

    /// Unique name of this unit within its machine's plan.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the unit that must have passed before this one runs, if any.
    #[must_use]
    pub fn precondition(&self) -> Option<&str> {
        self.precondition.as_deref()
    }

    /// Shell expression whose output decides whether the unit is a no-op.
    #[must_use]
    pub fn test(&self) -> &str {
        &self.test
    }

    /// Shell expression that converges the machine to the desired state.
    #[must_use]
    pub fn config(&self) -> &str {
        &self.config
    }

    /// Test output that means "no change needed".
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Message surfaced to the operator when the re-test still fails.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether an observed test output means this unit passes.
    #[must_use]
    pub fn is_pass(&self, observed: &str) -> bool {
        observed == self.expected
    }
}

/// Lifecycle of a single unit during plan application.
///
/// ```text
/// Pending → Testing → (pass: Skipped | fail: Configuring → Retesting →
///                      (pass: Applied | fail: Failed))
/// ```
///
/// `Failed` is terminal for the machine's run: units whose transitive
/// precondition chain includes the failed unit must not run, while unrelated
/// units may proceed (see [`crate::plan::MachinePlan::halted_by`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Not yet examined.
    Pending,
    /// Initial test running.
    Testing,
    /// Test passed first time; nothing to do.
    Skipped,
    /// Test failed; configure expression running.
    Configuring,
    /// Configure finished; test running again.
    Retesting,
    /// Re-test passed; the change was applied.
    Applied,
    /// Re-test failed; terminal for this unit's dependents.
    Failed,
}

impl UnitState {
    /// Move from `Pending` to `Testing`.  Any other state is unchanged.
    #[must_use]
    pub const fn start(self) -> Self {
        match self {
            Self::Pending => Self::Testing,
            other => other,
        }
    }

    /// Advance on a test outcome.  Only meaningful in `Testing` and
    /// `Retesting`; any other state is unchanged.
    #[must_use]
    pub const fn on_test_result(self, passed: bool) -> Self {
        match (self, passed) {
            (Self::Testing, true) => Self::Skipped,
            (Self::Testing, false) => Self::Configuring,
            (Self::Retesting, true) => Self::Applied,
            (Self::Retesting, false) => Self::Failed,
            (other, _) => other,
        }
    }

    /// Move from `Configuring` to `Retesting`.  Any other state is unchanged.
    #[must_use]
    pub const fn configured(self) -> Self {
        match self {
            Self::Configuring => Self::Retesting,
            other => other,
        }
    }

    /// Whether this state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Skipped | Self::Applied | Self::Failed)
    }
}
