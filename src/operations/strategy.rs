//! Publisher strategy selection
//!
//! Internal feeds on hosted deployments default to the bundled push tool,
//! which can skip version conflicts. Everything else goes through the
//! direct CLI.

use tracing::{debug, warn};

/// Which executable family pushes the packages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStrategy {
    /// `nuget push` / `dotnet nuget push`
    DirectCli,
    /// The bundled push tool
    AlternateTool,
}

/// Signals the decision depends on
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyInputs {
    pub is_internal: bool,
    pub on_premises: bool,
    /// `NUGET_FORCENUGETFORPUSH`
    pub force_direct_cli: Option<bool>,
    /// `NUGET_FORCEVSTSNUGETPUSHFORPUSH`
    pub force_alternate_tool: Option<bool>,
    pub allow_conflicts: bool,
}

/// Result of strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyChoice {
    pub strategy: PushStrategy,
    /// Conflict tolerance was requested but the chosen strategy cannot honor it
    pub conflicts_unsupported: bool,
}

impl StrategyChoice {
    const fn direct(conflicts_unsupported: bool) -> Self {
        Self {
            strategy: PushStrategy::DirectCli,
            conflicts_unsupported,
        }
    }

    const fn alternate() -> Self {
        Self {
            strategy: PushStrategy::AlternateTool,
            conflicts_unsupported: false,
        }
    }
}

/// Choose the push strategy
///
/// Conditions are checked in order: external feed, on-premises server,
/// direct-CLI override, alternate-tool override, default.
#[must_use]
pub fn select_strategy(inputs: &StrategyInputs) -> StrategyChoice {
    if !inputs.is_internal {
        debug!("Pushing to an external feed so the direct CLI will be used");
        return StrategyChoice::direct(false);
    }

    if inputs.on_premises {
        debug!("Pushing to an on-premises server, only the direct CLI is supported");
        return StrategyChoice::direct(false);
    }

    match inputs.force_direct_cli {
        Some(true) => {
            debug!("Direct CLI is force enabled for push");
            return forced_direct(inputs.allow_conflicts);
        }
        Some(false) => {
            debug!("Direct CLI is force disabled for push");
            return StrategyChoice::alternate();
        }
        None => {}
    }

    match inputs.force_alternate_tool {
        Some(true) => {
            debug!("Bundled push tool is force enabled for push");
            StrategyChoice::alternate()
        }
        Some(false) => {
            debug!("Bundled push tool is force disabled for push");
            forced_direct(inputs.allow_conflicts)
        }
        None => StrategyChoice::alternate(),
    }
}

fn forced_direct(allow_conflicts: bool) -> StrategyChoice {
    if allow_conflicts {
        warn!(
            "The direct CLI was forced for push and cannot skip package conflicts; \
            a package that already exists will fail the push"
        );
    }
    StrategyChoice::direct(allow_conflicts)
}
