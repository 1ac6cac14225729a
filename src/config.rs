//! Behaviour switches for the ledger that the server exposes as command line options.

use serde::{Deserialize, Serialize};

use crate::reconciliation::AmountBasis;

/// What to do when a new debt is larger than the amount still pending on the
/// transaction it links to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PendingLimitPolicy {
    /// Reject the debt.
    #[default]
    Enforce,
    /// Log a warning and accept the debt. The linked transaction may end up
    /// over-settled, which the summary metrics report.
    Advisory,
}

/// Configuration for the ledger and reconciliation engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Whether outcome amounts in chart series are gross or net of settled debts.
    pub chart_basis: AmountBasis,
    /// How the pending amount of a linked transaction limits new debts.
    pub pending_limit: PendingLimitPolicy,
}
