//! Read-only views over the ledger: net amounts, summary metrics and chart series.

mod charts;
mod endpoints;
mod net;
mod period;
mod summary;

pub use charts::{
    CategoryBreakdownEntry, CategoryEvolution, MonthlyFlow, category_breakdown,
    category_evolution, monthly_flows,
};
pub use endpoints::{
    category_breakdown_endpoint, category_evolution_endpoint, monthly_flow_endpoint,
    summary_endpoint,
};
pub use net::{AmountBasis, PendingAmount};
pub use period::{DateWindow, MONTHS, Period, month_label};
pub use summary::{SummaryMetrics, summarize};
