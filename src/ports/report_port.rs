//! Report output port.

use crate::domain::engine::BacktestRun;
use crate::domain::error::SentiError;
use crate::domain::exit_scan::ScanReport;
use crate::domain::metrics::{ModeSummary, TierStats};

/// Port for persisting run results. Each method returns the path written.
pub trait ReportPort {
    fn write_trades(&self, run: &BacktestRun) -> Result<String, SentiError>;

    /// `include_held` also writes the HOLD rows of the scan.
    fn write_scan(
        &self,
        symbol: &str,
        report: &ScanReport,
        include_held: bool,
    ) -> Result<String, SentiError>;

    fn write_summary(&self, rows: &[ModeSummary]) -> Result<String, SentiError>;

    /// Trade count and pnl per buy tier.
    fn write_tiers(&self, symbol: &str, tiers: &[TierStats]) -> Result<String, SentiError>;
}
