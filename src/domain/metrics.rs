//! Trade statistics for reports and mode comparison.

use super::exit_scan::round2;
use super::ledger::Trade;
use super::signal::BuyTier;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub total_pnl: f64,
    pub avg_holding_days: f64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub largest_win: f64,
    /// Magnitude of the worst trade, zero when nothing lost.
    pub largest_loss: f64,
    pub final_capital: f64,
    /// Largest peak-to-trough fall of running capital, as a fraction of the peak.
    pub max_drawdown: f64,
}

impl TradeStats {
    pub fn compute(trades: &[Trade], starting_capital: f64) -> Self {
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_pnl = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_days = 0i64;

        for trade in trades {
            let pnl = trade.pnl;
            total_pnl += pnl;
            total_days += trade.holding_days;
            if pnl > 0.0 {
                trades_won += 1;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
        }

        let total_trades = trades.len();
        let (win_rate, avg_holding_days) = if total_trades > 0 {
            (
                trades_won as f64 / total_trades as f64,
                total_days as f64 / total_trades as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let final_capital = trades
            .last()
            .map(|t| t.capital_after)
            .unwrap_or(starting_capital);

        let curve: Vec<f64> = std::iter::once(starting_capital)
            .chain(trades.iter().map(|t| t.capital_after))
            .collect();

        TradeStats {
            total_trades,
            total_pnl,
            avg_holding_days,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            largest_win,
            largest_loss,
            final_capital,
            max_drawdown: compute_drawdown(&curve),
        }
    }
}

fn compute_drawdown(curve: &[f64]) -> f64 {
    let Some(&first) = curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &capital in curve {
        if capital > peak {
            peak = capital;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - capital) / peak);
        }
    }
    max_dd
}

/// Count and pnl of the trades opened by one buy tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierStats {
    pub tier: BuyTier,
    pub trades: usize,
    pub total_pnl: f64,
}

impl TierStats {
    /// One entry per tier, in [`BuyTier::ALL`] order, zero rows included.
    pub fn compute(trades: &[Trade]) -> Vec<TierStats> {
        BuyTier::ALL
            .iter()
            .map(|&tier| {
                let (count, pnl) = trades
                    .iter()
                    .filter(|t| t.trigger_type == tier)
                    .fold((0usize, 0.0_f64), |(n, p), t| (n + 1, p + t.pnl));
                TierStats {
                    tier,
                    trades: count,
                    total_pnl: pnl,
                }
            })
            .collect()
    }
}

/// One row of the sentiment-mode comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSummary {
    pub mode: String,
    pub trades: usize,
    pub total_pnl: f64,
    pub avg_hold: f64,
}

impl ModeSummary {
    pub fn from_trades(mode: impl Into<String>, trades: &[Trade]) -> Self {
        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let avg_hold = if trades.is_empty() {
            0.0
        } else {
            trades.iter().map(|t| t.holding_days as f64).sum::<f64>() / trades.len() as f64
        };
        ModeSummary {
            mode: mode.into(),
            trades: trades.len(),
            total_pnl: round2(total_pnl),
            avg_hold: round2(avg_hold),
        }
    }
}
