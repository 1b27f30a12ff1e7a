//! Engine and exit-scan configuration, with validation.
//!
//! Both configs are plain structs with the documented defaults. Building one
//! from a [`ConfigPort`] validates it; the engines validate again on entry so
//! a hand-built config is rejected before any observation is processed.

use std::fmt;
use std::str::FromStr;

use super::error::SentiError;
use crate::ports::config_port::ConfigPort;

const ENGINE: &str = "engine";
const SCAN: &str = "scan";

/// Which signals the minimum signal-strength gate suppresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrengthGate {
    /// Weak periods cannot open a position but may still close one.
    #[default]
    Entries,
    /// Weak periods produce no signal at all.
    All,
}

impl FromStr for StrengthGate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entries" => Ok(StrengthGate::Entries),
            "all" => Ok(StrengthGate::All),
            other => Err(format!("unknown strength gate '{other}' (expected entries or all)")),
        }
    }
}

impl fmt::Display for StrengthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrengthGate::Entries => write!(f, "entries"),
            StrengthGate::All => write!(f, "all"),
        }
    }
}

/// Parameters of the threshold-driven engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub window_width: usize,
    pub min_signal_strength: f64,
    pub fallback_buy_ratio: f64,
    pub momentum_buy_threshold: f64,
    pub momentum_sell_threshold: f64,
    pub fallback_sell_threshold: f64,
    pub starting_capital: f64,
    pub close_open_at_end: bool,
    pub strength_gate: StrengthGate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            window_width: 10,
            min_signal_strength: 1.2,
            fallback_buy_ratio: 0.8,
            momentum_buy_threshold: 1.5,
            momentum_sell_threshold: -1.5,
            fallback_sell_threshold: -1.2,
            starting_capital: 100_000.0,
            close_open_at_end: false,
            strength_gate: StrengthGate::Entries,
        }
    }
}

impl EngineConfig {
    /// Read `[engine]`, falling back to defaults for absent keys, then validate.
    /// A present value that does not parse is rejected.
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, SentiError> {
        let defaults = EngineConfig::default();

        let window = config.get_int(ENGINE, "window_width", defaults.window_width as i64)?;
        if window < 1 {
            return Err(SentiError::invalid(
                ENGINE,
                "window_width",
                "window_width must be at least 1",
            ));
        }

        let strength_gate = match config.get_string(ENGINE, "strength_gate") {
            Some(s) => s
                .parse()
                .map_err(|reason: String| SentiError::invalid(ENGINE, "strength_gate", reason))?,
            None => defaults.strength_gate,
        };

        let built = EngineConfig {
            window_width: window as usize,
            min_signal_strength: config.get_double(
                ENGINE,
                "min_signal_strength",
                defaults.min_signal_strength,
            )?,
            fallback_buy_ratio: config.get_double(
                ENGINE,
                "fallback_buy_ratio",
                defaults.fallback_buy_ratio,
            )?,
            momentum_buy_threshold: config.get_double(
                ENGINE,
                "momentum_buy_threshold",
                defaults.momentum_buy_threshold,
            )?,
            momentum_sell_threshold: config.get_double(
                ENGINE,
                "momentum_sell_threshold",
                defaults.momentum_sell_threshold,
            )?,
            fallback_sell_threshold: config.get_double(
                ENGINE,
                "fallback_sell_threshold",
                defaults.fallback_sell_threshold,
            )?,
            starting_capital: config.get_double(
                ENGINE,
                "starting_capital",
                defaults.starting_capital,
            )?,
            close_open_at_end: config.get_bool(
                ENGINE,
                "close_open_at_end",
                defaults.close_open_at_end,
            )?,
            strength_gate,
        };
        built.validate()?;
        Ok(built)
    }

    pub fn validate(&self) -> Result<(), SentiError> {
        if self.window_width == 0 {
            return Err(SentiError::invalid(
                ENGINE,
                "window_width",
                "window_width must be at least 1",
            ));
        }
        require_positive(ENGINE, "min_signal_strength", self.min_signal_strength)?;
        require_positive(ENGINE, "fallback_buy_ratio", self.fallback_buy_ratio)?;
        require_positive(ENGINE, "momentum_buy_threshold", self.momentum_buy_threshold)?;
        require_negative(ENGINE, "momentum_sell_threshold", self.momentum_sell_threshold)?;
        require_negative(ENGINE, "fallback_sell_threshold", self.fallback_sell_threshold)?;
        require_positive(ENGINE, "starting_capital", self.starting_capital)?;
        Ok(())
    }
}

/// Parameters of the forward exit-scan engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub volatility_exit_threshold: f64,
    pub momentum_buy: f64,
    pub sentiment_buy: f64,
    pub momentum_sell: f64,
    pub sentiment_sell: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            volatility_exit_threshold: 0.02,
            momentum_buy: 0.01,
            sentiment_buy: 0.2,
            momentum_sell: -0.01,
            sentiment_sell: -0.2,
        }
    }
}

impl ScanConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, SentiError> {
        let d = ScanConfig::default();
        let built = ScanConfig {
            volatility_exit_threshold: config.get_double(
                SCAN,
                "volatility_exit_threshold",
                d.volatility_exit_threshold,
            )?,
            momentum_buy: config.get_double(SCAN, "momentum_buy", d.momentum_buy)?,
            sentiment_buy: config.get_double(SCAN, "sentiment_buy", d.sentiment_buy)?,
            momentum_sell: config.get_double(SCAN, "momentum_sell", d.momentum_sell)?,
            sentiment_sell: config.get_double(SCAN, "sentiment_sell", d.sentiment_sell)?,
        };
        built.validate()?;
        Ok(built)
    }

    pub fn validate(&self) -> Result<(), SentiError> {
        require_positive(SCAN, "volatility_exit_threshold", self.volatility_exit_threshold)?;
        require_finite(SCAN, "momentum_buy", self.momentum_buy)?;
        require_finite(SCAN, "sentiment_buy", self.sentiment_buy)?;
        require_finite(SCAN, "momentum_sell", self.momentum_sell)?;
        require_finite(SCAN, "sentiment_sell", self.sentiment_sell)?;
        if self.momentum_buy < self.momentum_sell {
            return Err(SentiError::invalid(
                SCAN,
                "momentum_buy",
                "momentum_buy must not be below momentum_sell",
            ));
        }
        if self.sentiment_buy < self.sentiment_sell {
            return Err(SentiError::invalid(
                SCAN,
                "sentiment_buy",
                "sentiment_buy must not be below sentiment_sell",
            ));
        }
        Ok(())
    }
}

fn require_finite(section: &str, key: &str, value: f64) -> Result<(), SentiError> {
    if !value.is_finite() {
        return Err(SentiError::invalid(section, key, format!("{key} must be finite")));
    }
    Ok(())
}

fn require_positive(section: &str, key: &str, value: f64) -> Result<(), SentiError> {
    require_finite(section, key, value)?;
    if value <= 0.0 {
        return Err(SentiError::invalid(section, key, format!("{key} must be positive")));
    }
    Ok(())
}

fn require_negative(section: &str, key: &str, value: f64) -> Result<(), SentiError> {
    require_finite(section, key, value)?;
    if value >= 0.0 {
        return Err(SentiError::invalid(section, key, format!("{key} must be negative")));
    }
    Ok(())
}
