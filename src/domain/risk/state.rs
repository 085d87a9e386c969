use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the circuit breaker stopped trading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HaltReason {
    ConsecutiveLosses { count: u32 },
    FlashCrash { symbol: String, drop_pct: Decimal },
    CriticalFailure { reason: String },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::ConsecutiveLosses { count } => {
                write!(f, "{} consecutive losses", count)
            }
            HaltReason::FlashCrash { symbol, drop_pct } => write!(
                f,
                "flash crash on {} ({:.2}% drop)",
                symbol,
                drop_pct * Decimal::ONE_HUNDRED
            ),
            HaltReason::CriticalFailure { reason } => write!(f, "critical failure: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum HaltWindow {
    Until(DateTime<Utc>),
    /// Only an operator clears it.
    Indefinite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Halt {
    pub reason: HaltReason,
    pub since: DateTime<Utc>,
    pub window: HaltWindow,
}

impl Halt {
    pub fn new(reason: HaltReason, since: DateTime<Utc>, duration: Option<Duration>) -> Self {
        let window = match duration {
            Some(duration) => HaltWindow::Until(since + duration),
            None => HaltWindow::Indefinite,
        };
        Self {
            reason,
            since,
            window,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.window {
            HaltWindow::Until(until) => now < until,
            HaltWindow::Indefinite => true,
        }
    }

    /// Remaining time, `None` for an indefinite halt.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.window {
            HaltWindow::Until(until) => Some((until - now).max(Duration::zero())),
            HaltWindow::Indefinite => None,
        }
    }
}

/// Circuit breaker memory: `Active` when `halt` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub consecutive_losses: u32,
    #[serde(default)]
    pub halt: Option<Halt>,
    #[serde(default)]
    pub last_trade_time: Option<DateTime<Utc>>,
    /// UTC date of the last recorded result.
    #[serde(default)]
    pub trading_day_seed: Option<NaiveDate>,
}

impl CircuitBreakerState {
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyLossState {
    #[serde(default)]
    pub current_date: Option<NaiveDate>,
    pub daily_pnl: Decimal,
}

impl DailyLossState {
    /// Moves to `date` and zeroes the P&L when the day advanced.
    ///
    /// Returns `true` only on an actual reset; an earlier date never resets.
    pub fn roll_to(&mut self, date: NaiveDate) -> bool {
        match self.current_date {
            Some(current) if date <= current => false,
            Some(_) => {
                self.current_date = Some(date);
                self.daily_pnl = Decimal::ZERO;
                true
            }
            None => {
                self.current_date = Some(date);
                false
            }
        }
    }
}

/// High-water mark. Never decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownState {
    pub peak_balance: Decimal,
}

impl DrawdownState {
    pub fn new(peak_balance: Decimal) -> Self {
        Self { peak_balance }
    }

    /// Raises the peak when `balance` exceeds it. Returns whether it moved.
    pub fn observe(&mut self, balance: Decimal) -> bool {
        if balance > self.peak_balance {
            self.peak_balance = balance;
            true
        } else {
            false
        }
    }

    /// `(peak - balance) / peak`, floored at zero.
    pub fn drawdown_against(peak: Decimal, balance: Decimal) -> Decimal {
        if peak <= Decimal::ZERO || balance >= peak {
            return Decimal::ZERO;
        }
        (peak - balance) / peak
    }
}

/// Everything the pipeline carries across evaluations, for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub circuit_breaker: CircuitBreakerState,
    pub daily_loss: DailyLossState,
    pub drawdown: DrawdownState,
    #[serde(default)]
    pub recent_approvals: Vec<DateTime<Utc>>,
}
