//! Recommendation (position) domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_BENCHMARK_TICKER;
use crate::{errors::ValidationError, Error, Result};

/// Direction of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionAction {
    Buy,
    Sell,
    Watch,
}

impl PositionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionAction::Buy => "BUY",
            PositionAction::Sell => "SELL",
            PositionAction::Watch => "WATCH",
        }
    }

    /// Applies the direction to a raw price return. SELL profits when price falls.
    pub fn signed_return(&self, raw_return: Decimal) -> Decimal {
        match self {
            PositionAction::Sell => -raw_return,
            PositionAction::Buy | PositionAction::Watch => raw_return,
        }
    }
}

impl fmt::Display for PositionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(PositionAction::Buy),
            "SELL" => Ok(PositionAction::Sell),
            "WATCH" => Ok(PositionAction::Watch),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown recommendation action '{}'",
                other
            )))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    Closed,
    Watchlist,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "OPEN",
            PositionStatus::Closed => "CLOSED",
            PositionStatus::Watchlist => "WATCHLIST",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(PositionStatus::Open),
            "CLOSED" => Ok(PositionStatus::Closed),
            "WATCHLIST" => Ok(PositionStatus::Watchlist),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown recommendation status '{}'",
                other
            )))),
        }
    }
}

/// A dated price, used for both entry and exit of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMark {
    pub date: NaiveDate,
    pub price: Decimal,
}

impl TradeMark {
    pub fn new(date: NaiveDate, price: Decimal) -> Self {
        Self { date, price }
    }
}

/// Where a recommendation is in its life.
///
/// Watchlist entries carry no pricing. Open and closed positions always have
/// an entry with a positive price; a closed position may lack an exit when the
/// record was closed without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionLifecycle {
    Watchlist,
    Open {
        entry: TradeMark,
    },
    Closed {
        entry: TradeMark,
        exit: Option<TradeMark>,
    },
}

impl PositionLifecycle {
    /// Builds a lifecycle from flat storage columns, enforcing the pricing
    /// invariants.
    pub fn from_parts(
        status: PositionStatus,
        entry_date: Option<NaiveDate>,
        entry_price: Option<Decimal>,
        exit_date: Option<NaiveDate>,
        exit_price: Option<Decimal>,
    ) -> Result<Self> {
        if status == PositionStatus::Watchlist {
            return Ok(PositionLifecycle::Watchlist);
        }

        let entry_date =
            entry_date.ok_or_else(|| ValidationError::MissingField("entry_date".to_string()))?;
        let entry_price =
            entry_price.ok_or_else(|| ValidationError::MissingField("entry_price".to_string()))?;
        if entry_price <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "entry_price must be positive, got {}",
                entry_price
            ))
            .into());
        }
        let entry = TradeMark::new(entry_date, entry_price);

        match status {
            PositionStatus::Open => Ok(PositionLifecycle::Open { entry }),
            PositionStatus::Closed => {
                let exit = match (exit_date, exit_price) {
                    (Some(date), Some(price)) => {
                        if date < entry_date {
                            return Err(ValidationError::InvalidInput(format!(
                                "exit_date {} is before entry_date {}",
                                date, entry_date
                            ))
                            .into());
                        }
                        Some(TradeMark::new(date, price))
                    }
                    _ => None,
                };
                Ok(PositionLifecycle::Closed { entry, exit })
            }
            PositionStatus::Watchlist => Ok(PositionLifecycle::Watchlist),
        }
    }

    pub fn status(&self) -> PositionStatus {
        match self {
            PositionLifecycle::Watchlist => PositionStatus::Watchlist,
            PositionLifecycle::Open { .. } => PositionStatus::Open,
            PositionLifecycle::Closed { .. } => PositionStatus::Closed,
        }
    }

    pub fn entry(&self) -> Option<&TradeMark> {
        match self {
            PositionLifecycle::Watchlist => None,
            PositionLifecycle::Open { entry } | PositionLifecycle::Closed { entry, .. } => {
                Some(entry)
            }
        }
    }

    pub fn exit(&self) -> Option<&TradeMark> {
        match self {
            PositionLifecycle::Closed { exit, .. } => exit.as_ref(),
            _ => None,
        }
    }
}

/// Domain model for a paper-traded recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub user_id: String,
    pub ticker: String,
    pub action: PositionAction,
    pub lifecycle: PositionLifecycle,
    pub current_price: Option<Decimal>,
    /// Portfolio weight in percent (0-100)
    pub weight_pct: Option<Decimal>,
    pub invested_amount: Decimal,
    pub position_size: Decimal,
    pub benchmark_ticker: String,
    pub entry_benchmark_price: Option<Decimal>,
}

impl Position {
    pub fn status(&self) -> PositionStatus {
        self.lifecycle.status()
    }

    pub fn entry(&self) -> Option<&TradeMark> {
        self.lifecycle.entry()
    }

    pub fn exit(&self) -> Option<&TradeMark> {
        self.lifecycle.exit()
    }

    pub fn is_open(&self) -> bool {
        self.status() == PositionStatus::Open
    }

    /// Open or closed, i.e. takes part in return computations.
    pub fn is_tradable(&self) -> bool {
        self.entry().is_some()
    }

    /// Active on `day` iff entered on or before it and not exited before it.
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        match self.entry() {
            Some(entry) if entry.date <= day => match self.exit() {
                Some(exit) => exit.date >= day,
                None => true,
            },
            _ => false,
        }
    }

    /// Latest known price: `current_price`, else the entry price.
    pub fn mark_price(&self) -> Option<Decimal> {
        self.current_price.or_else(|| self.entry().map(|e| e.price))
    }

    /// `invested_amount` scaled by the move from entry to `price`.
    pub fn value_at_price(&self, price: Decimal) -> Decimal {
        match self.entry() {
            Some(entry) if !entry.price.is_zero() => self.invested_amount * price / entry.price,
            _ => Decimal::ZERO,
        }
    }

    /// Current value of an open position; zero for anything else.
    pub fn current_value(&self) -> Decimal {
        if !self.is_open() {
            return Decimal::ZERO;
        }
        self.mark_price()
            .map(|p| self.value_at_price(p))
            .unwrap_or(Decimal::ZERO)
    }

    /// Directional fractional return: exit price when closed, current price
    /// otherwise. `None` when the required price is unknown.
    pub fn trade_return(&self) -> Option<Decimal> {
        let entry = self.entry()?;
        let reference = match self.lifecycle {
            PositionLifecycle::Closed { exit, .. } => exit?.price,
            _ => self.current_price?,
        };
        Some(
            self.action
                .signed_return(reference / entry.price - Decimal::ONE),
        )
    }

    /// Calendar days held, up to the exit date or `as_of`.
    pub fn holding_period_days(&self, as_of: NaiveDate) -> Option<i64> {
        let entry = self.entry()?;
        let end = self.exit().map(|e| e.date).unwrap_or(as_of);
        Some((end - entry.date).num_days().max(0))
    }
}

/// Input for creating a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosition {
    pub id: Option<String>,
    pub user_id: String,
    pub ticker: String,
    pub action: PositionAction,
    pub lifecycle: PositionLifecycle,
    pub current_price: Option<Decimal>,
    pub weight_pct: Option<Decimal>,
    #[serde(default)]
    pub invested_amount: Decimal,
    #[serde(default)]
    pub position_size: Decimal,
    pub benchmark_ticker: Option<String>,
    pub entry_benchmark_price: Option<Decimal>,
}

impl NewPosition {
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(ValidationError::MissingField("ticker".to_string()).into());
        }
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("user_id".to_string()).into());
        }
        if let Some(entry) = self.lifecycle.entry() {
            if entry.price <= Decimal::ZERO {
                return Err(ValidationError::InvalidInput(
                    "entry_price must be positive".to_string(),
                )
                .into());
            }
            if let Some(exit) = self.lifecycle.exit() {
                if exit.date < entry.date {
                    return Err(ValidationError::InvalidInput(
                        "exit_date must not precede entry_date".to_string(),
                    )
                    .into());
                }
            }
        }
        if let Some(w) = self.weight_pct {
            validate_weight_range(w)?;
        }
        Ok(())
    }

    pub fn benchmark_or_default(&self) -> String {
        self.benchmark_ticker
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BENCHMARK_TICKER.to_string())
    }
}

/// Partial update of the mutable sizing/pricing fields. `None` leaves a
/// field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFieldsUpdate {
    pub weight_pct: Option<Decimal>,
    pub invested_amount: Option<Decimal>,
    pub position_size: Option<Decimal>,
    pub current_price: Option<Decimal>,
}

impl PositionFieldsUpdate {
    pub fn is_empty(&self) -> bool {
        self.weight_pct.is_none()
            && self.invested_amount.is_none()
            && self.position_size.is_none()
            && self.current_price.is_none()
    }

    pub fn apply_to(&self, position: &mut Position) {
        if let Some(w) = self.weight_pct {
            position.weight_pct = Some(w);
        }
        if let Some(v) = self.invested_amount {
            position.invested_amount = v;
        }
        if let Some(v) = self.position_size {
            position.position_size = v;
        }
        if let Some(p) = self.current_price {
            position.current_price = Some(p);
        }
    }
}

/// Sizing computed by the rebalancer for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSizing {
    pub position_id: String,
    pub weight_pct: Decimal,
    pub invested_amount: Decimal,
    pub position_size: Decimal,
}

impl From<&PositionSizing> for PositionFieldsUpdate {
    fn from(sizing: &PositionSizing) -> Self {
        Self {
            weight_pct: Some(sizing.weight_pct),
            invested_amount: Some(sizing.invested_amount),
            position_size: Some(sizing.position_size),
            current_price: None,
        }
    }
}

/// Paper-trading cash record, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioBalance {
    pub user_id: String,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub available_cash: Decimal,
    pub total_invested: Decimal,
}

impl PortfolioBalance {
    /// Fresh record with nothing invested.
    pub fn new(user_id: impl Into<String>, initial_balance: Decimal) -> Self {
        Self {
            user_id: user_id.into(),
            initial_balance,
            current_balance: initial_balance,
            available_cash: initial_balance,
            total_invested: Decimal::ZERO,
        }
    }
}

pub(crate) fn validate_weight_range(weight: Decimal) -> Result<()> {
    if weight < Decimal::ZERO || weight > Decimal::ONE_HUNDRED {
        return Err(ValidationError::InvalidInput(format!(
            "weight_pct must be between 0 and 100, got {}",
            weight
        ))
        .into());
    }
    Ok(())
}
