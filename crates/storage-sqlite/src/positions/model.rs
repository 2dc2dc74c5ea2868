//! Database models for recommendations and portfolio balances.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use alphaboard_core::positions::{
    NewPosition, PortfolioBalance, Position, PositionAction, PositionFieldsUpdate,
    PositionLifecycle, PositionStatus,
};

use crate::errors::StorageError;
use crate::utils::{format_date, format_decimal, parse_date, parse_decimal_tolerant, parse_optional_decimal};

/// Database model for recommendations
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::recommendations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PositionDB {
    pub id: String,
    pub user_id: String,
    pub ticker: String,
    pub action: String,
    pub status: String,
    pub entry_date: Option<String>,
    pub entry_price: Option<String>,
    pub exit_date: Option<String>,
    pub exit_price: Option<String>,
    pub current_price: Option<String>,
    pub weight_pct: Option<String>,
    pub invested_amount: String,
    pub position_size: String,
    pub benchmark_ticker: String,
    pub entry_benchmark_price: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PositionDB {
    /// Row for a new recommendation. The caller supplies the id and timestamp.
    pub fn from_new(new_position: NewPosition, id: String, now: String) -> Self {
        let benchmark_ticker = new_position.benchmark_or_default();
        let entry = new_position.lifecycle.entry().copied();
        let exit = new_position.lifecycle.exit().copied();
        Self {
            id,
            user_id: new_position.user_id,
            ticker: new_position.ticker.trim().to_uppercase(),
            action: new_position.action.as_str().to_string(),
            status: new_position.lifecycle.status().as_str().to_string(),
            entry_date: entry.map(|e| format_date(e.date)),
            entry_price: entry.map(|e| format_decimal(e.price)),
            exit_date: exit.map(|e| format_date(e.date)),
            exit_price: exit.map(|e| format_decimal(e.price)),
            current_price: new_position.current_price.map(format_decimal),
            weight_pct: new_position.weight_pct.map(format_decimal),
            invested_amount: format_decimal(new_position.invested_amount),
            position_size: format_decimal(new_position.position_size),
            benchmark_ticker,
            entry_benchmark_price: new_position.entry_benchmark_price.map(format_decimal),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

fn invalid(row_id: &str, detail: impl std::fmt::Display) -> StorageError {
    StorageError::InvalidData(format!("recommendation {}: {}", row_id, detail))
}

fn parse_optional_date(row_id: &str, field: &str, value: Option<&str>) -> Result<Option<chrono::NaiveDate>, StorageError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| invalid(row_id, format!("unparsable {} '{}'", field, raw))),
    }
}

// Conversion to domain models
impl TryFrom<PositionDB> for Position {
    type Error = StorageError;

    fn try_from(db: PositionDB) -> Result<Self, Self::Error> {
        let action = PositionAction::from_str(&db.action).map_err(|e| invalid(&db.id, e))?;
        let status = PositionStatus::from_str(&db.status).map_err(|e| invalid(&db.id, e))?;
        let entry_date = parse_optional_date(&db.id, "entry_date", db.entry_date.as_deref())?;
        let exit_date = parse_optional_date(&db.id, "exit_date", db.exit_date.as_deref())?;

        let lifecycle = PositionLifecycle::from_parts(
            status,
            entry_date,
            parse_optional_decimal(db.entry_price.as_deref()),
            exit_date,
            parse_optional_decimal(db.exit_price.as_deref()),
        )
        .map_err(|e| invalid(&db.id, e))?;

        Ok(Position {
            lifecycle,
            action,
            current_price: parse_optional_decimal(db.current_price.as_deref()),
            weight_pct: parse_optional_decimal(db.weight_pct.as_deref()),
            invested_amount: parse_decimal_tolerant(&db.invested_amount).unwrap_or_default(),
            position_size: parse_decimal_tolerant(&db.position_size).unwrap_or_default(),
            entry_benchmark_price: parse_optional_decimal(db.entry_benchmark_price.as_deref()),
            benchmark_ticker: db.benchmark_ticker,
            ticker: db.ticker,
            user_id: db.user_id,
            id: db.id,
        })
    }
}

/// Changeset for the mutable sizing/pricing columns. `None` fields are left
/// untouched.
#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::recommendations)]
pub struct PositionFieldsChangeset {
    pub weight_pct: Option<String>,
    pub invested_amount: Option<String>,
    pub position_size: Option<String>,
    pub current_price: Option<String>,
    pub updated_at: Option<String>,
}

impl PositionFieldsChangeset {
    pub fn new(update: &PositionFieldsUpdate, now: String) -> Self {
        Self {
            weight_pct: update.weight_pct.map(format_decimal),
            invested_amount: update.invested_amount.map(format_decimal),
            position_size: update.position_size.map(format_decimal),
            current_price: update.current_price.map(format_decimal),
            updated_at: Some(now),
        }
    }
}

/// Database model for the per-user balance record
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::portfolio_balance)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PortfolioBalanceDB {
    pub user_id: String,
    pub initial_balance: String,
    pub current_balance: String,
    pub available_cash: String,
    pub total_invested: String,
    pub updated_at: String,
}

impl PortfolioBalanceDB {
    pub fn from_domain(balance: &PortfolioBalance, now: String) -> Self {
        Self {
            user_id: balance.user_id.clone(),
            initial_balance: format_decimal(balance.initial_balance),
            current_balance: format_decimal(balance.current_balance),
            available_cash: format_decimal(balance.available_cash),
            total_invested: format_decimal(balance.total_invested),
            updated_at: now,
        }
    }
}

impl TryFrom<PortfolioBalanceDB> for PortfolioBalance {
    type Error = StorageError;

    fn try_from(db: PortfolioBalanceDB) -> Result<Self, Self::Error> {
        let parse = |field: &str, raw: &str| {
            parse_decimal_tolerant(raw).ok_or_else(|| {
                StorageError::InvalidData(format!(
                    "portfolio_balance {}: unparsable {} '{}'",
                    db.user_id, field, raw
                ))
            })
        };
        Ok(PortfolioBalance {
            initial_balance: parse("initial_balance", &db.initial_balance)?,
            current_balance: parse("current_balance", &db.current_balance)?,
            available_cash: parse("available_cash", &db.available_cash)?,
            total_invested: parse("total_invested", &db.total_invested)?,
            user_id: db.user_id.clone(),
        })
    }
}
