use alphaboard_core::errors::{DatabaseError, Error};
use alphaboard_core::positions::{
    NewPosition, PortfolioBalance, Position, PositionFieldsUpdate, PositionRepositoryTrait,
    PositionSizing, PositionStatus,
};
use alphaboard_core::Result;

use super::model::{PortfolioBalanceDB, PositionDB, PositionFieldsChangeset};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{portfolio_balance, recommendations};
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};

use std::sync::Arc;
use uuid::Uuid;

pub struct PositionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

fn not_found(position_id: &str) -> Error {
    Error::Database(DatabaseError::NotFound(format!(
        "Recommendation {} not found",
        position_id
    )))
}

fn load_position(conn: &mut SqliteConnection, position_id: &str) -> Result<Position> {
    let row = recommendations::table
        .find(position_id)
        .select(PositionDB::as_select())
        .first::<PositionDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| not_found(position_id))?;
    Ok(Position::try_from(row)?)
}

fn write_balance(conn: &mut SqliteConnection, balance: &PortfolioBalance) -> Result<PortfolioBalance> {
    let row = PortfolioBalanceDB::from_domain(balance, now_timestamp());
    let stored = diesel::insert_into(portfolio_balance::table)
        .values(&row)
        .on_conflict(portfolio_balance::user_id)
        .do_update()
        .set(&row)
        .returning(PortfolioBalanceDB::as_returning())
        .get_result(conn)
        .map_err(StorageError::from)?;
    Ok(PortfolioBalance::try_from(stored)?)
}

impl PositionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        PositionRepository { pool, writer }
    }

    fn list_positions_impl(
        &self,
        user: &str,
        status: Option<PositionStatus>,
    ) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = recommendations::table
            .filter(recommendations::user_id.eq(user))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(recommendations::status.eq(status.as_str()));
        }

        let rows = query
            .order((recommendations::entry_date.asc(), recommendations::id.asc()))
            .select(PositionDB::as_select())
            .load::<PositionDB>(&mut conn)
            .map_err(StorageError::from)?;

        // Rows that break the pricing invariants are skipped rather than
        // failing the whole listing.
        let positions: Vec<Position> = rows
            .into_iter()
            .filter_map(|row| match Position::try_from(row) {
                Ok(position) => Some(position),
                Err(e) => {
                    warn!("Skipping invalid recommendation row: {}", e);
                    None
                }
            })
            .collect();
        debug!("Loaded {} recommendations for user {}", positions.len(), user);
        Ok(positions)
    }
}

#[async_trait]
impl PositionRepositoryTrait for PositionRepository {
    fn list_positions(
        &self,
        user_id: &str,
        status: Option<PositionStatus>,
    ) -> Result<Vec<Position>> {
        self.list_positions_impl(user_id, status)
    }

    fn get_position(&self, position_id: &str) -> Result<Position> {
        let mut conn = get_connection(&self.pool)?;
        load_position(&mut conn, position_id)
    }

    async fn create_position(&self, new_position: NewPosition) -> Result<Position> {
        new_position.validate()?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Position> {
                let id = new_position
                    .id
                    .clone()
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let row = PositionDB::from_new(new_position, id, now_timestamp());

                let stored = diesel::insert_into(recommendations::table)
                    .values(&row)
                    .returning(PositionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Position::try_from(stored)?)
            })
            .await
    }

    async fn update_position_fields(
        &self,
        position_id: &str,
        fields: PositionFieldsUpdate,
    ) -> Result<Position> {
        let position_id = position_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Position> {
                if fields.is_empty() {
                    return load_position(conn, &position_id);
                }
                let changes = PositionFieldsChangeset::new(&fields, now_timestamp());
                let updated = diesel::update(recommendations::table.find(position_id.as_str()))
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(not_found(&position_id));
                }
                load_position(conn, &position_id)
            })
            .await
    }

    fn get_balance(&self, user_id: &str) -> Result<Option<PortfolioBalance>> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolio_balance::table
            .find(user_id)
            .select(PortfolioBalanceDB::as_select())
            .first::<PortfolioBalanceDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        match row {
            Some(row) => Ok(Some(PortfolioBalance::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_balance(&self, balance: PortfolioBalance) -> Result<PortfolioBalance> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PortfolioBalance> {
                write_balance(conn, &balance)
            })
            .await
    }

    async fn apply_rebalance(
        &self,
        user_id: &str,
        sizings: Vec<PositionSizing>,
        balance: PortfolioBalance,
    ) -> Result<usize> {
        let owner = user_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let now = now_timestamp();
                let mut updated = 0;
                for sizing in &sizings {
                    let changes =
                        PositionFieldsChangeset::new(&PositionFieldsUpdate::from(sizing), now.clone());
                    let rows = diesel::update(
                        recommendations::table
                            .filter(recommendations::id.eq(sizing.position_id.as_str()))
                            .filter(recommendations::user_id.eq(owner.as_str())),
                    )
                    .set(&changes)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                    // Any miss aborts the job so nothing of this rebalance is kept.
                    if rows == 0 {
                        return Err(not_found(&sizing.position_id));
                    }
                    updated += rows;
                }
                write_balance(conn, &balance)?;
                Ok(updated)
            })
            .await
    }
}
