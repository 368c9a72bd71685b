use super::*;
use crate::auction::{self, Timestamp};
use crate::persistence::SqlitePersistence;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

pub const CREATE_BIDS_TABLE: &str = "CREATE TABLE IF NOT EXISTS bids (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    amount REAL NOT NULL,
    timestamp TEXT NOT NULL
)";

pub const DROP_BIDS_TABLE: &str = "DROP TABLE IF EXISTS bids";

pub const INSERT_BID: &str = "INSERT INTO bids (username, amount, timestamp) VALUES (?1, ?2, ?3)";

pub const GET_LEADER_AMOUNT: &str = "SELECT COALESCE(MAX(amount), 0.0) FROM bids";

pub const GET_LEADER: &str = "SELECT id, username, amount, timestamp FROM bids \
     ORDER BY amount DESC, timestamp ASC, id ASC LIMIT 1";

pub const GET_HISTORY: &str = "SELECT id, username, amount, timestamp FROM bids \
     ORDER BY timestamp DESC, id DESC";

pub const DELETE_ALL_BIDS: &str = "DELETE FROM bids";

#[derive(Clone)]
pub struct SqliteBidStore {
    persistence: SqlitePersistence,
}

impl SqliteBidStore {
    pub fn new(persistence: SqlitePersistence) -> Self {
        Self { persistence }
    }

    fn insert_on(conn: &Connection, username: &str, amount: Amount) -> Result<Bid> {
        let timestamp = auction::now();
        conn.execute(
            INSERT_BID,
            params![username, amount, auction::format_timestamp(&timestamp)],
        )?;

        Ok(Bid {
            id: conn.last_insert_rowid(),
            username: username.to_owned(),
            amount,
            timestamp,
        })
    }
}

fn row_to_bid(row: &Row<'_>) -> rusqlite::Result<Bid> {
    let raw_timestamp: String = row.get(3)?;
    let timestamp: Timestamp = auction::parse_timestamp(&raw_timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(Bid {
        id: row.get(0)?,
        username: row.get(1)?,
        amount: row.get(2)?,
        timestamp,
    })
}

impl BidStore for SqliteBidStore {
    fn initialize(&self) -> Result<()> {
        self.persistence
            .get_connection()?
            .execute(CREATE_BIDS_TABLE, [])?;
        Ok(())
    }

    fn insert(&self, username: &str, amount: Amount) -> Result<Bid> {
        let conn = self.persistence.get_connection()?;
        Self::insert_on(&conn, username, amount)
    }

    fn insert_if_higher(&self, username: &str, amount: Amount) -> Result<Placement> {
        let mut conn = self.persistence.get_connection()?;
        // IMMEDIATE takes the write lock up front, so the leader we compare
        // against cannot change before our insert lands.
        let transaction = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let leader_amount: Amount = transaction.query_row(GET_LEADER_AMOUNT, [], |row| row.get(0))?;
        if amount <= leader_amount {
            transaction.rollback()?;
            return Ok(Placement::Outbid { leader_amount });
        }

        let bid = Self::insert_on(&transaction, username, amount)?;
        transaction.commit()?;

        debug!(id = bid.id, amount, "bid stored");
        Ok(Placement::Placed(bid))
    }

    fn leader(&self) -> Result<Option<Bid>> {
        Ok(self
            .persistence
            .get_connection()?
            .query_row(GET_LEADER, [], row_to_bid)
            .optional()?)
    }

    fn history(&self) -> Result<Vec<Bid>> {
        let conn = self.persistence.get_connection()?;
        let mut statement = conn.prepare(GET_HISTORY)?;
        let bids = statement
            .query_map([], row_to_bid)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bids)
    }

    fn clear(&self) -> Result<()> {
        self.persistence
            .get_connection()?
            .execute(DELETE_ALL_BIDS, [])?;
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let mut conn = self.persistence.get_connection()?;
        let transaction = conn.transaction()?;
        transaction.execute(DROP_BIDS_TABLE, [])?;
        transaction.execute(CREATE_BIDS_TABLE, [])?;
        transaction.commit()?;
        Ok(())
    }
}
