//! Bid store
//!
//! The one table everything else reads from and writes to.
mod in_memory;
mod sqlite;

pub use self::{in_memory::*, sqlite::*};

use crate::auction::{Amount, Bid, Placement};
use anyhow::Result;
use std::sync::Arc;

pub trait BidStore {
    /// Create the table if it does not exist yet. Safe to call on every start.
    fn initialize(&self) -> Result<()>;

    /// Append a bid unconditionally
    fn insert(&self, username: &str, amount: Amount) -> Result<Bid>;

    /// Append a bid only if `amount` is strictly above the current leader
    ///
    /// The leader check and the write happen atomically, so two concurrent
    /// callers can never both win against the same leader.
    fn insert_if_higher(&self, username: &str, amount: Amount) -> Result<Placement>;

    fn leader(&self) -> Result<Option<Bid>>;

    /// All bids, newest first
    fn history(&self) -> Result<Vec<Bid>>;

    /// Delete every bid, keep the schema
    fn clear(&self) -> Result<()>;

    /// Drop and recreate the table
    fn reset(&self) -> Result<()>;
}

pub type SharedBidStore = Arc<dyn BidStore + Send + Sync>;
