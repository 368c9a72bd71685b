//! Bid board
//!
//! The user-facing flows: placing a bid, reading the board, and the
//! password-gated admin actions. Every call is self-contained and reads
//! whatever the store holds at that moment.
use crate::auction::{self, Amount, Bid, InputError, Placement};
use crate::auth::SharedAuthenticator;
use crate::store::SharedBidStore;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] InputError),
    #[error("Bid rejected: there is already a bid of {leader_amount:.2} or more.")]
    NotHighBid { leader_amount: Amount },
    #[error("Wrong password. Action not allowed.")]
    Authorization,
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Everything the page shows about the current state of the board
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoardView {
    pub leader: Option<Bid>,
    pub history: Vec<Bid>,
}

pub struct BidBoard {
    store: SharedBidStore,
    authenticator: SharedAuthenticator,
}

impl BidBoard {
    pub fn new(store: SharedBidStore, authenticator: SharedAuthenticator) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    /// Place a bid if it beats the current leader
    pub fn submit(&self, username: &str, amount: Amount) -> Result<Bid, BoardError> {
        let username = auction::normalize_username(username)?;
        let amount = auction::normalize_amount(amount)?;

        match self.store.insert_if_higher(&username, amount)? {
            Placement::Placed(bid) => {
                debug!(id = bid.id, username = %bid.username, amount, "new high bid");
                Ok(bid)
            }
            Placement::Outbid { leader_amount } => {
                debug!(%username, amount, leader_amount, "bid too low");
                Err(BoardError::NotHighBid { leader_amount })
            }
        }
    }

    pub fn snapshot(&self) -> Result<BoardView, BoardError> {
        Ok(BoardView {
            leader: self.store.leader()?,
            history: self.store.history()?,
        })
    }

    /// Delete every bid
    pub fn clear(&self, password: &str) -> Result<(), BoardError> {
        self.authorize(password, "clear")?;
        self.store.clear()?;
        info!("all bids cleared");
        Ok(())
    }

    /// Drop and recreate the bids table
    pub fn reset(&self, password: &str) -> Result<(), BoardError> {
        self.authorize(password, "reset")?;
        self.store.reset()?;
        info!("bids table recreated");
        Ok(())
    }

    fn authorize(&self, password: &str, action: &str) -> Result<(), BoardError> {
        if self.authenticator.authorize(password) {
            Ok(())
        } else {
            warn!(action, "admin action refused: wrong password");
            Err(BoardError::Authorization)
        }
    }
}
