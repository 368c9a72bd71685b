use super::*;
use crate::auction::{self, BidId};
use parking_lot::Mutex;

#[derive(Debug)]
struct InMemoryBids {
    next_id: BidId,
    bids: Vec<Bid>,
}

impl Default for InMemoryBids {
    fn default() -> Self {
        Self {
            next_id: 1,
            bids: Vec::new(),
        }
    }
}

impl InMemoryBids {
    fn push(&mut self, username: &str, amount: Amount) -> Bid {
        let bid = Bid {
            id: self.next_id,
            username: username.to_owned(),
            amount,
            timestamp: auction::now(),
        };
        self.next_id += 1;
        self.bids.push(bid.clone());
        bid
    }

    fn leader(&self) -> Option<&Bid> {
        self.bids
            .iter()
            .fold(None, |best: Option<&Bid>, bid| match best {
                Some(best) if !bid.leads(best) => Some(best),
                _ => Some(bid),
            })
    }
}

/// Fake in-memory store.
///
/// Useful for unit-tests.
#[derive(Debug, Default)]
pub struct InMemoryBidStore {
    inner: Mutex<InMemoryBids>,
}

impl InMemoryBidStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> SharedBidStore {
        Arc::new(Self::new())
    }
}

impl BidStore for InMemoryBidStore {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn insert(&self, username: &str, amount: Amount) -> Result<Bid> {
        Ok(self.inner.lock().push(username, amount))
    }

    fn insert_if_higher(&self, username: &str, amount: Amount) -> Result<Placement> {
        let mut inner = self.inner.lock();

        let leader_amount = inner.leader().map(|bid| bid.amount).unwrap_or(0.0);
        if amount <= leader_amount {
            return Ok(Placement::Outbid { leader_amount });
        }

        Ok(Placement::Placed(inner.push(username, amount)))
    }

    fn leader(&self) -> Result<Option<Bid>> {
        Ok(self.inner.lock().leader().cloned())
    }

    fn history(&self) -> Result<Vec<Bid>> {
        let mut bids = self.inner.lock().bids.clone();
        bids.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        Ok(bids)
    }

    fn clear(&self) -> Result<()> {
        // ids keep counting up, like an AUTOINCREMENT column after DELETE
        self.inner.lock().bids.clear();
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        *self.inner.lock() = InMemoryBids::default();
        Ok(())
    }
}
