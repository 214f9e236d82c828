use std::collections::HashMap;

use vesper_shared::{Serial, TradeId};

/// An open exchange between two mobiles. Each side owns one trade
/// container, equipped on its mobile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecureTrade {
    id: TradeId,
    from: Serial,
    to: Serial,
    from_container: Serial,
    to_container: Serial,
}

impl SecureTrade {
    pub fn id(&self) -> TradeId {
        self.id
    }

    pub fn from(&self) -> Serial {
        self.from
    }

    pub fn to(&self) -> Serial {
        self.to
    }

    pub fn from_container(&self) -> Serial {
        self.from_container
    }

    pub fn to_container(&self) -> Serial {
        self.to_container
    }

    pub fn involves(&self, mobile: Serial) -> bool {
        self.from == mobile || self.to == mobile
    }

    /// The other party, as seen from `mobile`
    pub fn counterpart(&self, mobile: Serial) -> Serial {
        if mobile == self.from {
            self.to
        } else {
            self.from
        }
    }
}

#[derive(Default)]
pub struct SecureTrades {
    trades: HashMap<TradeId, SecureTrade>,
    next_id: TradeId,
}

impl SecureTrades {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_id(&mut self) -> TradeId {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    pub(crate) fn insert(&mut self, id: TradeId, from: Serial, to: Serial, from_container: Serial, to_container: Serial) {
        self.trades.insert(
            id,
            SecureTrade {
                id,
                from,
                to,
                from_container,
                to_container,
            },
        );
    }

    pub(crate) fn remove(&mut self, id: TradeId) -> Option<SecureTrade> {
        self.trades.remove(&id)
    }

    pub fn get(&self, id: TradeId) -> Option<&SecureTrade> {
        self.trades.get(&id)
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Trades the mobile takes part in
    pub fn involving(&self, mobile: Serial) -> Vec<TradeId> {
        self.trades
            .values()
            .filter(|trade| trade.involves(mobile))
            .map(SecureTrade::id)
            .collect()
    }
}
