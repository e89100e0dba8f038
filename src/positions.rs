//! Position book - open positions and the paper cash ledger

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// An open trading exposure, tracked until closed
#[derive(Debug, Clone, Serialize)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    pub entry_price: Decimal,
    /// Token quantity held
    pub amount: Decimal,
    /// Cash spent to open, in USD
    pub cost_usd: Decimal,
    pub opened_at: DateTime<Utc>,
}

/// A position after it has been closed out
#[derive(Debug, Clone)]
pub struct ClosedPosition {
    pub position: Position,
    pub exit_price: Decimal,
    pub proceeds_usd: Decimal,
    pub pnl_usd: Decimal,
}

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("insufficient_funds")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("position already held for {0}")]
    AlreadyHeld(String),
}

/// Process-wide registry of open positions
///
/// Cloning shares the same underlying book; the scheduler, every cycle
/// task and the tests all observe one registry.
#[derive(Clone)]
pub struct PositionBook {
    inner: Arc<Mutex<BookInner>>,
}

struct BookInner {
    cash_usd: Decimal,
    positions: HashMap<String, Position>,
}

impl PositionBook {
    /// Create an empty book with the given starting cash
    pub fn new(starting_cash_usd: Decimal) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BookInner {
                cash_usd: starting_cash_usd,
                positions: HashMap::new(),
            })),
        }
    }

    /// Open a position by spending `cost_usd` at `entry_price`
    pub fn open(
        &self,
        symbol: &str,
        entry_price: Decimal,
        cost_usd: Decimal,
    ) -> Result<Position, BookError> {
        let mut book = self.inner.lock();

        if book.positions.contains_key(symbol) {
            return Err(BookError::AlreadyHeld(symbol.to_string()));
        }
        if book.cash_usd < cost_usd {
            return Err(BookError::InsufficientFunds {
                needed: cost_usd,
                available: book.cash_usd,
            });
        }

        let position = Position {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            entry_price,
            amount: cost_usd / entry_price,
            cost_usd,
            opened_at: Utc::now(),
        };

        book.cash_usd -= cost_usd;
        book.positions.insert(symbol.to_string(), position.clone());

        info!(
            "New position: {} | Amount: {} | Entry: {}",
            position.symbol, position.amount, position.entry_price
        );

        Ok(position)
    }

    /// Close a held position at `exit_price`, crediting the proceeds back
    /// to cash; returns None if the symbol is not held
    pub fn close(&self, symbol: &str, exit_price: Decimal) -> Option<ClosedPosition> {
        let mut book = self.inner.lock();

        let position = book.positions.remove(symbol)?;
        let proceeds_usd = position.amount * exit_price;
        let pnl_usd = proceeds_usd - position.cost_usd;
        book.cash_usd += proceeds_usd;

        info!(
            "Position closed: {} | Exit: {} | Realized PnL: {}",
            symbol, exit_price, pnl_usd
        );

        Some(ClosedPosition {
            position,
            exit_price,
            proceeds_usd,
            pnl_usd,
        })
    }

    /// Read-only snapshot of the open positions
    pub fn list(&self) -> Vec<Position> {
        let book = self.inner.lock();
        let mut positions: Vec<Position> = book.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.opened_at.cmp(&b.opened_at));
        positions
    }

    pub fn len(&self) -> usize {
        self.inner.lock().positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().positions.is_empty()
    }

    pub fn holds(&self, symbol: &str) -> bool {
        self.inner.lock().positions.contains_key(symbol)
    }

    pub fn cash_usd(&self) -> Decimal {
        self.inner.lock().cash_usd
    }

    /// Check whether one more entry of `cost_usd` can be funded
    pub fn can_fund(&self, cost_usd: Decimal) -> bool {
        self.inner.lock().cash_usd >= cost_usd
    }
}

impl std::fmt::Debug for PositionBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let book = self.inner.lock();
        f.debug_struct("PositionBook")
            .field("cash_usd", &book.cash_usd)
            .field("positions", &book.positions.len())
            .finish()
    }
}
