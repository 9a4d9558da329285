//! Bloom filter commands.

use std::collections::HashMap;

use resp_protocol::{Command, ToArg};

use crate::client::Client;
use crate::error::Result;

impl Client {
    /// Create an empty Bloom filter with the given false-positive rate and
    /// initial capacity.
    ///
    /// Fails with a server error if `key` already exists.
    pub async fn bf_reserve(&self, key: &str, error_rate: f64, capacity: u64) -> Result<()> {
        self.query(
            Command::new("BF.RESERVE")
                .arg(key)
                .arg(&error_rate)
                .arg(&capacity),
        )
        .await
    }

    /// Add `item` to the filter, creating the filter if needed.
    ///
    /// Returns `true` if the item was newly added, `false` if it may have
    /// existed already.
    pub async fn bf_add(&self, key: &str, item: &str) -> Result<bool> {
        self.query(Command::new("BF.ADD").arg(key).arg(item)).await
    }

    /// Check whether `item` may be in the filter.
    pub async fn bf_exists(&self, key: &str, item: &str) -> Result<bool> {
        self.query(Command::new("BF.EXISTS").arg(key).arg(item)).await
    }

    /// Get the filter's statistics (`Capacity`, `Size`, `Number of filters`,
    /// `Number of items inserted`, `Expansion rate`).
    pub async fn bf_info(&self, key: &str) -> Result<HashMap<String, i64>> {
        self.query(Command::new("BF.INFO").arg(key)).await
    }

    /// Add several items at once. One flag per item, in order.
    pub async fn bf_add_multi<I>(&self, key: &str, items: I) -> Result<Vec<bool>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.query(Command::new("BF.MADD").arg(key).args(items)).await
    }

    /// Check several items at once. One flag per item, in order.
    pub async fn bf_exists_multi<I>(&self, key: &str, items: I) -> Result<Vec<bool>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.query(Command::new("BF.MEXISTS").arg(key).args(items)).await
    }
}
