//! Top-K sketch commands.

use std::collections::HashMap;

use resp_protocol::{Command, ToArg};

use crate::client::Client;
use crate::error::Result;

impl Client {
    /// Create a Top-K sketch tracking the `topk` heaviest items.
    ///
    /// `width`, `depth` and `decay` size the underlying count-min sketch.
    /// Returns the server's status reply (`OK`).
    pub async fn topk_reserve(
        &self,
        key: &str,
        topk: i64,
        width: i64,
        depth: i64,
        decay: f64,
    ) -> Result<String> {
        self.query(
            Command::new("TOPK.RESERVE")
                .arg(key)
                .arg(&topk)
                .arg(&width)
                .arg(&depth)
                .arg(&decay),
        )
        .await
    }

    /// Add items to the sketch.
    ///
    /// For every item, in order, returns the item it expelled from the top
    /// list, or `None`.
    pub async fn topk_add<I>(&self, key: &str, items: I) -> Result<Vec<Option<String>>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.query(Command::new("TOPK.ADD").arg(key).args(items)).await
    }

    /// Estimated count of each item.
    pub async fn topk_count<I>(&self, key: &str, items: I) -> Result<Vec<i64>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.query(Command::new("TOPK.COUNT").arg(key).args(items)).await
    }

    /// Whether each item is currently in the top list.
    pub async fn topk_query<I>(&self, key: &str, items: I) -> Result<Vec<bool>>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.query(Command::new("TOPK.QUERY").arg(key).args(items)).await
    }

    /// The items currently in the top list.
    pub async fn topk_list(&self, key: &str) -> Result<Vec<String>> {
        self.query(Command::new("TOPK.LIST").arg(key)).await
    }

    /// Sketch parameters (`k`, `width`, `depth`, `decay`). Integer values are
    /// rendered in decimal.
    pub async fn topk_info(&self, key: &str) -> Result<HashMap<String, String>> {
        self.query(Command::new("TOPK.INFO").arg(key)).await
    }

    /// Increase the count of items by the given amounts.
    ///
    /// Like [`topk_add`](Self::topk_add), returns the expelled item per
    /// entry, in order.
    pub async fn topk_incr_by<S: AsRef<str>>(
        &self,
        key: &str,
        increments: &[(S, i64)],
    ) -> Result<Vec<Option<String>>> {
        let mut command = Command::new("TOPK.INCRBY").arg(key);
        for (item, increment) in increments {
            command = command.arg(item.as_ref()).arg(increment);
        }
        self.query(command).await
    }
}
