// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{future::Future, time::Duration};

use alloy_primitives::B256;
use inclusion_proof::{
    BlockInfo, BlockWithTransactions, ChainDataSource, SourceError, TransactionLocation,
};
use tracing::warn;

/// How often and how patiently transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// total attempts per request, the first one included
    pub max_attempts: u32,
    /// base delay; the n-th retry waits `n * backoff`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Wraps a [`ChainDataSource`] and retries its transient failures.
///
/// Not-found and malformed answers are returned as they are. A transient failure that
/// outlives the policy becomes [`SourceError::RetriesExhausted`].
#[derive(Debug, Clone)]
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSource<S> {
    /// Retries the failures of `inner` according to `policy`.
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped source, for requests that must not be retried.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn retry<T, F, Fut>(&self, operation: &'static str, mut request: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match request().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            if attempt >= max_attempts {
                return Err(SourceError::RetriesExhausted {
                    operation,
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.backoff * attempt;
            warn!(operation, attempt, ?delay, %err, "retrying data source request");
            tokio::time::sleep(delay).await;
        }
    }
}

impl<S: ChainDataSource> ChainDataSource for RetryingSource<S> {
    async fn transaction_location(&self, tx_hash: B256) -> Result<TransactionLocation, SourceError> {
        self.retry("transaction_location", || self.inner.transaction_location(tx_hash))
            .await
    }

    async fn block_with_transactions(
        &self,
        block_hash: B256,
    ) -> Result<BlockWithTransactions, SourceError> {
        self.retry("block_with_transactions", || {
            self.inner.block_with_transactions(block_hash)
        })
        .await
    }

    async fn block_info_by_number(&self, number: u64) -> Result<BlockInfo, SourceError> {
        self.retry("block_info_by_number", || self.inner.block_info_by_number(number))
            .await
    }

    async fn block_info_by_hash(&self, block_hash: B256) -> Result<BlockInfo, SourceError> {
        self.retry("block_info_by_hash", || self.inner.block_info_by_hash(block_hash))
            .await
    }

    async fn latest_block_info(&self) -> Result<BlockInfo, SourceError> {
        self.retry("latest_block_info", || self.inner.latest_block_info())
            .await
    }
}
