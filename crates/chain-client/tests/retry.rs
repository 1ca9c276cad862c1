// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use alloy_primitives::B256;
use chain_client::{RetryPolicy, RetryingSource};
use inclusion_proof::{
    BlockInfo, BlockWithTransactions, ChainDataSource, SourceError, TransactionLocation,
};

/// Fails `failures` times with `error`, then answers.
struct FlakySource {
    failures: u32,
    error: SourceError,
    calls: AtomicU32,
}

impl FlakySource {
    fn new(failures: u32, error: SourceError) -> Self {
        Self {
            failures,
            error,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T>(&self, value: T) -> Result<T, SourceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(self.error.clone())
        } else {
            Ok(value)
        }
    }
}

fn info(number: u64) -> BlockInfo {
    BlockInfo {
        number,
        hash: B256::with_last_byte(number as u8),
        parent_hash: B256::ZERO,
        timestamp: 0,
    }
}

impl ChainDataSource for FlakySource {
    async fn transaction_location(&self, tx_hash: B256) -> Result<TransactionLocation, SourceError> {
        self.answer(TransactionLocation {
            hash: tx_hash,
            inclusion: None,
        })
    }

    async fn block_with_transactions(
        &self,
        block_hash: B256,
    ) -> Result<BlockWithTransactions, SourceError> {
        Err(SourceError::BlockNotFound(block_hash.to_string()))
    }

    async fn block_info_by_number(&self, number: u64) -> Result<BlockInfo, SourceError> {
        self.answer(info(number))
    }

    async fn block_info_by_hash(&self, _block_hash: B256) -> Result<BlockInfo, SourceError> {
        self.answer(info(1))
    }

    async fn latest_block_info(&self) -> Result<BlockInfo, SourceError> {
        self.answer(info(9))
    }
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let source = RetryingSource::new(
        FlakySource::new(3, SourceError::Transient("connection reset".into())),
        policy(10),
    );

    let block = source.block_info_by_number(7).await.unwrap();
    assert_eq!(block, info(7));
    assert_eq!(source.inner().calls(), 4);
}

#[tokio::test]
async fn test_retries_stop_at_the_bound() {
    let source = RetryingSource::new(
        FlakySource::new(u32::MAX, SourceError::Transient("503".into())),
        policy(4),
    );

    let err = source.latest_block_info().await.unwrap_err();
    assert_eq!(source.inner().calls(), 4);
    assert_eq!(
        err,
        SourceError::RetriesExhausted {
            operation: "latest_block_info",
            attempts: 4,
            last: Box::new(SourceError::Transient("503".into())),
        }
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let missing = B256::repeat_byte(0x33);
    let source = RetryingSource::new(
        FlakySource::new(u32::MAX, SourceError::TransactionNotFound(missing)),
        policy(10),
    );

    let err = source.transaction_location(missing).await.unwrap_err();
    assert_eq!(err, SourceError::TransactionNotFound(missing));
    assert_eq!(source.inner().calls(), 1);
}

#[tokio::test]
async fn test_malformed_is_not_retried() {
    let source = RetryingSource::new(
        FlakySource::new(
            u32::MAX,
            SourceError::Malformed {
                method: "eth_getBlockByHash",
                reason: "missing stateRoot".into(),
            },
        ),
        policy(10),
    );

    assert!(source.block_info_by_hash(B256::ZERO).await.is_err());
    assert_eq!(source.inner().calls(), 1);
}

#[tokio::test]
async fn test_zero_attempts_still_tries_once() {
    let source = RetryingSource::new(
        FlakySource::new(0, SourceError::Transient("unused".into())),
        policy(0),
    );

    assert_eq!(source.block_info_by_number(2).await.unwrap(), info(2));
    assert_eq!(source.inner().calls(), 1);
}

#[tokio::test]
async fn test_recovers_after_a_single_failure() {
    let source = RetryingSource::new(
        FlakySource::new(1, SourceError::Transient("timeout".into())),
        policy(3),
    );

    let head = source.latest_block_info().await.unwrap();
    assert_eq!(head, info(9));
    assert_eq!(source.inner().calls(), 2);
}
