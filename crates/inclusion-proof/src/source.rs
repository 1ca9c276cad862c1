// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;

use alloy_primitives::B256;

use crate::{
    error::SourceError,
    types::{BlockInfo, BlockWithTransactions, TransactionLocation},
};

/// Read access to chain data needed to build a proof.
///
/// Implementations translate their transport's records into the typed values here and
/// classify failures: only [`SourceError::Transient`] is retried by callers.
pub trait ChainDataSource: Send + Sync {
    /// Looks up where a transaction was included.
    ///
    /// Returns [`SourceError::TransactionNotFound`] if the hash is unknown.
    fn transaction_location(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<TransactionLocation, SourceError>> + Send;

    /// Fetches a block with its full header fields and every transaction, in block order.
    fn block_with_transactions(
        &self,
        block_hash: B256,
    ) -> impl Future<Output = Result<BlockWithTransactions, SourceError>> + Send;

    /// Fetches the snapshot of a block by number.
    fn block_info_by_number(
        &self,
        number: u64,
    ) -> impl Future<Output = Result<BlockInfo, SourceError>> + Send;

    /// Fetches the snapshot of a block by hash.
    fn block_info_by_hash(
        &self,
        block_hash: B256,
    ) -> impl Future<Output = Result<BlockInfo, SourceError>> + Send;

    /// Fetches the snapshot of the current chain head.
    fn latest_block_info(&self) -> impl Future<Output = Result<BlockInfo, SourceError>> + Send;
}
