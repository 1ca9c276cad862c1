// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use alloy_primitives::B256;
use tracing::{debug, info};

use crate::{
    codec::CompositeProof,
    error::{ProofError, SourceError},
    hardfork::HardforkSchedule,
    header::encode_verified_header,
    source::ChainDataSource,
    trie::build_inclusion_proof,
    types::{BlockWithTransactions, Inclusion},
    witness::WitnessBuilder,
};

/// Default number of concurrent block reads while fetching a witness window.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 32;

/// Tunables of a [`ProofBuilder`].
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// hardfork activation table used to lay out headers
    pub schedule: HardforkSchedule,
    /// maximum number of concurrent block reads, at least 1
    pub concurrency: usize,
    /// upper bound on a whole [`ProofBuilder::build_proof`] call
    pub deadline: Option<Duration>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            schedule: HardforkSchedule::mainnet(),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
            deadline: None,
        }
    }
}

/// Builds [`CompositeProof`]s from a [`ChainDataSource`].
#[derive(Debug)]
pub struct ProofBuilder<S> {
    source: S,
    config: BuilderConfig,
}

impl<S: ChainDataSource> ProofBuilder<S> {
    /// Creates a builder reading from `source`.
    pub fn new(source: S, config: BuilderConfig) -> Self {
        Self { source, config }
    }

    /// The underlying data source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Builds the inclusion proof of `tx_hash` against the current chain head.
    ///
    /// Every piece of reported data is checked before it goes into the proof: the
    /// header must hash to the block hash, the rebuilt transaction trie must match
    /// the header's root, and the witness window must be one linked chain segment.
    /// The first failure aborts the build. When a deadline is configured and elapses,
    /// in-flight reads are dropped and [`ProofError::DeadlineExceeded`] is returned.
    pub async fn build_proof(&self, tx_hash: B256) -> Result<CompositeProof, ProofError> {
        match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.build(tx_hash))
                .await
                .map_err(|_| ProofError::DeadlineExceeded(deadline))?,
            None => self.build(tx_hash).await,
        }
    }

    async fn build(&self, tx_hash: B256) -> Result<CompositeProof, ProofError> {
        info!(%tx_hash, "building inclusion proof");

        let inclusion = self.locate(tx_hash).await?;
        let block = self.fetch_block(&inclusion).await?;
        let number = block.header.number;

        let hardfork = self.config.schedule.resolve(number);
        debug!(block_number = number, %hardfork, "resolved hardfork");
        let header = encode_verified_header(&block.header, hardfork, block.hash)?;

        let trie = build_inclusion_proof(&block.encoded_transactions(), inclusion.index)?;
        if trie.root != block.header.transactions_root {
            return Err(ProofError::TransactionsRootMismatch {
                block_number: number,
                declared: block.header.transactions_root,
                computed: trie.root,
            });
        }

        let transaction = usize::try_from(inclusion.index)
            .ok()
            .and_then(|index| block.transactions.get(index))
            .ok_or(ProofError::TransactionIndexOutOfRange {
                index: inclusion.index,
                count: block.transactions.len(),
            })?;
        let computed = transaction.computed_hash();
        if computed != tx_hash {
            return Err(ProofError::TransactionHashMismatch {
                index: inclusion.index,
                expected: tx_hash,
                computed,
            });
        }
        debug!(
            block_number = number,
            index = inclusion.index,
            nodes = trie.nodes.len(),
            "transaction trie proof verified against header root"
        );

        let head = self.source.latest_block_info().await?;
        let witness = WitnessBuilder::new(&self.source, self.config.concurrency)
            .build_witness(&head, block.hash)
            .await?;

        info!(
            %tx_hash,
            block_number = number,
            head_number = head.number,
            "built inclusion proof"
        );

        Ok(CompositeProof {
            witness,
            header,
            trie_proof: trie.nodes,
            transaction_key: trie.key,
            transaction_hash: tx_hash,
        })
    }

    async fn locate(&self, tx_hash: B256) -> Result<Inclusion, ProofError> {
        let location = match self.source.transaction_location(tx_hash).await {
            Ok(location) => location,
            Err(SourceError::TransactionNotFound(hash)) => {
                return Err(ProofError::UnknownTransaction(hash))
            }
            Err(err) => return Err(err.into()),
        };

        location
            .inclusion
            .ok_or(ProofError::PendingTransaction(tx_hash))
    }

    async fn fetch_block(&self, inclusion: &Inclusion) -> Result<BlockWithTransactions, ProofError> {
        let block = self
            .source
            .block_with_transactions(inclusion.block_hash)
            .await?;

        if block.hash != inclusion.block_hash || block.header.number != inclusion.block_number {
            return Err(ProofError::UnexpectedBlock {
                requested: format!("{} ({})", inclusion.block_number, inclusion.block_hash),
                returned: format!("{} ({})", block.header.number, block.hash),
            });
        }

        Ok(block)
    }
}
