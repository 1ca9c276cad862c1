// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use alloy_primitives::{keccak256, Bytes, B256};
use alloy_trie::root::ordered_trie_root_with_encoder;
use inclusion_proof::{
    encode_header, BlockInfo, BlockWithTransactions, ChainDataSource, Hardfork,
    HardforkSchedule, HeaderFields, Inclusion, SignedTransaction, SourceError,
    TransactionLocation,
};

pub const LONDON_BLOCK: u64 = 1_500;
pub const SHANGHAI_BLOCK: u64 = 2_000;

/// Hardfork table of the in-memory chain, with forks close to genesis.
pub fn schedule() -> HardforkSchedule {
    HardforkSchedule::new(vec![
        (0, Hardfork::Frontier),
        (LONDON_BLOCK, Hardfork::London),
        (SHANGHAI_BLOCK, Hardfork::Shanghai),
    ])
    .unwrap()
}

/// In-memory chain whose blocks hash and link like real ones.
pub struct MockChain {
    pub blocks: Vec<BlockWithTransactions>,
    pub head: u64,
    pub pending: HashSet<B256>,
    pub failing_numbers: HashSet<u64>,
    pub read_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockChain {
    /// Chain of blocks `0..length`, the last one being the head.
    pub fn new(length: u64) -> Self {
        let schedule = schedule();
        let mut blocks = Vec::with_capacity(length as usize);
        let mut parent_hash = B256::ZERO;

        for number in 0..length {
            let transactions = transactions(number);
            let encoded: Vec<Bytes> = transactions.iter().map(|tx| tx.encoded.clone()).collect();
            let header = HeaderFields {
                parent_hash,
                ommers_hash: keccak256([0xc0u8]),
                state_root: keccak256(format!("state {number}")),
                transactions_root: ordered_trie_root_with_encoder(&encoded, |tx, buf| {
                    buf.extend_from_slice(tx)
                }),
                receipts_root: keccak256(format!("receipts {number}")),
                number,
                gas_limit: 30_000_000,
                gas_used: 21_000 * transactions.len() as u64,
                timestamp: 1_438_269_973 + number * 12,
                base_fee_per_gas: (number >= LONDON_BLOCK).then_some(7),
                withdrawals_root: (number >= SHANGHAI_BLOCK)
                    .then(|| keccak256(format!("withdrawals {number}"))),
                ..Default::default()
            };
            let hash = keccak256(encode_header(&header, schedule.resolve(number)).unwrap());
            parent_hash = hash;
            blocks.push(BlockWithTransactions {
                hash,
                header,
                transactions,
            });
        }

        Self {
            blocks,
            head: length - 1,
            pending: HashSet::new(),
            failing_numbers: HashSet::new(),
            read_delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn block(&self, number: u64) -> &BlockWithTransactions {
        &self.blocks[number as usize]
    }

    pub fn tx_hash(&self, number: u64, index: usize) -> B256 {
        self.block(number).transactions[index].hash
    }

    /// Highest number of concurrent `block_info_by_number` reads observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Window root rebuilt from the chain without the crate's witness tree.
    pub fn window_root(&self, number: u64) -> B256 {
        let start = number - number % 1024;
        let end = (start + 1024).min(self.head + 1);
        let mut layer: Vec<B256> = (start..end).map(|n| self.block(n).hash).collect();
        layer.resize(1024, B256::ZERO);

        while layer.len() > 1 {
            layer = layer
                .chunks(2)
                .map(|pair| keccak256([pair[0].as_slice(), pair[1].as_slice()].concat()))
                .collect();
        }
        layer[0]
    }

    fn visible(&self, number: u64) -> Option<&BlockWithTransactions> {
        (number <= self.head)
            .then(|| self.blocks.get(number as usize))
            .flatten()
    }
}

/// Between one and five synthetic typed transactions per block.
fn transactions(number: u64) -> Vec<SignedTransaction> {
    (0..number % 5 + 1)
        .map(|index| {
            let mut encoded = vec![0x02];
            encoded.extend_from_slice(keccak256(format!("tx {number} {index}")).as_slice());
            encoded.extend_from_slice(&[0x5a; 48]);
            let encoded = Bytes::from(encoded);
            SignedTransaction {
                hash: keccak256(&encoded),
                encoded,
            }
        })
        .collect()
}

impl ChainDataSource for MockChain {
    async fn transaction_location(&self, tx_hash: B256) -> Result<TransactionLocation, SourceError> {
        if self.pending.contains(&tx_hash) {
            return Ok(TransactionLocation {
                hash: tx_hash,
                inclusion: None,
            });
        }

        self.blocks
            .iter()
            .find_map(|block| {
                block
                    .transactions
                    .iter()
                    .position(|tx| tx.hash == tx_hash)
                    .map(|index| TransactionLocation {
                        hash: tx_hash,
                        inclusion: Some(Inclusion {
                            block_hash: block.hash,
                            block_number: block.header.number,
                            index: index as u64,
                        }),
                    })
            })
            .ok_or(SourceError::TransactionNotFound(tx_hash))
    }

    async fn block_with_transactions(
        &self,
        block_hash: B256,
    ) -> Result<BlockWithTransactions, SourceError> {
        self.blocks
            .iter()
            .find(|block| block.hash == block_hash)
            .cloned()
            .ok_or(SourceError::BlockNotFound(block_hash.to_string()))
    }

    async fn block_info_by_number(&self, number: u64) -> Result<BlockInfo, SourceError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_numbers.contains(&number) {
            return Err(SourceError::Transient(format!("block {number} unavailable")));
        }
        self.visible(number)
            .map(BlockWithTransactions::info)
            .ok_or(SourceError::BlockNotFound(number.to_string()))
    }

    async fn block_info_by_hash(&self, block_hash: B256) -> Result<BlockInfo, SourceError> {
        self.blocks
            .iter()
            .find(|block| block.hash == block_hash)
            .map(BlockWithTransactions::info)
            .ok_or(SourceError::BlockNotFound(block_hash.to_string()))
    }

    async fn latest_block_info(&self) -> Result<BlockInfo, SourceError> {
        Ok(self.block(self.head).info())
    }
}
