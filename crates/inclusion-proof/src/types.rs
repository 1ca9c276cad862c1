// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};

/// Minimal block snapshot used for witness windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// block number
    pub number: u64,
    /// block hash
    pub hash: B256,
    /// hash of the parent block
    pub parent_hash: B256,
    /// block timestamp in seconds
    pub timestamp: u64,
}

/// Where a transaction landed, as reported by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionLocation {
    /// transaction hash
    pub hash: B256,
    /// block placement, `None` while the transaction is pending
    pub inclusion: Option<Inclusion>,
}

/// Placement of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inclusion {
    /// hash of the including block
    pub block_hash: B256,
    /// number of the including block
    pub block_number: u64,
    /// index of the transaction inside the block
    pub index: u64,
}

/// A transaction in its EIP-2718 encoding, which is also its trie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// transaction hash reported by the data source
    pub hash: B256,
    /// EIP-2718 encoded transaction
    pub encoded: Bytes,
}

impl SignedTransaction {
    /// keccak256 of the encoded transaction, which must equal [`Self::hash`].
    pub fn computed_hash(&self) -> B256 {
        keccak256(&self.encoded)
    }
}

/// Raw header fields as reported by the data source.
///
/// The optional tail holds fields introduced by later hardforks, in canonical order.
/// Which of them belong in the encoded header is decided by
/// [`encode_header`](crate::encode_header).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderFields {
    /// parent block hash
    pub parent_hash: B256,
    /// hash of the ommers list
    pub ommers_hash: B256,
    /// fee recipient
    pub beneficiary: Address,
    /// state trie root
    pub state_root: B256,
    /// transaction trie root
    pub transactions_root: B256,
    /// receipt trie root
    pub receipts_root: B256,
    /// logs bloom filter
    pub logs_bloom: Bloom,
    /// proof-of-work difficulty, zero after the merge
    pub difficulty: U256,
    /// block number
    pub number: u64,
    /// gas limit
    pub gas_limit: u64,
    /// gas used
    pub gas_used: u64,
    /// timestamp in seconds
    pub timestamp: u64,
    /// extra data
    pub extra_data: Bytes,
    /// mix hash, prev randao after the merge
    pub mix_hash: B256,
    /// proof-of-work nonce
    pub nonce: B64,
    /// london
    pub base_fee_per_gas: Option<u64>,
    /// shanghai
    pub withdrawals_root: Option<B256>,
    /// cancun
    pub blob_gas_used: Option<u64>,
    /// cancun
    pub excess_blob_gas: Option<u64>,
    /// cancun
    pub parent_beacon_block_root: Option<B256>,
    /// prague
    pub requests_hash: Option<B256>,
}

/// A block with its header fields and full transaction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockWithTransactions {
    /// block hash declared by the data source
    pub hash: B256,
    /// raw header fields
    pub header: HeaderFields,
    /// transactions in block order
    pub transactions: Vec<SignedTransaction>,
}

impl BlockWithTransactions {
    /// Block snapshot of this block.
    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            number: self.header.number,
            hash: self.hash,
            parent_hash: self.header.parent_hash,
            timestamp: self.header.timestamp,
        }
    }

    /// Encoded transactions in block order, the leaves of the transaction trie.
    pub fn encoded_transactions(&self) -> Vec<Bytes> {
        self.transactions
            .iter()
            .map(|tx| tx.encoded.clone())
            .collect()
    }
}
