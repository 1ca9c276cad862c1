// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::B256;

use crate::hardfork::Hardfork;

/// Errors reported by a [`ChainDataSource`](crate::ChainDataSource).
///
/// Only [`SourceError::Transient`] is worth retrying; everything else describes a
/// definite answer from the data source.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network or node failure that may succeed on a later attempt
    #[error("transient data source failure: {0}")]
    Transient(String),

    /// The data source does not know the transaction
    #[error("transaction {0} not found")]
    TransactionNotFound(B256),

    /// The data source does not know the block
    #[error("block {0} not found")]
    BlockNotFound(String),

    /// The data source answered with something that is not a valid record
    #[error("malformed response for {method}: {reason}")]
    Malformed {
        /// Method that produced the response
        method: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// A transient failure persisted through every allowed attempt
    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Operation that was retried
        operation: &'static str,
        /// Number of attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Box<SourceError>,
    },
}

impl SourceError {
    /// Returns true if repeating the request may yield a different answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Fatal errors while constructing an inclusion proof.
///
/// No variant is ever turned into a partial proof: the build aborts on the first one.
#[derive(thiserror::Error, Debug)]
pub enum ProofError {
    /// Data source failure that could not be recovered
    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    /// The transaction hash is unknown to the data source
    #[error("unknown transaction {0}")]
    UnknownTransaction(B256),

    /// The transaction exists but has not been included in a block yet
    #[error("transaction {0} is pending and has no block")]
    PendingTransaction(B256),

    /// Re-encoded header does not hash to the declared block hash
    #[error("header of block {block_number} hashes to {computed}, block declares {declared}")]
    HeaderHashMismatch {
        /// Block number
        block_number: u64,
        /// Hash declared by the data source
        declared: B256,
        /// keccak256 of the re-encoded header
        computed: B256,
    },

    /// A header field required by the block's hardfork was not reported
    #[error("header field {field} is required under {hardfork} but missing")]
    MissingHeaderField {
        /// Name of the missing field
        field: &'static str,
        /// Hardfork that requires it
        hardfork: Hardfork,
    },

    /// Rebuilt transaction trie root does not match the header
    #[error("rebuilt transactions root {computed} does not match header root {declared} in block {block_number}")]
    TransactionsRootMismatch {
        /// Block number
        block_number: u64,
        /// transactionsRoot from the header
        declared: B256,
        /// Root of the trie rebuilt from the transaction list
        computed: B256,
    },

    /// Transaction index outside the block's transaction list
    #[error("transaction index {index} out of range for block with {count} transactions")]
    TransactionIndexOutOfRange {
        /// Requested index
        index: u64,
        /// Number of transactions in the block
        count: usize,
    },

    /// Payload at the transaction's index does not hash to the requested transaction hash
    #[error("transaction at index {index} hashes to {computed}, expected {expected}")]
    TransactionHashMismatch {
        /// Index inside the block
        index: u64,
        /// Requested transaction hash
        expected: B256,
        /// keccak256 of the payload found at the index
        computed: B256,
    },

    /// The data source returned a different block than the one requested
    #[error("requested block {requested}, data source returned {returned}")]
    UnexpectedBlock {
        /// Requested block (number or hash)
        requested: String,
        /// Block that came back
        returned: String,
    },

    /// Target block lies above the chain head
    #[error("block {block_number} is above the chain head {head_number}")]
    BlockAboveHead {
        /// Target block number
        block_number: u64,
        /// Current chain head
        head_number: u64,
    },

    /// Consecutive blocks in the witness window do not link by parent hash
    #[error("block {block_number} does not link to its predecessor in the witness window")]
    WindowDiscontinuity {
        /// First block whose parent hash does not match
        block_number: u64,
    },

    /// The witness leaf at the target position is not the target block hash
    #[error("witness leaf for block {block_number} is {leaf}, expected {expected}")]
    WitnessLeafMismatch {
        /// Target block number
        block_number: u64,
        /// Leaf found in the window
        leaf: B256,
        /// Target block hash
        expected: B256,
    },

    /// Witness window holds more hashes than it has slots
    #[error("witness window holds at most {max} leaves, got {got}")]
    WindowOverflow {
        /// Number of slots
        max: usize,
        /// Number of hashes supplied
        got: usize,
    },

    /// Position outside the witness window
    #[error("leaf position {position} outside the witness window")]
    LeafOutOfRange {
        /// Requested position
        position: usize,
    },

    /// Trie builder did not retain any node for the target key
    #[error("no trie proof nodes retained for transaction index {0}")]
    EmptyTrieProof(u64),

    /// The overall deadline for the proof build elapsed
    #[error("proof build exceeded its deadline of {0:?}")]
    DeadlineExceeded(std::time::Duration),
}

/// Errors decoding a composite proof blob.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// Blob is not a valid ABI encoding of the proof tuple
    #[error("abi decoding failed: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    /// A uint256 field does not fit its in-memory type
    #[error("{field} value {value} does not fit in 64 bits")]
    ValueOutOfRange {
        /// Field name
        field: &'static str,
        /// Decoded value, as a decimal string
        value: String,
    },
}

/// Reasons a composite proof fails offline verification.
#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    /// Proof blob could not be decoded
    #[error("proof decoding failed: {0}")]
    Codec(#[from] CodecError),

    /// Header bytes do not hash to the claimed block hash
    #[error("header hashes to {computed}, witness claims {claimed}")]
    HeaderHashMismatch {
        /// claimedBlockHash from the witness
        claimed: B256,
        /// keccak256 of the header bytes
        computed: B256,
    },

    /// Header bytes are not a valid RLP header
    #[error("header is not valid rlp: {0}")]
    HeaderDecode(#[from] alloy_rlp::Error),

    /// Header block number differs from the witness block number
    #[error("header is for block {header}, witness is for block {witness}")]
    BlockNumberMismatch {
        /// Number decoded from the header
        header: u64,
        /// Number claimed by the witness
        witness: u64,
    },

    /// Trie proof does not contain a leaf for the transaction key
    #[error("trie proof does not end in a leaf for the transaction key")]
    MissingLeaf,

    /// Trie proof does not verify against the header's transactions root
    #[error("trie proof does not verify against transactions root {0}")]
    TrieProof(B256),

    /// The proven payload does not hash to the claimed transaction hash
    #[error("proven transaction hashes to {computed}, proof claims {claimed}")]
    TransactionHashMismatch {
        /// transactionHash from the proof
        claimed: B256,
        /// keccak256 of the proven payload
        computed: B256,
    },

    /// numFinal outside the range a window can hold
    #[error("numFinal {0} outside 1..=1024")]
    NumFinalOutOfRange(u64),

    /// Target block lies beyond the real leaves of its window
    #[error("block position {position} is not covered by {num_final} real leaves")]
    PositionNotFinal {
        /// Position of the block in its window
        position: usize,
        /// numFinal from the witness
        num_final: u64,
    },
}

/// Invalid hardfork activation tables.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Table has no rows
    #[error("hardfork schedule is empty")]
    Empty,

    /// First row does not activate at block 0
    #[error("first hardfork activates at block {0}, must be 0")]
    NoGenesisRow(u64),

    /// Activation blocks are not strictly increasing
    #[error("hardfork activation {next} does not come after {previous}")]
    Unordered {
        /// Activation block of the earlier row
        previous: u64,
        /// Activation block of the offending row
        next: u64,
    },
}
