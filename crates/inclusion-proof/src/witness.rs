// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{keccak256, B256};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::{
    error::ProofError,
    source::ChainDataSource,
    types::BlockInfo,
};

/// Number of leaf slots in a witness window.
pub const WINDOW_SIZE: usize = 1024;

/// Depth of the witness tree, `log2(WINDOW_SIZE)`.
pub const WITNESS_DEPTH: usize = 10;

/// Leaf value for window slots whose block has not been mined yet.
pub const SENTINEL_LEAF: B256 = B256::ZERO;

/// `numFinal` of a window whose every slot holds a real block hash.
///
/// A window with no sentinel leaf reports its full size here, never zero.
pub const FULL_WINDOW_NUM_FINAL: u64 = WINDOW_SIZE as u64;

/// First block number of the window containing `block_number`.
pub const fn window_start(block_number: u64) -> u64 {
    block_number - block_number % WINDOW_SIZE as u64
}

/// Position of `block_number` inside its window.
pub const fn window_position(block_number: u64) -> usize {
    (block_number % WINDOW_SIZE as u64) as usize
}

/// Parent of two witness tree nodes: `keccak256(left ‖ right)`.
///
/// The order is positional and part of the proof format: siblings are never sorted.
pub fn hash_pair(left: B256, right: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// Folds a leaf up a sibling path to the root of its tree.
///
/// At each level the running hash is the left child when the position bit is clear.
pub fn fold_witness_path(leaf: B256, position: usize, siblings: &[B256]) -> B256 {
    siblings
        .iter()
        .enumerate()
        .fold(leaf, |node, (level, sibling)| {
            if (position >> level) & 1 == 0 {
                hash_pair(node, *sibling)
            } else {
                hash_pair(*sibling, node)
            }
        })
}

/// Complete binary Merkle tree over one padded witness window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessTree {
    // layers[0] holds the leaves, the last layer holds only the root
    layers: Vec<Vec<B256>>,
    real_leaves: usize,
}

impl WitnessTree {
    /// Builds the tree from the real block hashes of a window, in ascending block order.
    ///
    /// Remaining slots are filled with [`SENTINEL_LEAF`].
    pub fn new(block_hashes: &[B256]) -> Result<Self, ProofError> {
        if block_hashes.len() > WINDOW_SIZE {
            return Err(ProofError::WindowOverflow {
                max: WINDOW_SIZE,
                got: block_hashes.len(),
            });
        }

        let mut leaves = block_hashes.to_vec();
        leaves.resize(WINDOW_SIZE, SENTINEL_LEAF);

        let mut layers = Vec::with_capacity(WITNESS_DEPTH + 1);
        layers.push(leaves);
        for _ in 0..WITNESS_DEPTH {
            let next = layers[layers.len() - 1]
                .chunks_exact(2)
                .map(|pair| hash_pair(pair[0], pair[1]))
                .collect();
            layers.push(next);
        }

        Ok(Self {
            layers,
            real_leaves: block_hashes.len(),
        })
    }

    /// Root of the window.
    pub fn root(&self) -> B256 {
        self.layers[WITNESS_DEPTH][0]
    }

    /// Leaf at `position`, sentinel slots included.
    pub fn leaf(&self, position: usize) -> Option<B256> {
        self.layers[0].get(position).copied()
    }

    /// Number of real, non-sentinel leaves.
    pub fn real_leaves(&self) -> usize {
        self.real_leaves
    }

    /// `numFinal` of the window: its real leaf count.
    pub fn num_final(&self) -> u64 {
        if self.real_leaves == WINDOW_SIZE {
            FULL_WINDOW_NUM_FINAL
        } else {
            self.real_leaves as u64
        }
    }

    /// Sibling hashes from the leaf at `position` up to the root, bottom first.
    pub fn proof(&self, position: usize) -> Result<[B256; WITNESS_DEPTH], ProofError> {
        if position >= WINDOW_SIZE {
            return Err(ProofError::LeafOutOfRange { position });
        }

        let mut siblings = [B256::ZERO; WITNESS_DEPTH];
        let mut idx = position;
        for (level, sibling) in siblings.iter_mut().enumerate() {
            *sibling = self.layers[level][idx ^ 1];
            idx >>= 1;
        }
        Ok(siblings)
    }
}

/// Places a block hash inside its 1024-block window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxiomWitness {
    /// number of the proven block
    pub block_number: u64,
    /// hash of the proven block, the leaf at `block_number mod 1024`
    pub claimed_block_hash: B256,
    /// hash of the block just before the window, zero for the first window
    pub prev_hash: B256,
    /// number of real leaves in the window
    pub num_final: u64,
    /// sibling path from the leaf to the window root, bottom first
    pub merkle_proof: [B256; WITNESS_DEPTH],
}

impl AxiomWitness {
    /// Position of the proven block inside its window.
    pub fn position(&self) -> usize {
        window_position(self.block_number)
    }

    /// Window root implied by the claimed hash and the sibling path.
    pub fn window_root(&self) -> B256 {
        fold_witness_path(self.claimed_block_hash, self.position(), &self.merkle_proof)
    }
}

/// Fetches a witness window from a data source and builds the witness for one block.
#[derive(Debug)]
pub struct WitnessBuilder<'a, S> {
    source: &'a S,
    concurrency: usize,
}

impl<'a, S: ChainDataSource> WitnessBuilder<'a, S> {
    /// Creates a builder issuing at most `concurrency` reads at a time.
    pub fn new(source: &'a S, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Builds the witness of `target_hash` in the window visible from `head`.
    ///
    /// Blocks above the head are sentinel leaves. The fetched window is checked to be
    /// one hash-linked chain segment ending at `prevHash`.
    pub async fn build_witness(
        &self,
        head: &BlockInfo,
        target_hash: B256,
    ) -> Result<AxiomWitness, ProofError> {
        let target = self.source.block_info_by_hash(target_hash).await?;
        if target.hash != target_hash {
            return Err(ProofError::UnexpectedBlock {
                requested: target_hash.to_string(),
                returned: target.hash.to_string(),
            });
        }
        if target.number > head.number {
            return Err(ProofError::BlockAboveHead {
                block_number: target.number,
                head_number: head.number,
            });
        }

        let start = window_start(target.number);
        let end = (start + WINDOW_SIZE as u64).min(head.number + 1);
        debug!(
            block_number = target.number,
            window_start = start,
            window_end = end,
            "fetching witness window"
        );

        // the predecessor of the window is fetched in the same stream
        let first = start.saturating_sub(1);
        let mut blocks: Vec<BlockInfo> = stream::iter(first..end)
            .map(|number| self.fetch_block(number))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let prev_hash = if start == 0 {
            SENTINEL_LEAF
        } else {
            blocks.remove(0).hash
        };

        check_continuity(&blocks, start, prev_hash)?;

        let hashes: Vec<B256> = blocks.iter().map(|block| block.hash).collect();
        let tree = WitnessTree::new(&hashes)?;
        let position = window_position(target.number);

        let leaf = tree
            .leaf(position)
            .ok_or(ProofError::LeafOutOfRange { position })?;
        if leaf != target.hash {
            return Err(ProofError::WitnessLeafMismatch {
                block_number: target.number,
                leaf,
                expected: target.hash,
            });
        }

        let witness = AxiomWitness {
            block_number: target.number,
            claimed_block_hash: target.hash,
            prev_hash,
            num_final: tree.num_final(),
            merkle_proof: tree.proof(position)?,
        };

        info!(
            block_number = target.number,
            num_final = witness.num_final,
            window_root = %tree.root(),
            "built witness"
        );

        Ok(witness)
    }

    async fn fetch_block(&self, number: u64) -> Result<BlockInfo, ProofError> {
        let block = self.source.block_info_by_number(number).await?;
        if block.number != number {
            return Err(ProofError::UnexpectedBlock {
                requested: number.to_string(),
                returned: block.number.to_string(),
            });
        }
        Ok(block)
    }
}

/// Checks that `blocks` start at `start`, link to `prev_hash` and to each other.
///
/// The genesis window has no predecessor, so its first block is not linked.
fn check_continuity(blocks: &[BlockInfo], start: u64, prev_hash: B256) -> Result<(), ProofError> {
    if let Some(first) = blocks.first() {
        if start > 0 && first.parent_hash != prev_hash {
            return Err(ProofError::WindowDiscontinuity {
                block_number: first.number,
            });
        }
    }

    match blocks
        .windows(2)
        .find(|pair| pair[1].parent_hash != pair[0].hash)
    {
        Some(pair) => Err(ProofError::WindowDiscontinuity {
            block_number: pair[1].number,
        }),
        None => Ok(()),
    }
}
