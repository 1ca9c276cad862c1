// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use inclusion_proof::CompositeProof;

/// Renders a decoded proof field by field, using the ABI field names.
pub struct ProofReport<'a>(pub &'a CompositeProof);

impl fmt::Display for ProofReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let proof = self.0;
        let witness = &proof.witness;

        writeln!(f, "blockNumber: {}", witness.block_number)?;
        writeln!(f, "claimedBlockHash: {}", witness.claimed_block_hash)?;
        writeln!(f, "prevHash: {}", witness.prev_hash)?;
        writeln!(f, "numFinal: {}", witness.num_final)?;
        writeln!(f, "merkleProof:")?;
        for (level, sibling) in witness.merkle_proof.iter().enumerate() {
            writeln!(f, "  [{level}] {sibling}")?;
        }
        writeln!(f, "header: {}", proof.header)?;
        writeln!(f, "encodedTrieProof: {} nodes", proof.trie_proof.len())?;
        for (index, node) in proof.trie_proof.iter().enumerate() {
            writeln!(f, "  [{index}] {node}")?;
        }
        writeln!(f, "transactionKey: {}", proof.transaction_key)?;
        write!(f, "transactionHash: {}", proof.transaction_hash)
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use alloy_primitives::{Bytes, B256};
    use inclusion_proof::{AxiomWitness, WITNESS_DEPTH};

    use super::*;

    fn proof() -> CompositeProof {
        let mut merkle_proof = [B256::ZERO; WITNESS_DEPTH];
        merkle_proof[9] = B256::with_last_byte(9);
        CompositeProof {
            witness: AxiomWitness {
                block_number: 46_147,
                claimed_block_hash: B256::repeat_byte(0x11),
                prev_hash: B256::repeat_byte(0x22),
                num_final: 1024,
                merkle_proof,
            },
            header: Bytes::from_static(&[0xf9, 0x02, 0x17]),
            trie_proof: vec![Bytes::from_static(&[0xc1, 0x80])],
            transaction_key: Bytes::from_static(&[0x80]),
            transaction_hash: B256::repeat_byte(0x33),
        }
    }

    /// Accepts `room` bytes, then fails.
    struct Bounded {
        room: usize,
    }

    impl Write for Bounded {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.room = self.room.checked_sub(s.len()).ok_or(fmt::Error)?;
            Ok(())
        }
    }

    #[test]
    fn test_report() {
        let proof = proof();
        let report = ProofReport(&proof).to_string();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "blockNumber: 46147");
        assert_eq!(lines[1], format!("claimedBlockHash: 0x{}", "11".repeat(32)));
        assert_eq!(lines[3], "numFinal: 1024");
        assert_eq!(lines[4], "merkleProof:");
        assert_eq!(lines[14], format!("  [9] 0x{}09", "00".repeat(31)));
        assert_eq!(lines[15], "header: 0xf90217");
        assert_eq!(lines[16], "encodedTrieProof: 1 nodes");
        assert_eq!(lines[17], "  [0] 0xc180");
        assert_eq!(lines[18], "transactionKey: 0x80");
        assert_eq!(lines[19], format!("transactionHash: 0x{}", "33".repeat(32)));
    }

    #[test]
    fn test_write_errors_reach_the_caller() {
        let proof = proof();
        let mut sink = Bounded { room: 64 };
        assert!(write!(sink, "{}", ProofReport(&proof)).is_err());

        let mut sink = Bounded { room: 4096 };
        assert!(write!(sink, "{}", ProofReport(&proof)).is_ok());
    }
}
