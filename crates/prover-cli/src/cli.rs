// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, Bytes, B256};
use chain_client::{MAINNET_RPC, PROOF_DEADLINE_SECS, PROOF_FETCH_CONCURRENCY, VERIFIER_ADDRESS};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an inclusion proof for a transaction and submit it to the verifier
    Prove(ProveArgs),
    /// Decode a hex encoded proof and print its fields
    Decode {
        /// ABI encoded proof, 0x-prefixed hex
        proof: Bytes,
        /// also check the proof's internal consistency
        #[clap(long)]
        check: bool,
    },
}

#[derive(Args, Debug)]
pub struct ProveArgs {
    /// hash of the transaction to prove
    pub tx_hash: B256,
    /// verify the proof offline before submitting it
    #[clap(long)]
    pub check: bool,
    /// print the proof without calling the verifier contract
    #[clap(long)]
    pub skip_verifier: bool,
    /// json-rpc endpoint, overrides MAINNET_RPC
    #[clap(long)]
    pub rpc_url: Option<String>,
    /// concurrent block reads, overrides PROOF_FETCH_CONCURRENCY
    #[clap(long)]
    pub concurrency: Option<usize>,
    /// give up after this many seconds, overrides PROOF_DEADLINE_SECS
    #[clap(long)]
    pub deadline_secs: Option<u64>,
    /// verifier contract address, overrides VERIFIER_ADDRESS
    #[clap(long)]
    pub verifier: Option<Address>,
}

impl ProveArgs {
    /// Command line settings as configuration variables.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(url) = &self.rpc_url {
            overrides.push((MAINNET_RPC, url.clone()));
        }
        if let Some(concurrency) = self.concurrency {
            overrides.push((PROOF_FETCH_CONCURRENCY, concurrency.to_string()));
        }
        if let Some(secs) = self.deadline_secs {
            overrides.push((PROOF_DEADLINE_SECS, secs.to_string()));
        }
        if let Some(verifier) = self.verifier {
            overrides.push((VERIFIER_ADDRESS, verifier.to_string()));
        }
        overrides
    }
}
