// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::process::ExitCode;

use alloy_primitives::Bytes;
use chain_client::{ClientConfig, JsonRpcClient, RetryingSource};
use clap::Parser;
use inclusion_proof::{verify_proof, BuilderConfig, CompositeProof, HardforkSchedule, ProofBuilder};
use tracing::{error, info, level_filters::LevelFilter, subscriber::set_global_default};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{
    cli::{Cli, Commands, ProveArgs},
    report::ProofReport,
    verifier::{check_on_chain, VerifierOutcome},
};

mod cli;
mod report;
mod verifier;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    if let Err(e) = run().await {
        error!("Prover error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .pretty()
        .finish();
    set_global_default(subscriber).expect(
        "Failed to set up the global default subscriber for logging. Please check if the RUST_LOG environment variable is set correctly.",
    );
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Prove(args) => prove(args).await,
        Commands::Decode { proof, check } => {
            let decoded = CompositeProof::decode(&proof)?;
            println!("{}", ProofReport(&decoded));
            if check {
                check_offline(&decoded)?;
            }
            Ok(())
        }
    }
}

async fn prove(args: ProveArgs) -> anyhow::Result<()> {
    let config = ClientConfig::from_env_with_overrides(&args.overrides())?;
    let client = JsonRpcClient::connect(&config.rpc_url).await?;
    let builder = ProofBuilder::new(
        RetryingSource::new(client, config.retry),
        BuilderConfig {
            schedule: HardforkSchedule::mainnet(),
            concurrency: config.concurrency,
            deadline: config.deadline,
        },
    );

    let proof = builder.build_proof(args.tx_hash).await?;
    let blob: Bytes = proof.encode();
    println!("Transaction: {} proof:", args.tx_hash);
    println!("{blob}");

    if args.check {
        check_offline(&proof)?;
    }
    if args.skip_verifier {
        return Ok(());
    }

    let client = builder.source().inner();
    match check_on_chain(client, config.verifier_address, &blob).await? {
        VerifierOutcome::Returned { valid } => println!("Proof is valid: {valid}"),
        VerifierOutcome::Rejected { reason } => {
            info!(%reason, "verifier reverted");
            println!("Proof is invalid");
        }
    }
    Ok(())
}

fn check_offline(proof: &CompositeProof) -> anyhow::Result<()> {
    let verified = verify_proof(proof)?;
    info!(
        block_number = verified.block_number,
        window_root = %verified.window_root,
        transactions_root = %verified.transactions_root,
        "proof is internally consistent"
    );
    Ok(())
}
