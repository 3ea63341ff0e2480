//! Command line client for sponsor pools: connect a wallet, list the pools
//! a registry knows about, inspect one, and mint or redeem claims.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

use std::future::Future;
use std::io;
use std::process::ExitCode;

use clap::Parser;
use eyre::Result;
use futures::{stream, Stream, StreamExt};
use tracing::{info, warn};

use sponsor_base::{settings::Settings, InstanceDisplay, SponsorClient, TxStatus};
use sponsor_core::{InstanceState, SponsorError, SponsorResult};

use crate::cli::{Cli, Command};

mod cli;
mod render;

const AGENT_NAME: &str = "cli";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let args = Cli::parse();
    let settings = Settings::load(AGENT_NAME)?;
    settings.tracing.start_tracing()?;
    let client = settings.build_client()?;

    let outcome = run(&client, args.command, args.json).await;
    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.status_message());
            ExitCode::FAILURE
        }
    })
}

async fn run(client: &SponsorClient, command: Command, json: bool) -> SponsorResult<()> {
    let account = client.connect().await?;
    info!(%account, "Using account");

    match command {
        Command::Connect => println!("{}", client.connector().state()),
        Command::List => {
            let entries = client.list_instances().await?;
            render::listing(&entries, json)?;
        }
        Command::Show { instance } => {
            let result = client.show_instance(&instance).await;
            render::instance(&InstanceDisplay::from_result(&result), json)?;
            result?;
        }
        Command::Mint { instance, amount } => {
            let action = client.mint(&instance, &amount);
            let result = until_interrupted(client, action, ctrl_c()).await;
            show_transaction(client, result, json)?;
        }
        Command::Redeem { instance, amount } => {
            let action = client.redeem(&instance, &amount);
            let result = until_interrupted(client, action, ctrl_c()).await;
            show_transaction(client, result, json)?;
        }
    }
    Ok(())
}

/// Every Ctrl-C received from now on.
fn ctrl_c() -> impl Stream<Item = io::Result<()>> {
    stream::unfold((), |()| async { Some((tokio::signal::ctrl_c().await, ())) })
}

/// Drive `action` to completion. An interrupt stops waiting for confirmation
/// instead of killing the process, so the transaction hash is still shown.
/// If nothing is watched yet, the watch is stopped as soon as it starts. A
/// second interrupt abandons the action.
async fn until_interrupted<T>(
    client: &SponsorClient,
    action: impl Future<Output = SponsorResult<T>>,
    interrupts: impl Stream<Item = io::Result<()>>,
) -> SponsorResult<T> {
    tokio::pin!(action);
    let interrupts = interrupts.fuse();
    tokio::pin!(interrupts);
    let mut status = client.subscribe_status();
    let mut stopping = false;

    loop {
        tokio::select! {
            result = &mut action => return result,
            Some(interrupt) = interrupts.next() => {
                interrupt.map_err(|e| SponsorError::InvalidConfiguration(e.to_string()))?;
                if stopping {
                    warn!("Interrupted again, abandoning the action");
                    return Err(SponsorError::Interrupted);
                }
                stopping = true;
                stop_watching(client);
            }
            Ok(()) = status.changed(), if stopping => stop_watching(client),
        }
    }
}

fn stop_watching(client: &SponsorClient) {
    if let TxStatus::Pending(hash) = client.status() {
        eprintln!("Pending {hash:?}");
    }
    if !client.cancel_pending() {
        info!("No transaction is being watched yet; stopping once one is submitted");
    }
}

/// What to show for a finished transaction action. A confirmed transaction
/// is shown even when the state read afterwards failed.
fn transaction_display(
    status: &TxStatus,
    result: &SponsorResult<InstanceState>,
) -> Option<InstanceDisplay> {
    match (status, result) {
        (_, Ok(_)) | (TxStatus::Confirmed(_), Err(_)) => Some(InstanceDisplay::from_result(result)),
        _ => None,
    }
}

fn show_transaction(
    client: &SponsorClient,
    result: SponsorResult<InstanceState>,
    json: bool,
) -> SponsorResult<()> {
    let status = client.status();
    if let Some(display) = transaction_display(&status, &result) {
        println!("{status}");
        render::instance(&display, json)?;
    }
    result.map(drop)
}
