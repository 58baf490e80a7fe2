//! Pingate console
//!
//! Terminal front end for PIN rotation and PIN-confirmed transfers.

mod cli;
mod screen;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pingate_core::pin::{
    GateEffect, GateSession, PinError, RotationEffect, RotationSession, SessionSettings,
};
use pingate_gateway::HttpGateway;
use pingate_shared::types::{Money, PendingAction};
use pingate_shared::{AppConfig, AppError, AuthContext};

use crate::cli::{Commands, ConfirmArgs, PingateCli};

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pingate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = PingateCli::parse();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let auth = AuthContext::from_config(&config.auth).context("Not signed in")?;
    let gateway = Arc::new(
        HttpGateway::new(&config.gateway, Arc::new(auth))
            .context("Failed to build HTTP client")?,
    );
    info!(base_url = %config.gateway.base_url, "Authorization service configured");

    let mut settings = SessionSettings::from(&config.pin);
    if cli.manual_submit {
        settings.auto_submit = false;
    }

    let lines = BufReader::new(tokio::io::stdin()).lines();
    let outcome = match cli.command {
        Commands::Rotate => rotate(gateway, settings, lines).await,
        Commands::Confirm(args) => confirm(gateway, settings, args, lines).await,
    };
    if let Some(err) = outcome.as_ref().err().and_then(|e| e.downcast_ref::<AppError>()) {
        error!(code = err.error_code(), fatal = err.is_fatal(), "{err}");
    }
    outcome
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

/// Reads the next line, or `None` on end of input or interrupt.
async fn next_line(
    lines: &mut StdinLines,
    token: &CancellationToken,
) -> anyhow::Result<Option<String>> {
    tokio::select! {
        line = lines.next_line() => Ok(line?),
        () = token.cancelled() => Ok(None),
    }
}

async fn rotate(
    gateway: Arc<HttpGateway>,
    settings: SessionSettings,
    mut lines: StdinLines,
) -> anyhow::Result<()> {
    let mut session = RotationSession::new(gateway, settings);
    let token = session.cancellation_token();
    cancel_on_interrupt(token.clone());
    info!(session_id = %session.id(), "PIN rotation started");

    loop {
        println!("{}", screen::rotation_prompt(session.machine()));
        let Some(line) = next_line(&mut lines, &token).await? else {
            break;
        };

        for input in screen::parse_line(&line) {
            match session.handle(input).await {
                Ok(RotationEffect::Completed) => {
                    println!("{}", screen::rotation_title(session.state()));
                    return Ok(());
                }
                Ok(RotationEffect::Reauthenticate) => return Err(AppError::SessionExpired.into()),
                Ok(RotationEffect::Cancelled) => {
                    println!("{}", screen::rotation_title(session.state()));
                    return Ok(());
                }
                Ok(RotationEffect::Feedback(feedback)) => {
                    println!("{}", screen::feedback_line(&feedback));
                    break;
                }
                Ok(_) => {}
                Err(PinError::InvalidDigit(key)) => {
                    println!("(!) '{key}' is not a PIN key");
                    break;
                }
                Err(PinError::Cancelled) => break,
                Err(err) => return Err(AppError::from(err).into()),
            }
        }
    }

    debug!(
        session_id = %session.id(),
        discarded_input = !session.machine().buffer_lengths().all_empty(),
        "leaving PIN rotation"
    );
    session.close();
    println!("{}", screen::rotation_title(session.state()));
    Ok(())
}

async fn confirm(
    gateway: Arc<HttpGateway>,
    settings: SessionSettings,
    args: ConfirmArgs,
    mut lines: StdinLines,
) -> anyhow::Result<()> {
    let action = PendingAction::prepare(
        args.recipient,
        Money::new(args.amount, args.currency),
        args.description,
    )?;
    println!("Send {} to {}", action.money, action.recipient);

    let mut session = GateSession::new(gateway, action, settings);
    let token = session.cancellation_token();
    cancel_on_interrupt(token.clone());
    info!(session_id = %session.id(), "Transfer confirmation started");

    loop {
        println!(
            "{}  {}",
            screen::gate_title(session.state()),
            screen::mask(session.gate().entered_digits())
        );
        let Some(line) = next_line(&mut lines, &token).await? else {
            break;
        };

        for input in screen::parse_line(&line) {
            match session.handle(input).await {
                Ok(GateEffect::Executed { .. } | GateEffect::Cancelled) => {
                    println!("{}", screen::gate_title(session.state()));
                    return Ok(());
                }
                Ok(GateEffect::Failed(feedback)) => {
                    println!("{}", screen::feedback_line(&feedback));
                    return Err(AppError::Rejected(feedback.message).into());
                }
                Ok(GateEffect::Reauthenticate) => return Err(AppError::SessionExpired.into()),
                Ok(_) => {}
                Err(PinError::InvalidDigit(key)) => {
                    println!("(!) '{key}' is not a PIN key");
                    break;
                }
                Err(PinError::Cancelled) => break,
                Err(err) => return Err(AppError::from(err).into()),
            }
        }
    }

    session.close();
    println!("{}", screen::gate_title(session.state()));
    Ok(())
}
