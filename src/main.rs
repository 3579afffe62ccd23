// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club-Hub host
//!
//! Boots the session and club services the way the web client does and
//! exposes them through a few commands:
//!
//! ```text
//! club-hub [status|sign-in|sign-out|clubs]
//! ```

use anyhow::anyhow;
use club_hub::{
    config::Config,
    db::{DocumentStore, FirestoreDb, MemoryStore},
    error::AppError,
    services::{ClubSource, IdentityProvider, LocalIdentityProvider},
    AppContext,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();

    let config = Config::from_env()?;
    let command = std::env::args().nth(1).unwrap_or_else(|| "status".to_string());

    let store: Arc<dyn DocumentStore> = if config.offline {
        tracing::info!("Offline mode, using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FirestoreDb::new(&config.gcp_project_id).await?)
    };

    let provider: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
        config.session_file.clone(),
        config.dev_identity.clone(),
    ));

    let ctx = AppContext::bootstrap(config, provider, store).await?;

    match command.as_str() {
        "status" => print_status(&ctx),
        "sign-in" => {
            let profile = ctx.session.sign_in().await?;
            println!(
                "Signed in as {} ({})",
                profile.display_name.as_deref().unwrap_or("unnamed"),
                profile.email.as_deref().unwrap_or("no email")
            );
        }
        "sign-out" => {
            ctx.session.sign_out().await?;
            println!("Signed out");
        }
        "clubs" => {
            ctx.clubs.refresh().await;
            if ctx.clubs.source() == ClubSource::Fallback {
                println!("(showing sample clubs)");
            }
            for club in ctx.clubs.items() {
                println!(
                    "{:<32} {:<16} {}",
                    club.name,
                    club.category_label(),
                    club.created_at.format("%Y-%m-%d")
                );
            }
        }
        other => {
            ctx.session.shutdown();
            return Err(anyhow!(
                "Unknown command: {other} (usage: club-hub [status|sign-in|sign-out|clubs])"
            )
            .into());
        }
    }

    ctx.session.shutdown();
    Ok(())
}

fn print_status(ctx: &AppContext) {
    match ctx.session.profile() {
        Some(profile) => println!(
            "Signed in: {} <{}>",
            profile.display_name.as_deref().unwrap_or(&profile.uid),
            profile.email.as_deref().unwrap_or("-")
        ),
        None => println!("Signed out"),
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("club_hub=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
