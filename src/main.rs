#![allow(missing_docs)]

//! Sifter — WhatsApp recruiting bot binary.
//!
//! Wires the conversation engine, session store, campaign initiator, and
//! admin HTTP surface together around a WhatsApp bridge sidecar.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use sifter::api::{self, AppState};
use sifter::campaign::Campaign;
use sifter::candidates::SqliteCandidateSink;
use sifter::companion::CompanionProbe;
use sifter::config::SifterConfig;
use sifter::engine::dispatch::Dispatcher;
use sifter::engine::strategy::{LlmStrategy, ScriptedStrategy};
use sifter::engine::ConversationEngine;
use sifter::flow::Flow;
use sifter::logging;
use sifter::notify::AdminNotifier;
use sifter::providers::mistral::MistralProvider;
use sifter::providers::CompletionProvider;
use sifter::settings::{BotSettings, SettingsHandle};
use sifter::store::{open_db, SessionStore};
use sifter::whatsapp::client::{write_qr_png, BridgeClient};
use sifter::whatsapp::events::{BridgeEvent, EventListener};

#[derive(Parser)]
#[command(name = "sifter", about = "WhatsApp recruiting bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the bot: event loop plus admin HTTP surface.
    Start,
    /// Seed a campaign batch from a file of phone numbers, one per line.
    Seed {
        /// Path to the numbers file.
        #[arg(long)]
        file: String,
    },
    /// Print bridge and companion status and exit.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = SifterConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Start => {
            let _guard = logging::init_service(Path::new(&config.paths.logs_dir))
                .context("failed to initialize logging")?;
            run(config).await
        }
        Command::Seed { file } => {
            logging::init_cli();
            seed(config, &file).await
        }
        Command::Status => {
            logging::init_cli();
            status(config).await
        }
    }
}

/// Assemble every component and run until Ctrl-C.
async fn run(config: SifterConfig) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "sifter starting");

    let flow = Arc::new(load_flow(&config)?);
    info!(steps = flow.len(), "flow loaded");

    let db = open_db(&config.paths.db)
        .await
        .with_context(|| format!("failed to open database at {}", config.paths.db))?;
    let store = SessionStore::init(db.clone())
        .await
        .context("failed to initialize session store")?;
    let candidates = Arc::new(
        SqliteCandidateSink::init(db)
            .await
            .context("failed to initialize candidate store")?,
    );

    let bridge = BridgeClient::new(config.bridge.base_url.clone());
    if let Err(e) = bridge.wait_healthy().await {
        warn!(error = %e, "bridge not connected yet, fetching pairing QR");
        match bridge.save_qr_png(Path::new(&config.bridge.qr_path)).await {
            Ok(()) => info!(path = %config.bridge.qr_path, "scan the QR to link WhatsApp"),
            Err(e) => warn!(error = %e, "no pairing QR available"),
        }
    }

    let settings = Arc::new(SettingsHandle::new(BotSettings::from_config(&config)));
    let outbound: Arc<dyn sifter::whatsapp::Outbound> = Arc::new(bridge.clone());
    let notifier = AdminNotifier::new(Arc::clone(&outbound));

    let engine = Arc::new(ConversationEngine::new(
        Arc::clone(&flow),
        store.clone(),
        candidates.clone() as Arc<dyn sifter::candidates::CandidateSink>,
    ));
    let llm = config.llm.mistral.as_ref().map(|m| {
        let provider: Arc<dyn CompletionProvider> =
            Arc::new(MistralProvider::new(m.api_key.clone(), m.model.clone()));
        LlmStrategy::new(provider, store.clone(), config.bot.system_prompt.clone())
    });
    if config.bot.ai_mode && llm.is_none() {
        warn!("AI mode enabled but no LLM provider configured; messages will escalate");
    }
    let dispatcher = Arc::new(Dispatcher::new(
        ScriptedStrategy::new(engine),
        llm,
        Arc::clone(&settings),
        Arc::clone(&outbound),
        notifier,
    ));

    let campaign = Arc::new(Campaign::new(
        Arc::clone(&outbound),
        store.clone(),
        Arc::clone(&settings),
    ));
    let companion = CompanionProbe::new(config.companion.base_url.clone());

    // Admin HTTP surface.
    let router = api::create_router(AppState {
        store: store.clone(),
        candidates: candidates as Arc<dyn sifter::candidates::CandidateSink>,
        settings: Arc::clone(&settings),
        notifier: Arc::new(AdminNotifier::new(Arc::clone(&outbound))),
        campaign,
        bridge: bridge.clone(),
        companion,
    });
    let listener = tokio::net::TcpListener::bind(&config.http.bind)
        .await
        .with_context(|| format!("failed to bind admin API to {}", config.http.bind))?;
    info!(bind = %config.http.bind, "admin API listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "admin API server stopped");
        }
    });

    // Inbound event loop.
    let (event_tx, mut event_rx) = mpsc::channel::<BridgeEvent>(256);
    let listener_handle = EventListener::spawn(&config.bridge.base_url, event_tx);

    info!("sifter running, press Ctrl-C to stop");
    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else {
                    warn!("event channel closed");
                    break;
                };
                match event {
                    BridgeEvent::Message { jid, text, from_me, id } => {
                        // Own outbound messages echo back; never feed them
                        // into the flow.
                        if from_me {
                            continue;
                        }
                        debug!(jid, message_id = ?id, "inbound message");
                        let dispatcher = Arc::clone(&dispatcher);
                        tokio::spawn(async move {
                            dispatcher.dispatch(&jid, &text).await;
                        });
                    }
                    BridgeEvent::Qr { data } => {
                        let path = Path::new(&config.bridge.qr_path);
                        match write_qr_png(&data, path).await {
                            Ok(()) => {
                                info!(path = %config.bridge.qr_path, "pairing QR refreshed, scan to link");
                            }
                            Err(e) => warn!(error = %e, "failed to save pairing QR"),
                        }
                    }
                    BridgeEvent::Connected => info!("WhatsApp connected"),
                    BridgeEvent::Disconnected { reason } => {
                        warn!(?reason, "WhatsApp disconnected");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    listener_handle.abort();
    info!("sifter stopped");
    Ok(())
}

/// Seed a campaign batch from a newline-delimited numbers file.
async fn seed(config: SifterConfig, file: &str) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read numbers file {file}"))?;
    let numbers: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    if numbers.is_empty() {
        anyhow::bail!("no numbers found in {file}");
    }

    let db = open_db(&config.paths.db).await.context("failed to open database")?;
    let store = SessionStore::init(db)
        .await
        .context("failed to initialize session store")?;

    let bridge = BridgeClient::new(config.bridge.base_url.clone());
    bridge
        .wait_healthy()
        .await
        .context("bridge is not connected; start the sidecar and link WhatsApp first")?;

    let settings = Arc::new(SettingsHandle::new(BotSettings::from_config(&config)));
    let campaign = Campaign::new(Arc::new(bridge), store, settings);

    let report = campaign.seed(&numbers).await;
    println!(
        "attempted {} / seeded {} / failed {}",
        report.attempted, report.seeded, report.failed
    );
    Ok(())
}

/// One-shot status check against the bridge and companion.
async fn status(config: SifterConfig) -> Result<()> {
    let bridge = BridgeClient::new(config.bridge.base_url.clone());
    match bridge.status().await {
        Ok(s) => println!(
            "bridge: connected={} phone={}",
            s.connected,
            s.phone_number.as_deref().unwrap_or("-")
        ),
        Err(e) => println!("bridge: unreachable ({e})"),
    }

    let companion = CompanionProbe::new(config.companion.base_url.clone());
    println!(
        "companion: {}",
        if companion.ping().await { "alive" } else { "down" }
    );
    Ok(())
}

/// Load the flow from the configured path, or fall back to the default.
fn load_flow(config: &SifterConfig) -> Result<Flow> {
    match &config.paths.flow {
        Some(path) => {
            Flow::load(Path::new(path)).with_context(|| format!("failed to load flow from {path}"))
        }
        None => Ok(Flow::default_screening()),
    }
}
