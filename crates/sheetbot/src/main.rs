use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio::signal;

use sheetbot::cli::{Cli, Commands};
use sheetbot::config as bot_config;
use sheetbot::features::bus::LtaClient;
use sheetbot::telegram::{create_bot, run_webhook_server, schema, TelegramSender, WebhookState};
use sheetbot::{build_tree, BotApp, FeatureDeps};
use sheetcore::config;
use sheetcore::feature::FeatureKind;
use sheetcore::logging::init_logger;
use sheetcore::{CommandStateStore, Feature, FeatureTree, MemoryBackend, SheetBackend, SqliteBackend};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH, &config::LOG_LEVEL)?;

    match cli.command_or_default() {
        Commands::Run { webhook, memory } => run_bot(webhook, memory).await,
        Commands::Tree => print_tree(),
        Commands::State { user_id, clear } => inspect_state(user_id, clear),
    }
}

fn open_backend(memory: bool) -> Result<Arc<dyn SheetBackend>> {
    if memory {
        log::warn!("Using in-memory sheets, nothing survives a restart");
        return Ok(Arc::new(MemoryBackend::new()));
    }
    log::info!("Opening sheets at {}", config::DATABASE_PATH.as_str());
    Ok(Arc::new(SqliteBackend::open(&config::DATABASE_PATH)?))
}

fn build_features(backend: Arc<dyn SheetBackend>) -> Result<FeatureTree> {
    let deps = FeatureDeps::new(backend, Arc::new(LtaClient::from_env()?));
    Ok(build_tree(deps)?)
}

async fn run_bot(webhook: bool, memory: bool) -> Result<()> {
    let backend = open_backend(memory)?;
    let tree = Arc::new(build_features(backend.clone())?);

    let bot = create_bot()?;
    let app = BotApp::new(tree, backend, Arc::new(TelegramSender::new(bot.clone())));

    if webhook {
        if let Some(public_url) = bot_config::WEBHOOK_URL.as_deref() {
            let url = url::Url::parse(public_url).map_err(|e| anyhow::anyhow!("Invalid WEBHOOK_URL: {}", e))?;
            let mut request = bot.set_webhook(url);
            if let Some(secret) = bot_config::WEBHOOK_SECRET.as_deref() {
                request = request.secret_token(secret.to_string());
            }
            request.await?;
            log::info!("Webhook registered at {}", public_url);
        } else {
            log::warn!("WEBHOOK_URL is not set, assuming the webhook is registered elsewhere");
        }

        let state = WebhookState {
            app,
            secret: (*bot_config::WEBHOOK_SECRET).clone(),
        };
        tokio::select! {
            result = run_webhook_server(&bot_config::WEBHOOK_ADDR, state) => result?,
            _ = signal::ctrl_c() => {
                log::info!("Shutting down gracefully...");
                bot.delete_webhook().await?;
            },
        }
    } else {
        // polling fails while a webhook is registered
        bot.delete_webhook().await?;
        log::info!("Starting bot in long polling mode");
        Dispatcher::builder(bot, schema(app))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
        log::info!("Dispatcher shutdown gracefully");
    }

    Ok(())
}

fn print_tree() -> Result<()> {
    fn walk(features: &[Feature], depth: usize) {
        for feature in features {
            let indent = "  ".repeat(depth);
            match &feature.kind {
                FeatureKind::Leaf { help, .. } => {
                    println!("{}{:<12} {}  [{}]", indent, feature.command_word, feature.description, help)
                }
                FeatureKind::Branch { sub_features } => {
                    println!("{}{:<12} {}", indent, feature.command_word, feature.description);
                    walk(sub_features, depth + 1);
                }
            }
        }
    }

    let tree = build_features(Arc::new(MemoryBackend::new()))?;
    walk(tree.roots(), 0);
    Ok(())
}

fn inspect_state(user_id: i64, clear: bool) -> Result<()> {
    let states = CommandStateStore::new(open_backend(false)?);
    if clear {
        states.clear(user_id)?;
        println!("Cleared continuation for user {}", user_id);
        return Ok(());
    }
    match states.get(user_id)? {
        Some(command) => println!("/{}", command),
        None => println!("No continuation for user {}", user_id),
    }
    Ok(())
}
