use anyhow::Context;
use clap::Parser;
use ra2ed::{Editor, EditorConfig, LocalStore, PersistenceGateway, PropertySchema, statics};
use std::{path::PathBuf, sync::Arc};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = statics::EN_APP_TITLE)]
struct Args {
    /// Unit store file (.json, .json5 or .gz).
    #[arg(long, env = "RA2ED_STORE")]
    store: Option<PathBuf>,

    /// Property schema document.
    #[arg(long, env = "RA2ED_SCHEMA")]
    schema: Option<PathBuf>,

    /// Language for schema descriptions.
    #[arg(long, default_value = statics::DEFAULT_LANGUAGE)]
    lang: String,

    /// Allow renaming units that were already saved.
    #[arg(long)]
    unlock_name: bool,

    #[arg(long, env = "RA2ED_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ra2ed={},warn", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let schema = match &args.schema {
        Some(path) => PropertySchema::load_path(path)
            .with_context(|| format!("loading schema {}", path.display()))?,
        None => {
            warn!("no schema given; autocomplete will be empty");
            PropertySchema::default()
        }
    };

    let config = EditorConfig {
        lock_persisted_name: !args.unlock_name,
        schema_language: args.lang.clone(),
    };

    let mut store = LocalStore::new(schema, config.schema_language.clone());
    if let Some(path) = &args.store {
        store = store.with_path(path);
    }
    let store = Arc::new(store);
    let gateway: Arc<dyn PersistenceGateway> = store.clone();
    let editor = Editor::new(gateway, config);

    if args.store.is_some() {
        editor.open_file().await.context("opening store")?;
    } else {
        editor.start().await?;
    }
    info!(units = editor.units().len(), "{}", statics::EN_APP_TITLE);

    let input = BufReader::new(tokio::io::stdin());
    ra2ed::run_shell(&editor, &store, input, tokio::io::stdout()).await
}
