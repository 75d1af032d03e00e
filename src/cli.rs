use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use apiprobe::auth::TokenRelay;
use apiprobe::catalog::{TEMPLATE_FILE, definition_template, load_catalog};
use apiprobe::config::{Config, ExecutorKind, LoadedConfig};
use apiprobe::http::{CurlClient, ExecutionLimits, HttpDelegate, NativeClient};
use apiprobe::query::JqQuery;
use apiprobe::report::{NotificationContext, WebexNotifier, notify};
use apiprobe::runner::{Executor, PlanOptions, RunReporter, build_plan};
use apiprobe::secrets::{
    FileSecretStore, SecretResolver, SecretStore, new_hex_id, obfuscate, seed_from_csv,
};
use apiprobe::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Replay API request definitions and report response drift", long_about = None)]
pub struct Cli {
    /// Name of this run, shown in the report notification.
    /// Example: --name "Environment: PROD"
    #[arg(long, default_value = "")]
    pub name: String,

    /// Run only the definition with this ten-character hex id.
    /// Example: --id "ff00fceb61"
    #[arg(long, default_value = "")]
    pub id: String,

    /// Comma-separated tags selecting the definitions to run.
    /// Example: --tags "reqres, booker"
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Comma-separated ids to leave out; wins over --id and --tags.
    /// Example: --exclude "bb5599abcd, ff00fceb61"
    #[arg(long, default_value = "")]
    pub exclude: String,

    /// Print a fresh ten-character hex id for a new definition
    #[arg(long)]
    pub new_id: bool,

    /// Write a definition template with a fresh id into the input directory
    #[arg(long)]
    pub new_file: bool,

    /// Store a secret and print its "<secret-HASH>" placeholder
    #[arg(long, value_name = "TEXT")]
    pub add_secret: Option<String>,

    /// Config file (default: apiprobe.toml in the current directory or a parent)
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

pub async fn run(cli: Cli, loaded: LoadedConfig) -> Result<()> {
    let LoadedConfig {
        mut config,
        path: config_path,
    } = loaded;

    if cli.new_id {
        println!("Use this ID \"{}\" in your JSON file, key \"id\".", new_hex_id());
        return Ok(());
    }

    if cli.new_file {
        return write_template(&config);
    }

    let store = FileSecretStore::new(&config.secrets.store_file);

    if let Some(secret) = cli.add_secret.as_deref() {
        return add_secret(&store, secret);
    }

    seed_from_csv(&store, &config.secrets.seed_file).context("Failed to seed the secret store")?;

    let catalog = load_catalog(&config.input_dir).context("Failed to load request definitions")?;
    let options = PlanOptions {
        id: &cli.id,
        tags: &cli.tags,
        exclude: &cli.exclude,
    };
    let Some(plan) = build_plan(&catalog, options, &store)? else {
        return Ok(());
    };

    let (shutdown_tx, mut shutdown_rx) = shutdown_channel();
    let signal_handler = setup_signal_shutdown_handler(&shutdown_tx);

    let executor = Executor::new(
        http_delegate(&config)?,
        Box::new(JqQuery::new(&config.executor.jq_path)),
        &config.output_dir,
    );
    let mut relay = TokenRelay::new();
    let outcome = executor.execute_all(&plan, &mut relay, &mut shutdown_rx).await;

    drop(shutdown_tx.send(()));
    signal_handler.abort();

    RunReporter::print_summary(&outcome);

    let notifier = WebexNotifier::new()?;
    let secrets = SecretResolver::new(&store);
    let ctx = NotificationContext {
        config: &mut config,
        config_path: config_path.as_deref(),
        secrets: &secrets,
        notifier: &notifier,
        run_name: &cli.name,
        interrupted: outcome.cancelled,
    };
    let delivered = notify(ctx, &outcome.result, &outcome.report).await;
    info!("Notification delivered: {:?}", delivered);

    Ok(())
}

fn http_delegate(config: &Config) -> Result<Box<dyn HttpDelegate>> {
    let limits = ExecutionLimits::from(&config.executor);
    Ok(match config.executor.kind {
        ExecutorKind::Curl => Box::new(CurlClient::new(
            &config.executor.curl_path,
            limits,
            config.debug_mode,
        )),
        ExecutorKind::Native => Box::new(NativeClient::new(limits)?),
    })
}

fn write_template(config: &Config) -> Result<()> {
    let path = config.input_dir.join(TEMPLATE_FILE);
    if path.exists() {
        warn!("Overwriting existing template \"{}\"", path.display());
    }

    fs::create_dir_all(&config.input_dir).with_context(|| {
        format!("Failed to create input directory \"{}\"", config.input_dir.display())
    })?;
    fs::write(&path, definition_template(&new_hex_id())?)
        .with_context(|| format!("Failed to write file \"{}\"", path.display()))?;

    println!("Template written to \"{}\"", path.display());
    Ok(())
}

fn add_secret(store: &dyn SecretStore, secret: &str) -> Result<()> {
    let hash = new_hex_id();

    let count_before = store.count()?;
    store.insert(&hash, &obfuscate(secret))?;
    let count_after = store.count()?;

    println!(
        "{} ==> {}\nUse this placeholder \"<secret-{}>\" in your JSON file instead of the actual secret value.",
        count_before, count_after, hash
    );
    Ok(())
}
