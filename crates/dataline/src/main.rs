// SPDX-FileCopyrightText: 2026 Dataline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dataline - ask questions of tabular data in plain language.
//!
//! This is the binary entry point: config loading, tracing setup, and
//! wiring of the production collaborators into the pipeline.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use dataline_anthropic::AnthropicTranslator;
use dataline_config::DatalineConfig;
use dataline_core::{
    BlobStore, DatalineError, DispatchQueue, ExecutionAdapter, RecordStore, ResultCache,
    TranslationAdapter,
};
use dataline_engine::HttpQueryEngine;
use dataline_gateway::GatewayState;
use dataline_pipeline::{
    ConversationStore, DispatchWorker, ExecutionOrchestrator, HistoryAssembler, QueryService,
    ResultFormatter, TranslationRequester,
};
use dataline_storage::{FsBlobStore, MemoryCache, SqliteStorage};

/// Dataline - ask questions of tabular data in plain language.
#[derive(Parser, Debug)]
#[command(name = "dataline", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway and the dispatch worker.
    Serve,
    /// Start only the dispatch worker.
    Worker,
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match dataline_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            dataline_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => run_serve(config).await,
        Some(Commands::Worker) => run_worker(config).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("dataline: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("dataline: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Everything a running node needs: the caller-facing service and the
/// queue consumer.
struct Services {
    service: QueryService,
    worker: DispatchWorker,
}

/// Wire the production collaborators into the pipeline.
async fn build_services(
    config: &DatalineConfig,
    shutdown: CancellationToken,
) -> Result<Services, DatalineError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let records: Arc<dyn RecordStore> = storage.clone();
    let queue: Arc<dyn DispatchQueue> = storage;

    let blob: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.storage.blob_root.clone()));
    let cache: Arc<dyn ResultCache> = Arc::new(MemoryCache::new());
    let translator: Arc<dyn TranslationAdapter> =
        Arc::new(AnthropicTranslator::new(&config.translation)?);
    let engine: Arc<dyn ExecutionAdapter> = Arc::new(HttpQueryEngine::new(&config.engine)?);

    let store = ConversationStore::new(records, config.pipeline.max_conversations);
    let history = HistoryAssembler::new(store.clone(), config.pipeline.history_limit);
    let requester = TranslationRequester::new(
        translator,
        queue.clone(),
        store.clone(),
        history,
        config.pipeline.record_ttl_days,
    );
    let formatter = ResultFormatter::new(
        blob.clone(),
        cache.clone(),
        store.clone(),
        config.pipeline.cache_ttl_secs,
    );
    let orchestrator = ExecutionOrchestrator::new(
        engine,
        blob.clone(),
        store.clone(),
        formatter,
        &config.pipeline,
        config.engine.output_prefix.clone(),
    );
    let worker = DispatchWorker::new(queue, orchestrator, &config.pipeline, shutdown);
    let service = QueryService::new(requester, store, cache, blob);

    Ok(Services { service, worker })
}

async fn run_serve(config: DatalineConfig) -> Result<(), DatalineError> {
    let shutdown = CancellationToken::new();
    let services = build_services(&config, shutdown.clone()).await?;

    let worker_handle = tokio::spawn(async move { services.worker.run().await });
    let state = GatewayState {
        service: services.service,
    };

    tokio::select! {
        result = dataline_gateway::serve(&config.server, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    shutdown.cancel();
    let _ = worker_handle.await;
    Ok(())
}

async fn run_worker(config: DatalineConfig) -> Result<(), DatalineError> {
    let shutdown = CancellationToken::new();
    let services = build_services(&config, shutdown.clone()).await?;

    let worker_handle = tokio::spawn(async move { services.worker.run().await });
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| DatalineError::Internal(format!("failed to listen for shutdown: {e}")))?;
    info!("shutdown signal received");

    shutdown.cancel();
    let _ = worker_handle.await;
    Ok(())
}

fn print_config(config: &DatalineConfig) -> Result<(), DatalineError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| DatalineError::Internal(format!("failed to render config: {e}")))?;
    println!("{rendered}");
    Ok(())
}
