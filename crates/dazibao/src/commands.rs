use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ArgMatches;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use dazibao_core::config::{self, Config};
use dazibao_core::render::PageRenderer;
use dazibao_core::scheduler::{self, DEFAULT_SHUTDOWN_GRACE};
use dazibao_core::{APP_VERSION, ConfigStore, DashboardConfig, Supervisor, events};

use crate::assets;
use crate::lock::InstanceLock;
use crate::server::{self, AppState};

pub async fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    events::log_app_startup();

    let config = Config::from_env()?;
    if let Err(e) = assets::ensure_assets(&config) {
        events::log_app_error(&e);
        return Err(e.into());
    }

    let output = matches.get_one::<PathBuf>("output").cloned();

    let result = if matches.get_flag("dry-run") {
        handle_dry_run(&config, output.as_deref()).await
    } else if let Some(&seconds) = matches.get_one::<u64>("interval") {
        let target = output.unwrap_or_else(|| config.index_file());
        handle_interval(&config, Duration::from_secs(seconds), &target).await
    } else {
        handle_serve(&config).await
    };

    events::log_app_shutdown();
    result
}

/// Load the tree from disk and stamp it with the running version.
fn load_dashboard(config: &Config) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let path = config.config_file();
    match config::load_or_create(&path) {
        Ok(mut tree) => {
            tree.version = APP_VERSION.to_string();
            Ok(tree)
        }
        Err(e) => {
            eprintln!("Could not load {}: {}", path.display(), e);
            error!(
                event = "cli.config.load_failed",
                path = %path.display(),
                error = %e
            );
            Err(e.into())
        }
    }
}

/// One full pass: fresh tree, every block ticked once, persisted, rendered.
async fn generate_page(config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let tree = load_dashboard(config)?;
    let store = ConfigStore::in_memory(tree);

    let outcomes = scheduler::run_all_once(&store).await;
    let failures: usize = outcomes.iter().map(|o| o.failures).sum();

    let snapshot = store.snapshot();
    config::save_config_file(&snapshot, &config.config_file())?;

    info!(
        event = "cli.generate.completed",
        block_count = snapshot.blocks.len(),
        failures = failures
    );

    let html = PageRenderer::from_config(config).render(&snapshot)?;
    Ok(html)
}

fn write_page(path: &Path, html: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    info!(event = "cli.generate.written", path = %path.display());
    Ok(())
}

async fn handle_dry_run(
    config: &Config,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.dry_run_started");

    let html = generate_page(config).await?;
    match output {
        Some(path) => {
            write_page(path, &html)?;
            eprintln!("Page written to {}", path.display());
        }
        None => println!("{}", html),
    }

    info!(event = "cli.dry_run_completed");
    Ok(())
}

async fn handle_interval(
    config: &Config,
    period: Duration,
    target: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        event = "cli.interval_started",
        period_secs = period.as_secs(),
        path = %target.display()
    );

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // A failed cycle is logged and retried on the next tick.
        let cycle = async {
            let html = generate_page(config).await?;
            write_page(target, &html)?;
            Ok::<(), Box<dyn std::error::Error>>(())
        };
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = cycle => {
                if let Err(e) = result {
                    error!(event = "cli.interval.cycle_failed", error = %e);
                }
            }
        }
    }

    info!(event = "cli.interval_stopped");
    Ok(())
}

async fn handle_serve(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let lock = match InstanceLock::acquire(&config.lock_file()) {
        Ok(lock) => lock,
        Err(e) => {
            eprintln!("{}", e);
            events::log_app_error(&e);
            return Err(e.into());
        }
    };

    let tree = load_dashboard(config)?;
    let port = tree.port;
    let store = ConfigStore::with_persistence(tree, config.config_file());
    // Persist the version stamp even before the first tick lands.
    store.mutate(|_| ());

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Could not listen on port {}: {}", port, e);
            error!(event = "cli.server.bind_failed", port = port, error = %e);
            return Err(e.into());
        }
    };

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    let supervisor = Supervisor::start_with_token(&store, shutdown.child_token());

    info!(
        event = "cli.server.started",
        port = port,
        block_count = supervisor.len(),
        lock = %lock.path().display()
    );
    eprintln!("Dazibao listening on http://0.0.0.0:{}", port);

    let state = AppState {
        store,
        renderer: PageRenderer::from_config(config),
    };
    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, server::router(state))
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await;

    // The server can also stop on its own error; schedulers follow it down.
    shutdown.cancel();
    supervisor.shutdown(DEFAULT_SHUTDOWN_GRACE).await;

    if let Err(e) = served {
        error!(event = "cli.server.failed", error = %e);
        return Err(e.into());
    }

    info!(event = "cli.server.stopped");
    drop(lock);
    Ok(())
}

fn spawn_signal_listener(token: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!(event = "cli.signal_received");
        token.cancel();
    });
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(event = "cli.signal.ctrl_c_failed", error = %e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(event = "cli.signal.sigterm_failed", error = %e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
