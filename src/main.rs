//! Anti-detect browser automation CLI
//!
//! Thin shell over the orchestration core: validates inputs, launches the
//! requested instances concurrently, and tears everything down on ctrl-c.
//! Individual instance failures are printed; they never stop the run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use stealthbrowse::driver::NoopDriver;
use stealthbrowse::profiles::ProfileStore;
use stealthbrowse::proxy::ProxyConfig;
use stealthbrowse::session::{LogCallback, OrchestratorConfig, SessionOrchestrator};
use stealthbrowse::validate::validate_inputs;
use stealthbrowse::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "stealthbrowse", version, about = "Anti-detect browser automation CLI")]
struct Args {
    /// URL to visit
    url: String,

    /// Proxy in IP:PORT or IP:PORT:USER:PASS format
    #[arg(long, default_value = "")]
    proxy: String,

    /// Number of browser instances (1-10)
    #[arg(long, default_value_t = 1)]
    instances: u32,

    /// Minimum hold time in seconds
    #[arg(long, default_value_t = 5.0)]
    min_time: f64,

    /// Maximum hold time in seconds
    #[arg(long, default_value_t = 15.0)]
    max_time: f64,

    /// Run browsers with a visible window
    #[arg(long)]
    headed: bool,

    /// Override the profile store directory
    #[arg(long)]
    profile_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = stealthbrowse::init_logging();
    let args = Args::parse();

    validate_inputs(
        &args.url,
        &args.proxy,
        args.instances,
        args.min_time,
        args.max_time,
    )?;

    let mut config = AppConfig::load();
    if args.headed {
        config.headless = false;
    }
    if let Some(dir) = args.profile_dir {
        config.profile_dir = dir;
    }

    let proxy = if args.proxy.is_empty() {
        None
    } else {
        Some(ProxyConfig::parse(&args.proxy)?)
    };

    let profiles = Arc::new(
        ProfileStore::new(&config.profile_dir).context("failed to open profile store")?,
    );

    // The browser engine ships separately; without one wired in, the
    // NoopDriver dry-runs the full orchestration pipeline.
    let orchestrator = Arc::new(SessionOrchestrator::new(
        Arc::new(NoopDriver),
        profiles,
        OrchestratorConfig {
            headless: config.headless,
            screenshot_dir: config.screenshot_dir.clone(),
        },
    ));

    println!("Starting browser automation...");
    info!(
        "Launching {} instances against {} (proxy: {})",
        args.instances,
        args.url,
        if proxy.is_some() { "yes" } else { "no" }
    );

    let log: LogCallback = Arc::new(|line: &str| println!("{}", line));

    let mut tasks = Vec::with_capacity(args.instances as usize);
    for instance_id in 1..=args.instances {
        let orchestrator = orchestrator.clone();
        let url = args.url.clone();
        let proxy = proxy.clone();
        let log = log.clone();
        let (min_time, max_time) = (args.min_time, args.max_time);

        tasks.push(tokio::spawn(async move {
            orchestrator
                .launch(instance_id, &url, proxy, min_time, max_time, Some(log))
                .await
        }));
    }

    tokio::select! {
        results = futures::future::join_all(tasks) => {
            let mut failures = 0;
            for result in results {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        failures += 1;
                        eprintln!("Error: {}", e);
                    }
                    Err(e) => {
                        failures += 1;
                        eprintln!("Error: instance task panicked: {}", e);
                    }
                }
            }
            if failures > 0 {
                println!("Automation completed ({} instances failed)", failures);
            } else {
                println!("Automation completed successfully!");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nStopping automation...");
            orchestrator.close_all().await;
        }
    }

    Ok(())
}
