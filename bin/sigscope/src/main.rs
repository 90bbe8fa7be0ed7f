mod scan;

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::Config;
use scoring::MethodFileConfig;
use store::Store;
use tracker::{aggregate, format_report, run_sweep, SweepConfig};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let command = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    info!(%command, "SigScope starting");

    // ── Database ──────────────────────────────────────────────────────────────
    let db = Store::connect(&cfg.database_url)
        .await
        .unwrap_or_else(|e| panic!("Failed to open database: {e}"));
    info!("Database ready");

    let methods = MethodFileConfig::load(&cfg.method_config_path);
    info!(methods = methods.methods.len(), "Method config loaded");

    let sweep_cfg = SweepConfig {
        cutoff_hours: cfg.sweep_cutoff_hours,
        batch_size: cfg.sweep_batch_size as u32,
        ..Default::default()
    };

    match command.as_str() {
        // Single scan pass, then exit.
        "once" => {
            if let Err(e) = scan::run_scan(&db, &methods, Utc::now()).await {
                error!(error = %e, "Scan failed");
                std::process::exit(1);
            }
        }
        // Single tracking sweep, then exit.
        "sweep" => {
            if let Err(e) = run_sweep(&db, &db, &sweep_cfg, Utc::now()).await {
                error!(error = %e, "Sweep failed");
                std::process::exit(1);
            }
        }
        // Print the per-method performance report.
        "report" => match db.all_outcomes().await {
            Ok(outcomes) => print!("{}", format_report(&aggregate(&outcomes))),
            Err(e) => {
                error!(error = %e, "Failed to load outcomes");
                std::process::exit(1);
            }
        },
        // Continuous scan + sweep loops.
        "run" => {
            let scan_db = db.clone();
            let scan_methods = methods.clone();
            let scan_interval = cfg.scan_interval_secs;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(scan_interval));
                loop {
                    ticker.tick().await;
                    if let Err(e) = scan::run_scan(&scan_db, &scan_methods, Utc::now()).await {
                        error!(error = %e, "Scan pass failed");
                    }
                }
            });

            let sweep_db = db.clone();
            let sweep_interval = cfg.sweep_interval_secs;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(sweep_interval));
                loop {
                    ticker.tick().await;
                    if let Err(e) = run_sweep(&sweep_db, &sweep_db, &sweep_cfg, Utc::now()).await {
                        error!(error = %e, "Sweep pass failed");
                    }
                }
            });

            info!("Scan and sweep loops started. Waiting for shutdown signal.");
            tokio::signal::ctrl_c().await.unwrap();
            info!("Shutdown signal received. Exiting.");
        }
        other => {
            error!(command = %other, "Unknown command (expected run | once | sweep | report)");
            std::process::exit(2);
        }
    }
}
