use anyhow::{Context, Result};
use clap::Parser;
use diskflag::collectors::{host, prediction};
use diskflag::config::Config;
use diskflag::engine::evaluate_snapshot_pair;
use diskflag::models::evaluated::{DiskStatus, EvaluatedDisk};
use diskflag::util::{payload, report, webhook};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "diskflag", about = "Flag unhealthy disks from disk-prediction snapshots", version = "0.1")]
struct Cli {
    /// Config file (default: <config dir>/diskflag/diskflag.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Look-back period in days
    #[arg(short, long)]
    period: Option<usize>,

    /// Directory holding the prediction JSON files
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Reporting endpoint URL
    #[arg(long)]
    url: Option<String>,

    /// File containing the host serial number
    #[arg(long)]
    serial_file: Option<PathBuf>,

    /// Print the JSON payload instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Print a human-readable report and exit
    #[arg(long)]
    report: bool,

    /// One-shot health check: exit 0=all normal, 1=WARNING, 2=ERROR (nagios/cron compatible)
    #[arg(long)]
    check: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None       => Config::load()?,
    };
    apply_overrides(&mut cfg, &cli);

    init_logging(cfg.general.log_file())?;

    if cli.show_config {
        return run_print_config(&cfg);
    }

    let result = if cli.check {
        run_check(&cfg)
    } else if cli.report {
        run_report(&cfg)
    } else {
        run_send(&cfg, cli.dry_run)
    };

    if let Err(e) = result {
        tracing::error!(error = %format!("{:#}", e), "stopping without success");
        std::process::exit(1);
    }
    Ok(())
}

fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(p) = cli.period      { cfg.general.period_days = p; }
    if let Some(d) = &cli.dir        { cfg.general.prediction_dir = d.clone(); }
    if let Some(s) = &cli.serial_file { cfg.general.serial_path = s.clone(); }
    if let Some(u) = &cli.url        { cfg.delivery.url = u.clone(); }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "diskflag=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

/// Load the snapshot pair and evaluate it.
fn evaluate(cfg: &Config) -> Result<(Vec<EvaluatedDisk>, bool)> {
    cfg.evaluation.validate().context("invalid [evaluation] code set")?;
    tracing::info!(period_days = cfg.general.period_days, "running verification");

    let pair = prediction::load_pair(&cfg.general.prediction_dir, cfg.general.period_days)
        .context("getting disk prediction files failed")?;
    let had_older = pair.older.is_some();
    let disks = evaluate_snapshot_pair(&pair, &cfg.evaluation)
        .context("getting disk data failed")?;
    Ok((disks, had_older))
}

fn run_send(cfg: &Config, dry_run: bool) -> Result<()> {
    let serial = host::read_host_serial(&cfg.general.serial_path)
        .context("getting host serial number failed")?;
    let (disks, _) = evaluate(cfg)?;
    let body = payload::build_payload(&serial, &disks);

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    webhook::deliver(
        &cfg.delivery.url,
        &body,
        Duration::from_secs(cfg.delivery.timeout_secs),
        cfg.delivery.retries,
    )
    .context("POST request failed")?;
    tracing::info!(disks = disks.len(), "SMART data sent to server successfully");
    Ok(())
}

fn run_report(cfg: &Config) -> Result<()> {
    let serial = host::read_host_serial(&cfg.general.serial_path)
        .unwrap_or_else(|_| "unknown host".to_string());
    let (disks, had_older) = evaluate(cfg)?;
    print!("{}", report::generate(&serial, &disks, had_older));
    Ok(())
}

fn run_check(cfg: &Config) -> Result<()> {
    let (disks, _) = evaluate(cfg)?;
    let worst = disks.iter().map(|d| d.status).max().unwrap_or(DiskStatus::Normal);

    if worst == DiskStatus::Normal {
        println!("OK: {} disk(s), no flags", disks.len());
        std::process::exit(0);
    }

    for d in disks.iter().filter(|d| d.status != DiskStatus::Normal) {
        let names: Vec<&str> = d.flags.iter().map(|f| f.name.as_str()).collect();
        println!("[{}] {}: {}", d.status.label(), d.serial(), names.join(", "));
    }

    match worst {
        DiskStatus::Error => std::process::exit(2),
        _                 => std::process::exit(1),
    }
}

fn run_print_config(cfg: &Config) -> Result<()> {
    let path = Config::config_path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(unknown)".to_string());
    let g = &cfg.general;
    let e = &cfg.evaluation;
    let d = &cfg.delivery;
    println!("Config: {}", path);
    println!();
    println!("[general]");
    println!("  period_days    = {}", g.period_days);
    println!("  prediction_dir = {}", g.prediction_dir.display());
    println!("  serial_path    = {}", g.serial_path.display());
    println!("  log_file       = {}", g.log_file().map(|p| p.display().to_string()).unwrap_or_else(|| "(stderr only)".into()));
    println!();
    println!("[evaluation]");
    println!("  smart_codes       = {:?}", e.smart_codes);
    println!("  kernel_codes      = {:?}", e.kernel_codes);
    println!("  match_strategy    = {:?}", e.match_strategy);
    println!("  on_malformed      = {:?}", e.on_malformed);
    println!("  require_same_kind = {}", e.require_same_kind);
    println!();
    println!("[delivery]");
    let url = if d.url.is_empty() { "(not set)" } else { d.url.as_str() };
    println!("  url          = {}", url);
    println!("  timeout_secs = {}", d.timeout_secs);
    println!("  retries      = {}", d.retries);
    Ok(())
}
