use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod run;

#[derive(Debug, Parser)]
#[command(name = "holdings_worker", about = "Diff a filer's two latest 13F holdings reports")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory for the CSV report and the run log.
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Do not write `<label>_fund_holdings.log`. Implied by `--dry-run`.
    #[arg(long, global = true)]
    no_log_file: bool,

    /// Do everything except writing the report or the log file.
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the two most recent 13F-HR filings from EDGAR and compare them.
    Fetch {
        /// Label used for output file names, e.g. "berkshire".
        fund_name: String,

        /// Filer CIK; zero padding is optional.
        cik: String,

        /// How many feed entries to request (overrides EDGAR_FEED_COUNT).
        #[arg(long)]
        feed_count: Option<usize>,
    },

    /// Compare two information-table XML files already on disk.
    Compare {
        /// The more recent information table.
        #[arg(long)]
        recent: PathBuf,

        /// The prior information table.
        #[arg(long)]
        prior: PathBuf,

        /// Report file name without extension.
        #[arg(long)]
        label: String,
    },
}

impl Args {
    fn log_file_path(&self, label: &str) -> Option<PathBuf> {
        (!self.no_log_file && !self.dry_run)
            .then(|| self.output_dir.join(format!("{label}_fund_holdings.log")))
    }
}

impl Command {
    fn label(&self) -> String {
        match self {
            Command::Fetch { fund_name, cik, .. } => format!("{fund_name}_{cik}"),
            Command::Compare { label, .. } => label.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = holdings_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    let args = Args::parse();
    let label = args.command.label();
    holdings_core::export::validate_label(&label)?;

    init_tracing(args.log_file_path(&label).as_deref())?;

    let opts = run::RunOptions {
        label,
        output_dir: args.output_dir,
        dry_run: args.dry_run,
    };

    let result = match args.command {
        Command::Fetch {
            cik, feed_count, ..
        } => run::fetch(&settings, &cik, feed_count, &opts).await,
        Command::Compare { recent, prior, .. } => run::compare(&recent, &prior, &opts),
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(label = %opts.label, error = %format!("{err:#}"), "holdings run failed");
    }
    result
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(sentry_tracing::layer())
        .init();
    Ok(())
}

fn init_sentry(settings: &holdings_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
