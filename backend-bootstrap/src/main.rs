use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "voucher-backend")]
#[command(about = "Festival voucher redemption backend", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,

    /// Also write daily rolling log files into this directory
    #[arg(long)]
    log_dir: Option<String>,
}

fn init_tracing(args: &Args) -> Option<WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout = if args.log_json {
        fmt::layer().json().with_filter(filter()).boxed()
    } else {
        fmt::layer().with_filter(filter()).boxed()
    };

    let log_dir = args
        .log_dir
        .clone()
        .or_else(|| std::env::var("VOUCHER_LOG_DIR").ok())
        .filter(|dir| !dir.trim().is_empty());
    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "voucher-backend.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter())
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(stdout).with(file).init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args);

    if let Some(config) = args.config {
        std::env::set_var("VOUCHER_CONFIG", config);
    }

    backend_bootstrap::run_standalone().await
}
