use std::process::ExitCode;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use instrument_alerts::config::{AppConfig, LOG_FILE_NAME};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = AppConfig::from_env();

    // Console + run log file
    std::fs::create_dir_all(&config.log_dir)?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(&config.log_dir)?;
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    eprintln!("📬 Instrument Alerts v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Source: {}", config.source_path.display());
    eprintln!(
        "   Delivery: {}",
        match &config.email.smtp {
            Some(smtp) => format!("SMTP {}:{}", smtp.host, smtp.port),
            None => format!("outbox {}", config.email.outbox_dir.display()),
        }
    );
    eprintln!(
        "   Override address: {}\n",
        config.override_address.as_deref().unwrap_or("(unset)")
    );

    // Anything that escapes the run, including a panic, ends it here.
    let handle = tokio::spawn(async move { instrument_alerts::run(&config).await });
    let code = match handle.await {
        Ok(Ok(report)) => {
            tracing::info!(
                sent = report.sent(),
                failed = report.failed(),
                skipped = report.skipped(),
                "Process completed successfully"
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Fatal error, run aborted");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Run task panicked");
            ExitCode::FAILURE
        }
    };

    Ok(code)
}
