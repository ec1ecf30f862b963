use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal::ctrl_c;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use iqx_dockbooking::config::Settings;
use iqx_dockbooking::init::initialize;
use iqx_dockbooking::tools::ToolReply;
use iqx_dockbooking::utils::logging;

/// The main entry point of the IQX Dock Booking tool host
///
/// Reads one JSON tool call per stdin line and answers with one JSON reply per stdout line
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

/// The core logic of the IQX Dock Booking tool host
///
/// This asynchronous function performs the following steps:
/// 1. Loads application settings from configuration files and the environment
/// 2. Initializes the logging system
/// 3. Builds the booking services and the tool dispatcher
/// 4. Spawns the keep-alive worker, when a ping URL is configured
/// 5. Serves tool calls from stdin until EOF or a shutdown signal
///
/// Calls are dispatched concurrently; replies carry the caller's `id` for correlation.
///
/// # Returns
///
/// * `Ok(())` if the host shuts down gracefully
/// * `Err(anyhow::Error)` if initialization fails or stdout can no longer be written
async fn run() -> Result<()> {
    let settings = Settings::new()?;
    let _guard = logging::init_logger(settings.logging.path.clone(), &settings.logging.level)?;
    let context = initialize(settings)?;
    info!("{}", context.settings);

    if let Some(worker) = context.keep_alive.clone() {
        tokio::spawn(async move { worker.run().await });
    }

    let (reply_tx, mut reply_rx) = mpsc::channel::<ToolReply>(64);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(reply) = reply_rx.recv().await {
            let mut line = serde_json::to_string(&reply)?;
            line.push('\n');
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        Ok::<(), anyhow::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Waiting for tool calls on stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        let dispatcher = context.dispatcher.clone();
                        let reply_tx = reply_tx.clone();
                        tokio::spawn(async move {
                            let reply = dispatcher.dispatch_line(&line).await;
                            if reply_tx.send(reply).await.is_err() {
                                warn!("Reply writer closed; dropping reply");
                            }
                        });
                    }
                    Ok(None) => {
                        info!("Stdin closed. Shutting down...");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read from stdin: {}", e);
                        break;
                    }
                }
            }
            _ = ctrl_c() => {
                info!("Received shutdown signal. Shutting down gracefully...");
                break;
            }
        }
    }

    // in-flight calls hold their own sender; the writer drains until the last one finishes
    drop(reply_tx);
    writer.await??;
    Ok(())
}
