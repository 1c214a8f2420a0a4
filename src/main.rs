use std::path::PathBuf;

use stopmotion::{AppError, CaptureSession, Configuration, LoggingCaptureSink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{Level, warn};

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Replays a recorded trace of per-frame object counts (one per line on stdin) through
/// the hands detector and prints the frame index of every capture.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let configuration = Configuration::load(config_path.as_deref())?;
    init_logging(configuration.max_log_level()?);

    let mut session = CaptureSession::new(configuration.detector, LoggingCaptureSink)?;
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut frame_index: u64 = 0;

    while let Some(line) = lines.next().await {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        frame_index += 1;

        let count = match line.parse::<i64>() {
            Ok(count) => count,
            Err(e) => {
                warn!("Skipping frame {}: '{}' is not a count ({})", frame_index, line, e);
                continue;
            }
        };
        match session.observe(count).await {
            Ok(Some(_)) => println!("capture at frame {}", frame_index),
            Ok(None) => {}
            Err(e) => warn!("Skipping frame {}: {}", frame_index, e),
        }
    }

    let stats = serde_json::to_string(&session.stats())
        .map_err(|e| AppError::Pipeline(e.to_string()))?;
    println!("{}", stats);
    Ok(())
}
