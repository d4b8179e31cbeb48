//! Headless Block Busters runner (default binary).
//!
//! Reads line-delimited JSON commands from stdin and writes acks, observations and
//! events to stdout, one JSON object per line. Logs go to stderr.
//!
//! Usage: `block-busters [config.json]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn, LevelFilter};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc::error::TrySendError;

use block_busters::adapter::protocol::{create_error, ErrorCode};
use block_busters::adapter::{
    encode_output, route_line, spawn_session, RuntimeConfig, RuntimeInput, Routed,
};
use block_busters::core::Session;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = RuntimeConfig::load(path.as_deref()).context("failed to load configuration")?;
    init_logging(config.level_filter()?)?;

    let session = Session::new(config.session_config()?);
    info!(
        "starting session (seed {}, clear delay {} ms)",
        config.seed, config.clear_delay_ms
    );
    let mut handle = spawn_session(session, config.runtime_options());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match route_line(&line) {
                    Routed::Ignore => {}
                    Routed::Reply(err) => {
                        warn!("rejected line: {}", err.message);
                        write_line(&mut stdout, &err.to_line()?).await?;
                    }
                    Routed::Input(input) => match handle.input.try_send(input) {
                        Ok(()) => {}
                        Err(TrySendError::Full(input)) => {
                            let err = create_error(
                                input_seq(input),
                                ErrorCode::Backpressure,
                                "too many pending commands",
                            );
                            write_line(&mut stdout, &err.to_line()?).await?;
                        }
                        Err(TrySendError::Closed(_)) => bail!("session task stopped"),
                    },
                }
            }
            output = handle.output.recv() => {
                let Some(output) = output else {
                    bail!("session task stopped");
                };
                write_line(&mut stdout, &encode_output(&output)?).await?;
            }
        }
    }

    // stdin closed: stop the task and flush whatever it already produced
    handle.input.send(RuntimeInput::Shutdown).await.ok();
    while let Some(output) = handle.output.recv().await {
        write_line(&mut stdout, &encode_output(&output)?).await?;
    }
    let session = handle.task.await.context("session task panicked")?;
    info!(
        "finished: score {}, level {}, lines {}",
        session.score(),
        session.level(),
        session.lines()
    );
    Ok(())
}

fn init_logging(level: LevelFilter) -> Result<()> {
    use simplelog::LevelFilter::Off;
    simplelog::WriteLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_target_level(Off)
            .set_location_level(Off)
            .build(),
        std::io::stderr(),
    )?;
    Ok(())
}

fn input_seq(input: RuntimeInput) -> u64 {
    match input {
        RuntimeInput::Action { seq, .. } | RuntimeInput::Observe { seq } => seq,
        RuntimeInput::Shutdown => 0,
    }
}

async fn write_line(stdout: &mut Stdout, line: &str) -> Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
