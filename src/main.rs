use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ring_pipes::{atomic_mut, LineSink, LineSource, Pipeline, PipelineConfig, PipelineError};

#[derive(Parser, Debug)]
#[command(name = "ring-pipes")]
#[command(about = "Filter integers read from stdin and flush the survivors on a timer")]
struct Args {
    /// Maximum number of values buffered between two flushes
    #[arg(short, long, default_value_t = ring_pipes::DEFAULT_CAPACITY)]
    capacity: usize,

    /// Seconds between two flushes of the buffer
    #[arg(short, long, default_value_t = ring_pipes::DEFAULT_DRAIN_INTERVAL.as_secs())]
    drain_interval: u64,

    /// Number of values each pipe between two stages can hold
    #[arg(short, long, default_value_t = ring_pipes::DEFAULT_PIPE_CAPACITY)]
    pipe_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig {
        capacity: args.capacity,
        drain_interval: Duration::from_secs(args.drain_interval),
        pipe_capacity: args.pipe_capacity,
    };

    let source = atomic_mut(LineSource::new(tokio::io::stdin()));

    println!("Enter integers, one per line (an empty line ends the input):");
    Pipeline::builder()
        .with_config(config)
        .with_producer(move || {
            let source = source.clone();
            async move {
                let mut source = source.lock().await;
                source.next_value().await
            }
        })
        .with_consumer(LineSink::new(std::io::stdout()))
        .build()?
        .wait()
        .await;

    info!("pipeline finished");
    Ok(())
}
