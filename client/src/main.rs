use clap::Parser;
use client::input;
use client::network::Client;
use client::session::ClientSession;
use log::info;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate.max(1)));

    let session = ClientSession::new(&mut rand::thread_rng());
    info!("Connecting to: {}", args.server);
    info!("Correlation id: {}", session.correlation_id());

    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    tokio::spawn(input::read_lines(lines_tx));

    let mut client = Client::new(&args.server, session, tick_duration);
    client.run(lines_rx).await;

    Ok(())
}
