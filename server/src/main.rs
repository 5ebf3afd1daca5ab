use clap::Parser;
use log::{error, info, warn};
use server::console;
use server::network::Server;
use server::session::{Session, DEFAULT_TOP_SCORES};
use server::store::{SqliteStore, UserStore};
use server::users::UserList;
use server::words::WordList;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// SQLite database holding users and words
    #[arg(short, long, default_value = "data/data.sqlite")]
    database: PathBuf,

    /// Number of leaderboard entries broadcast each tick
    #[arg(long, default_value_t = DEFAULT_TOP_SCORES)]
    top_scores: usize,
}

fn open_store(path: &Path) -> Result<SqliteStore, Box<dyn std::error::Error>> {
    match SqliteStore::open(path) {
        Ok(store) => Ok(store),
        Err(e) => {
            error!(
                "Failed to open database {}: {}; nothing will be persisted",
                path.display(),
                e
            );
            Ok(SqliteStore::open_memory()?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let tick_rate = args.tick_rate.max(1);

    let store = open_store(&args.database)?;
    let words = match store.load_words() {
        Ok(words) => WordList::new(words),
        Err(e) => {
            error!("Failed to load words: {}", e);
            WordList::default()
        }
    };
    if words.len() < shared::WORD_CHOICES {
        warn!(
            "Only {} words available; rounds cannot start until the corpus has {}",
            words.len(),
            shared::WORD_CHOICES
        );
    }

    let mut users = UserList::new(Box::new(store));
    match users.reload() {
        Ok(count) => info!("Loaded {} users and {} words", count, words.len()),
        Err(e) => error!("Failed to load users: {}", e),
    }

    let session = Session::new(users, words, args.top_scores);
    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(tick_rate));
    let mut server = Server::bind(&address, session, tick_duration).await?;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    tokio::spawn(console::read_commands(command_tx));

    info!("Type 'login <username> <password>' to start drawing");

    tokio::select! {
        _ = server.run(command_rx) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
