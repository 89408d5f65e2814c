use anyhow::Context;
use clap::Parser;
use liveboard_client::{ws, GameState, RoundController, RoundGames};
use liveboard_protocol::GameId;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

#[derive(Parser)]
#[command(name = "liveboard")]
#[command(about = "Terminal viewer for a live chess broadcast round")]
struct Cli {
    /// Websocket URL of the round feed, e.g. wss://host/round/abc/feed
    url: String,

    /// Print every snapshot, including think-time ticks
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let url = Url::parse(&cli.url).context("invalid feed url")?;

    println!("🔗 Connecting to {url}...");
    let (events, _reader) = ws::connect(url.as_str()).await?;
    let controller = RoundController::start(RoundGames::new(), events);
    let mut updates = controller.subscribe();
    println!("✅ Connected. Waiting for the round snapshot...");

    let mut rendered: HashMap<GameId, String> = HashMap::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n👋 Closing the round.");
                break;
            }
            update = updates.recv() => match update {
                Some(snapshot) => render(&snapshot, &mut rendered, cli.verbose),
                None => {
                    println!("🔌 Feed ended; last known state kept above.");
                    break;
                }
            }
        }
    }

    controller.close();
    Ok(())
}

/// Print the games whose position or clocks moved since the last render.
fn render(snapshot: &RoundGames, rendered: &mut HashMap<GameId, String>, verbose: bool) {
    for (id, game) in snapshot.iter() {
        let line = game_line(game);
        let changed = rendered.get(id) != Some(&line);
        if changed || verbose {
            println!("{id}  {line}  (thinking {}s)", game.think_time.as_secs());
            rendered.insert(id.clone(), line);
        }
    }
}

fn game_line(game: &GameState) -> String {
    let status = if game.playing { "live" } else { "ended" };
    let last = game.last_move.as_deref().unwrap_or("...");
    format!(
        "{} {} vs {} {}  [{last}] [{status}]",
        game.players.white.name,
        fmt_clock(game.players.white.clock),
        game.players.black.name,
        fmt_clock(game.players.black.clock),
    )
}

fn fmt_clock(clock: Option<Duration>) -> String {
    match clock {
        Some(time) => format!("{:02}:{:02}", time.as_secs() / 60, time.as_secs() % 60),
        None => "--:--".to_string(),
    }
}
