use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use raspadinha_core::{
    simulate, EntropySource, FileStore, GameState, HmacSource, KycData, Money, RandomSource,
    RoundController, ScratchCard,
};
use raspadinha_shared::{KycStep1Request, WebhookLogEntry};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "raspadinha-cli", about = "Play and inspect the raspadinha scratch card game")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Directory holding the saved game state
    #[arg(long, env = "STATE_DIR", default_value = ".raspadinha")]
    state_dir: PathBuf,
    /// Webhook log database, default sqlite://raspadinha.db
    #[arg(long, value_parser, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show balance, rounds played and the chance shown for the next round
    Status,
    /// Buy a card, scratch it and apply the result
    Play {
        #[arg(default_value_t = 1)]
        cards: u32,
    },
    /// Simulated PIX deposit, credited after a fixed delay
    Deposit {
        amount: f64,
        #[arg(long, default_value_t = 5)]
        delay_secs: u64,
    },
    /// First KYC step: CPF, full name and birth date
    KycStep1 {
        cpf: String,
        full_name: String,
        birth_date: String,
    },
    /// Second KYC step; marks the account verified
    KycStep2,
    /// Run the outcome schedule without touching the saved game
    Simulate {
        #[arg(default_value_t = 10_000)]
        rounds: u32,
        /// Reproducible run from an HMAC seed pair
        #[arg(long, requires = "client_seed")]
        server_seed: Option<String>,
        #[arg(long)]
        client_seed: Option<String>,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
        /// Export per-round rows to CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// View last N PIX webhook events
    Webhooks {
        #[arg(default_value_t = 20)]
        n: i64,
    },
    /// Delete the saved game state
    Reset,
}

type Game = RoundController<FileStore, EntropySource>;

fn open_game(dir: &Path) -> Game {
    RoundController::open(FileStore::new(dir), EntropySource::new())
}

async fn get_pool(url: Option<String>) -> anyhow::Result<SqlitePool> {
    let url = url.unwrap_or_else(|| "sqlite://raspadinha.db".into());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .with_context(|| format!("cannot open webhook log at {url}"))?;
    Ok(pool)
}

fn print_state(state: &GameState) {
    println!("balance:        {}", state.balance);
    println!("cards played:   {}", state.scratch_cards_used);
    println!("iPhone won:     {}", state.has_won_iphone);
    println!(
        "kyc:            step1={} step2={} verified={}",
        state.kyc_step1_complete, state.kyc_step2_complete, state.kyc_verified
    );
}

fn print_card(card: &ScratchCard) {
    for row in card.grid.chunks(3) {
        let line: Vec<String> = row.iter().map(|b| b.symbol.to_string()).collect();
        println!("  {}", line.join(" "));
    }
    match (card.has_won, card.prize_type, card.prize_amount) {
        (true, Some(kind), Some(amount)) => {
            let line = card.winning_line().unwrap_or_default();
            println!("  WIN {:?} {} on cells {:?}", kind, amount, line);
        }
        _ => println!("  no prize this time"),
    }
}

fn play(game: &mut Game, cards: u32) -> anyhow::Result<()> {
    for _ in 0..cards {
        let chance = game.next_round_chance();
        let round = game.state().next_round();
        let card = game.start_round().map(|c| c.id.clone());
        let id = match card {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, round, "round refused");
                println!("{e}; deposit to keep playing");
                break;
            }
        };
        println!("round {round} ({id}), chance shown {chance}%");
        let card = game.complete_round()?;
        info!(card = %card.id, won = card.has_won, balance = %game.state().balance, "round completed");
        print_card(&card);
        if game.has_pending_iphone() {
            game.acknowledge_iphone_win()?;
            println!("  iPhone prize credited");
        }
        println!("  balance {}", game.state().balance);
    }
    Ok(())
}

fn run_simulation(
    rounds: u32,
    rng: &mut dyn RandomSource,
    csv_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let report = simulate(rounds, rng);
    println!("rounds:            {}", report.rounds);
    println!("wins:              {}", report.wins);
    println!(
        "late win rate:     {:.4} over {} rounds",
        report.late_win_rate(),
        report.late_rounds
    );
    println!("staked:            {}", report.total_staked);
    println!("prizes:            {}", report.total_prizes);
    println!("return to player:  {:.4}", report.return_to_player());

    if let Some(path) = csv_path {
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(["round", "displayed_chance", "won", "prize_type", "prize_amount"])?;
        for r in &report.records {
            wtr.write_record(&[
                r.round.to_string(),
                r.displayed_chance.to_string(),
                r.won.to_string(),
                r.prize_type
                    .map(|p| format!("{p:?}").to_lowercase())
                    .unwrap_or_default(),
                format!("{:.2}", r.prize_amount.as_decimal()),
            ])?;
        }
        wtr.flush()?;
        println!("Exported {} rows to {}", report.records.len(), path.display());
    }
    Ok(())
}

async fn view_webhooks(pool: &SqlitePool, n: i64) -> anyhow::Result<()> {
    let rows = sqlx::query(
        "SELECT id, ts, status, transaction_id, external_id, amount, payload_json FROM pix_webhooks ORDER BY id DESC LIMIT ?",
    )
    .bind(n)
    .fetch_all(pool)
    .await?;
    for r in rows {
        let ts: String = r.get("ts");
        let payload: String = r.get("payload_json");
        let entry = WebhookLogEntry {
            id: r.get("id"),
            ts: DateTime::parse_from_rfc3339(&ts)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_default(),
            status: r.get("status"),
            transaction_id: r.get("transaction_id"),
            external_id: r.get("external_id"),
            amount: r.get("amount"),
            payload: serde_json::from_str(&payload).unwrap_or(serde_json::Value::String(payload)),
        };
        println!(
            "#{:>6} {} status={} txn={} order={} amount={}",
            entry.id,
            entry.ts.to_rfc3339(),
            entry.status.as_deref().unwrap_or("-"),
            entry.transaction_id.as_deref().unwrap_or("-"),
            entry.external_id.as_deref().unwrap_or("-"),
            entry.amount.map(|a| format!("{a:.2}")).unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            let mut game = open_game(&cli.state_dir);
            print_state(game.state());
            let round = game.state().next_round();
            let chance = game.next_round_chance();
            println!("next round:     {round} ({chance}% chance shown)");
        }
        Commands::Play { cards } => {
            let mut game = open_game(&cli.state_dir);
            play(&mut game, cards)?;
        }
        Commands::Deposit { amount, delay_secs } => {
            let amount = Money::from_decimal(amount).context("amount must be a positive number")?;
            let mut game = open_game(&cli.state_dir);
            let pix = game.request_deposit(amount, Utc::now())?;
            println!("PIX copia e cola:\n{}", pix.qrcode);
            println!("transaction {} - waiting for payment...", pix.transaction_id);
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            let state = game.confirm_deposit(&pix)?;
            println!("payment confirmed, balance {}", state.balance);
        }
        Commands::KycStep1 {
            cpf,
            full_name,
            birth_date,
        } => {
            let req = KycStep1Request {
                cpf,
                full_name,
                birth_date,
            };
            req.validate()?;
            let mut game = open_game(&cli.state_dir);
            game.complete_kyc_step1(KycData {
                cpf: req.cpf,
                full_name: req.full_name,
                birth_date: req.birth_date,
            })?;
            println!("KYC step 1 complete");
        }
        Commands::KycStep2 => {
            let mut game = open_game(&cli.state_dir);
            game.complete_kyc_step2()?;
            println!("KYC verified");
        }
        Commands::Simulate {
            rounds,
            server_seed,
            client_seed,
            nonce,
            csv,
        } => match (server_seed, client_seed) {
            (Some(server), Some(client)) => {
                let mut rng = HmacSource::new(server, client, nonce);
                println!("server_seed_hash:  {}", rng.server_seed_hash_hex());
                run_simulation(rounds, &mut rng, csv)?;
            }
            _ => run_simulation(rounds, &mut EntropySource::new(), csv)?,
        },
        Commands::Webhooks { n } => {
            let pool = get_pool(cli.database_url).await?;
            view_webhooks(&pool, n).await?;
        }
        Commands::Reset => {
            let mut game = open_game(&cli.state_dir);
            game.reset()?;
            info!(state_dir = %cli.state_dir.display(), "saved game removed");
            println!("Saved game removed from {}", cli.state_dir.display());
        }
    }

    Ok(())
}
