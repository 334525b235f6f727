use raspadinha_core::{GameResult, HmacSource, MemoryStore, Money, RoundController};

fn main() -> GameResult<()> {
    // Example end-to-end round with a reproducible random stream
    let rng = HmacSource::new("example-server-seed", "example-client-seed", 1);
    println!("server_seed_hash={}", rng.server_seed_hash_hex());
    let mut game = RoundController::open(MemoryStore::new(), rng);
    game.add_balance(Money::from_reais(10))?;
    println!("chance shown: {}%", game.next_round_chance());
    game.start_round()?;
    let card = game.complete_round()?;
    let symbols: Vec<String> = card.grid.iter().map(|b| b.symbol.to_string()).collect();
    println!(
        "card={} won={} grid={:?} balance={}",
        card.id,
        card.has_won,
        symbols,
        game.state().balance
    );
    Ok(())
}
