use crate::{
    card::ScratchCard,
    error::{GameError, GameResult},
    money::Money,
    outcome::{display_chance, IPHONE_PRIZE_VALUE},
    pix::{create_fictional_pix, FictionalPix, MIN_DEPOSIT},
    rng::RandomSource,
    round,
    state::{GameState, KycData},
    store::GameStore,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Result of scratching one block of the in-flight card.
#[derive(Debug, Clone, PartialEq)]
pub struct Reveal {
    pub block: u8,
    pub symbol: crate::symbols::Symbol,
    pub winning_line: Option<[u8; 3]>,
    pub fully_revealed: bool,
}

/// Owns the game state and runs every load-mutate-save cycle.
///
/// At most one card is in flight: `Idle -> start_round -> InProgress -> complete_round -> Idle`.
pub struct RoundController<S: GameStore, R: RandomSource> {
    store: S,
    rng: R,
    state: GameState,
    in_flight: Option<ScratchCard>,
}

impl<S: GameStore, R: RandomSource> RoundController<S, R> {
    /// Rehydrates from the store, falling back to a fresh state.
    pub fn open(store: S, rng: R) -> Self {
        let state = store.load().unwrap_or_default();
        debug!(
            balance = %state.balance,
            rounds = state.scratch_cards_used,
            "game state loaded"
        );
        Self {
            store,
            rng,
            state,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn current_card(&self) -> Option<&ScratchCard> {
        self.in_flight.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_pending_iphone(&self) -> bool {
        self.state.iphone_credit_pending
    }

    fn commit(&mut self, next: GameState) -> GameResult<()> {
        self.store.save(&next)?;
        self.state = next;
        Ok(())
    }

    /// Cosmetic chance for the upcoming round.
    pub fn next_round_chance(&mut self) -> u8 {
        display_chance(self.state.next_round(), &mut self.rng)
    }

    pub fn start_round(&mut self) -> GameResult<&ScratchCard> {
        if self.in_flight.is_some() {
            return Err(GameError::RoundInProgress);
        }
        let (card, next) = round::start_round(&self.state, &mut self.rng)?;
        self.commit(next)?;
        Ok(self.in_flight.insert(card))
    }

    pub fn reveal(&mut self, block: u8) -> GameResult<Reveal> {
        let card = self.in_flight.as_mut().ok_or(GameError::NoRoundInProgress)?;
        let winning_line = card.reveal(block)?;
        let symbol = card.symbol_at(block).ok_or(GameError::InvalidBlock(block))?;
        Ok(Reveal {
            block,
            symbol,
            winning_line,
            fully_revealed: card.is_fully_revealed(),
        })
    }

    /// Finishes the in-flight card and applies its prize.
    pub fn complete_round(&mut self) -> GameResult<ScratchCard> {
        let mut card = self.in_flight.take().ok_or(GameError::NoRoundInProgress)?;
        card.reveal_all();
        card.is_completed = true;
        let next = round::complete_round(&card, &self.state);
        if let Err(e) = self.commit(next) {
            self.in_flight = Some(card);
            return Err(e);
        }
        debug!(card = %card.id, won = card.has_won, balance = %self.state.balance, "round completed");
        Ok(card)
    }

    pub fn add_balance(&mut self, amount: Money) -> GameResult<&GameState> {
        let next = round::add_balance(&self.state, amount);
        self.commit(next)?;
        Ok(&self.state)
    }

    /// Credits the iPhone value once the player has acknowledged the win.
    pub fn acknowledge_iphone_win(&mut self) -> GameResult<&GameState> {
        if !self.state.iphone_credit_pending {
            return Err(GameError::NoPendingIphone);
        }
        let next = GameState {
            iphone_credit_pending: false,
            ..round::add_balance(&self.state, IPHONE_PRIZE_VALUE)
        };
        self.commit(next)?;
        info!(amount = %IPHONE_PRIZE_VALUE, "iPhone win credited");
        Ok(&self.state)
    }

    /// Validates the amount and issues a fictional PIX charge. Nothing is credited yet.
    pub fn request_deposit(&mut self, amount: Money, now: DateTime<Utc>) -> GameResult<FictionalPix> {
        if amount < MIN_DEPOSIT {
            return Err(GameError::DepositTooSmall {
                amount,
                minimum: MIN_DEPOSIT,
            });
        }
        let pix = create_fictional_pix(amount, &mut self.rng, now);
        info!(transaction = %pix.transaction_id, %amount, "pix charge issued");
        Ok(pix)
    }

    /// Simulated payment confirmation; always succeeds.
    pub fn confirm_deposit(&mut self, pix: &FictionalPix) -> GameResult<&GameState> {
        info!(transaction = %pix.transaction_id, amount = %pix.amount, "deposit confirmed");
        self.add_balance(pix.amount)
    }

    pub fn complete_kyc_step1(&mut self, data: KycData) -> GameResult<&GameState> {
        let next = round::complete_kyc_step1(&self.state, data);
        self.commit(next)?;
        Ok(&self.state)
    }

    pub fn complete_kyc_step2(&mut self) -> GameResult<&GameState> {
        let next = round::complete_kyc_step2(&self.state);
        self.commit(next)?;
        Ok(&self.state)
    }

    /// Wipes the persisted record and starts over.
    pub fn reset(&mut self) -> GameResult<()> {
        self.store.clear()?;
        self.state = GameState::default();
        self.in_flight = None;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn deal(&mut self, card: ScratchCard) {
        self.in_flight = Some(card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::generate_winning_card;
    use crate::error::StoreError;
    use crate::outcome::PrizeType;
    use crate::rng::FixedSequence;
    use crate::store::{FileStore, MemoryStore};

    struct FailingStore;

    impl GameStore for FailingStore {
        fn load(&self) -> Option<GameState> {
            Some(GameState::with_balance(Money::from_reais(10)))
        }
        fn save(&self, _: &GameState) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    fn funded(reais: u64) -> RoundController<MemoryStore, FixedSequence> {
        let store = MemoryStore::new();
        store.save(&GameState::with_balance(Money::from_reais(reais))).unwrap();
        RoundController::open(store, FixedSequence::new(vec![0.42, 0.13, 0.77]))
    }

    #[test]
    fn test_one_card_in_flight() {
        let mut game = funded(20);
        game.start_round().unwrap();
        assert!(matches!(game.start_round(), Err(GameError::RoundInProgress)));
        game.complete_round().unwrap();
        assert!(matches!(game.complete_round(), Err(GameError::NoRoundInProgress)));
        game.start_round().unwrap();
        assert_eq!(game.state().scratch_cards_used, 2);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut game = funded(10);
        game.start_round().unwrap();
        assert_eq!(game.store().load().unwrap().balance, Money::from_cents(510));
        game.add_balance(Money::from_reais(1)).unwrap();
        assert_eq!(game.store().load().as_ref(), Some(game.state()));
    }

    #[test]
    fn test_failed_save_leaves_state_untouched() {
        let mut game = RoundController::open(FailingStore, FixedSequence::repeat(0.5));
        let err = game.start_round().unwrap_err();
        assert!(matches!(err, GameError::Persistence(_)));
        assert_eq!(game.state().balance, Money::from_reais(10));
        assert!(game.current_card().is_none());
    }

    #[test]
    fn test_iphone_credit_needs_acknowledgement() {
        let mut game = funded(0);
        assert!(matches!(game.acknowledge_iphone_win(), Err(GameError::NoPendingIphone)));
        let card = generate_winning_card(Money::ZERO, PrizeType::Iphone, &mut FixedSequence::repeat(0.2));
        game.deal(card);
        let done = game.complete_round().unwrap();
        assert!(done.is_completed && done.is_fully_revealed());
        assert!(game.state().has_won_iphone);
        assert_eq!(game.state().balance, Money::ZERO);
        game.acknowledge_iphone_win().unwrap();
        assert_eq!(game.state().balance, Money::from_reais(4899));
        assert!(matches!(game.acknowledge_iphone_win(), Err(GameError::NoPendingIphone)));
    }

    #[test]
    fn test_iphone_credit_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = RoundController::open(FileStore::new(dir.path()), FixedSequence::repeat(0.2));
        let card = generate_winning_card(Money::ZERO, PrizeType::Iphone, &mut FixedSequence::repeat(0.2));
        game.deal(card);
        game.complete_round().unwrap();
        drop(game);

        let mut game = RoundController::open(FileStore::new(dir.path()), FixedSequence::repeat(0.2));
        assert!(game.has_pending_iphone());
        game.acknowledge_iphone_win().unwrap();
        assert_eq!(game.state().balance, Money::from_reais(4899));
        drop(game);

        let mut game = RoundController::open(FileStore::new(dir.path()), FixedSequence::repeat(0.2));
        assert!(!game.has_pending_iphone());
        assert!(game.state().has_won_iphone);
        assert!(matches!(game.acknowledge_iphone_win(), Err(GameError::NoPendingIphone)));
        assert_eq!(game.state().balance, Money::from_reais(4899));
    }

    #[test]
    fn test_deposit_minimum_and_credit() {
        let mut game = funded(0);
        let now = Utc::now();
        assert!(matches!(
            game.request_deposit(Money::from_reais(19), now),
            Err(GameError::DepositTooSmall { .. })
        ));
        let pix = game.request_deposit(Money::from_reais(25), now).unwrap();
        assert_eq!(game.state().balance, Money::ZERO);
        game.confirm_deposit(&pix).unwrap();
        assert_eq!(game.state().balance, Money::from_reais(25));
    }

    #[test]
    fn test_reset_clears_store() {
        let mut game = funded(50);
        game.reset().unwrap();
        assert_eq!(game.state(), &GameState::default());
        assert_eq!(game.store().load(), None);
    }
}
