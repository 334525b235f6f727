use crate::{
    money::Money,
    outcome::{decide_outcome, display_chance, PrizeType, CARD_COST, FIRST_RANDOM_ROUND},
    rng::RandomSource,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoundRecord {
    pub round: u32,
    pub displayed_chance: u8,
    pub won: bool,
    pub prize_type: Option<PrizeType>,
    pub prize_amount: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub rounds: u32,
    pub wins: u32,
    pub late_rounds: u32,
    pub late_wins: u32,
    pub total_staked: Money,
    pub total_prizes: Money,
    pub records: Vec<RoundRecord>,
}

impl SimulationReport {
    /// Observed win rate over the randomly decided rounds.
    pub fn late_win_rate(&self) -> f64 {
        if self.late_rounds == 0 {
            return 0.0;
        }
        self.late_wins as f64 / self.late_rounds as f64
    }

    pub fn return_to_player(&self) -> f64 {
        if self.total_staked == Money::ZERO {
            return 0.0;
        }
        self.total_prizes.as_decimal() / self.total_staked.as_decimal()
    }
}

/// Plays the outcome schedule for rounds `1..=rounds` without touching any game state.
pub fn simulate<R: RandomSource + ?Sized>(rounds: u32, rng: &mut R) -> SimulationReport {
    let mut report = SimulationReport {
        rounds,
        wins: 0,
        late_rounds: 0,
        late_wins: 0,
        total_staked: Money::ZERO,
        total_prizes: Money::ZERO,
        records: Vec::with_capacity(rounds as usize),
    };
    for round in 1..=rounds {
        let displayed_chance = display_chance(round, rng);
        let outcome = decide_outcome(round, rng);
        report.total_staked += CARD_COST;
        if round >= FIRST_RANDOM_ROUND {
            report.late_rounds += 1;
        }
        if outcome.should_win {
            report.wins += 1;
            report.total_prizes += outcome.prize_amount;
            if round >= FIRST_RANDOM_ROUND {
                report.late_wins += 1;
            }
        }
        report.records.push(RoundRecord {
            round,
            displayed_chance,
            won: outcome.should_win,
            prize_type: outcome.should_win.then_some(outcome.prize_type),
            prize_amount: if outcome.should_win {
                outcome.prize_amount
            } else {
                Money::ZERO
            },
        });
    }
    report
}
