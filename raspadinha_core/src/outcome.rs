use crate::money::Money;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

pub const CARD_COST: Money = Money::from_cents(490);
pub const SECOND_ROUND_PRIZE: Money = Money::from_reais(20);
pub const IPHONE_PRIZE_VALUE: Money = Money::from_reais(4899);
pub const AIRPODS_PRIZE_VALUE: Money = Money::from_reais(1899);

/// Money prizes drawn uniformly once the fixed schedule runs out.
pub const MONEY_PRIZES: [Money; 4] = [
    Money::from_reais(30),
    Money::from_reais(50),
    Money::from_reais(100),
    Money::from_reais(200),
];

/// Real win probability from round 8 onwards.
pub const LATE_ROUND_WIN_PROBABILITY: f64 = 0.15;

/// First round decided by chance instead of the fixed schedule.
pub const FIRST_RANDOM_ROUND: u32 = 8;

/// Percentages shown before rounds 1..=7.
const DISPLAY_CHANCE_SCHEDULE: [u8; 7] = [25, 58, 28, 32, 30, 35, 68];
const DISPLAY_CHANCE_MIN: u8 = 25;
const DISPLAY_CHANCE_SPAN: u8 = 35;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PrizeType {
    Money,
    Iphone,
    Airpods,
}

impl PrizeType {
    /// Physical prizes carry a fixed value; money prizes carry whatever was drawn.
    pub fn fixed_value(self) -> Option<Money> {
        match self {
            PrizeType::Iphone => Some(IPHONE_PRIZE_VALUE),
            PrizeType::Airpods => Some(AIRPODS_PRIZE_VALUE),
            PrizeType::Money => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub should_win: bool,
    pub prize_amount: Money,
    pub prize_type: PrizeType,
}

impl Outcome {
    pub const fn lose() -> Self {
        Self {
            should_win: false,
            prize_amount: Money::ZERO,
            prize_type: PrizeType::Money,
        }
    }

    pub const fn win(prize_amount: Money, prize_type: PrizeType) -> Self {
        Self {
            should_win: true,
            prize_amount,
            prize_type,
        }
    }
}

/// Decides the result of round `round` (1-based). Only rounds from 8 on consume randomness.
pub fn decide_outcome<R: RandomSource + ?Sized>(round: u32, rng: &mut R) -> Outcome {
    match round {
        0 | 1 => Outcome::lose(),
        2 => Outcome::win(SECOND_ROUND_PRIZE, PrizeType::Money),
        3..=6 => Outcome::lose(),
        7 => Outcome::win(AIRPODS_PRIZE_VALUE, PrizeType::Airpods),
        _ => {
            if rng.chance(LATE_ROUND_WIN_PROBABILITY) {
                let prize = MONEY_PRIZES[rng.pick(MONEY_PRIZES.len())];
                Outcome::win(prize, PrizeType::Money)
            } else {
                Outcome::lose()
            }
        }
    }
}

/// Cosmetic "win chance" percentage shown before a round. Unrelated to `decide_outcome`.
pub fn display_chance<R: RandomSource + ?Sized>(round: u32, rng: &mut R) -> u8 {
    match round {
        1..=7 => DISPLAY_CHANCE_SCHEDULE[(round - 1) as usize],
        0 => DISPLAY_CHANCE_SCHEDULE[0],
        _ => DISPLAY_CHANCE_MIN + rng.pick(DISPLAY_CHANCE_SPAN as usize) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::FixedSequence;

    #[test]
    fn test_fixed_schedule_ignores_rng() {
        let mut rng = FixedSequence::repeat(0.0);
        assert!(!decide_outcome(1, &mut rng).should_win);
        assert_eq!(
            decide_outcome(2, &mut rng),
            Outcome::win(Money::from_reais(20), PrizeType::Money)
        );
        for r in 3..=6 {
            assert_eq!(decide_outcome(r, &mut rng), Outcome::lose());
        }
        assert_eq!(
            decide_outcome(7, &mut rng),
            Outcome::win(Money::from_reais(1899), PrizeType::Airpods)
        );
    }

    #[test]
    fn test_late_round_draws() {
        // win draw 0.10 < 0.15, prize index floor(0.6 * 4) = 2
        let mut rng = FixedSequence::new(vec![0.10, 0.6]);
        assert_eq!(
            decide_outcome(8, &mut rng),
            Outcome::win(Money::from_reais(100), PrizeType::Money)
        );
        let mut rng = FixedSequence::new(vec![0.15]);
        assert_eq!(decide_outcome(42, &mut rng), Outcome::lose());
    }

    #[test]
    fn test_display_chance_schedule() {
        let mut rng = FixedSequence::repeat(0.99);
        let shown: Vec<u8> = (1..=7).map(|r| display_chance(r, &mut rng)).collect();
        assert_eq!(shown, vec![25, 58, 28, 32, 30, 35, 68]);
        assert_eq!(display_chance(8, &mut rng), 59);
        let mut rng = FixedSequence::repeat(0.0);
        assert_eq!(display_chance(100, &mut rng), 25);
    }

    #[test]
    fn test_fixed_prize_values() {
        assert_eq!(PrizeType::Iphone.fixed_value(), Some(Money::from_reais(4899)));
        assert_eq!(PrizeType::Airpods.fixed_value(), Some(Money::from_reais(1899)));
        assert_eq!(PrizeType::Money.fixed_value(), None);
    }
}
