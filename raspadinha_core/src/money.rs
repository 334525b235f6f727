use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Amount in centavos. Serialized as a decimal number of reais (`5.1`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    pub const fn from_reais(reais: u64) -> Self {
        Money(reais * 100)
    }

    /// Rounds to the nearest centavo. `None` for negative or non-finite input.
    pub fn from_decimal(reais: f64) -> Option<Self> {
        if !reais.is_finite() || reais < 0.0 {
            return None;
        }
        let cents = (reais * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Money(cents as u64))
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {},{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let reais = f64::deserialize(deserializer)?;
        Money::from_decimal(reais)
            .ok_or_else(|| de::Error::custom(format!("invalid currency amount: {reais}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_centavo_arithmetic() {
        let balance = Money::from_reais(10);
        let cost = Money::from_cents(490);
        assert_eq!(balance.checked_sub(cost), Some(Money::from_cents(510)));
        assert_eq!(Money::from_cents(400).checked_sub(cost), None);
    }

    #[test]
    fn test_decimal_rounding() {
        assert_eq!(Money::from_decimal(4.9), Some(Money::from_cents(490)));
        assert_eq!(Money::from_decimal(0.1 + 0.2), Some(Money::from_cents(30)));
        assert_eq!(Money::from_decimal(-1.0), None);
        assert_eq!(Money::from_decimal(f64::NAN), None);
    }

    #[test]
    fn test_display_brl() {
        assert_eq!(Money::from_cents(510).to_string(), "R$ 5,10");
        assert_eq!(Money::from_reais(4899).to_string(), "R$ 4899,00");
    }

    #[test]
    fn test_serde_as_reais() {
        let json = serde_json::to_string(&Money::from_cents(510)).unwrap();
        assert_eq!(json, "5.1");
        let back: Money = serde_json::from_str("20").unwrap();
        assert_eq!(back, Money::from_reais(20));
        assert!(serde_json::from_str::<Money>("-3.5").is_err());
    }
}
