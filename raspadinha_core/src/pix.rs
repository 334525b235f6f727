//! Fictional PIX charges used by the simulated deposit flow.
//!
//! The generated code only looks like a BR Code; it is never payable and no
//! provider is contacted. Deposits are credited on a fixed timer instead.

use crate::{money::Money, rng::RandomSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_DEPOSIT: Money = Money::from_reais(20);

/// Delay after which a simulated payment is treated as settled.
pub const PAYMENT_CONFIRMATION_DELAY: Duration = Duration::from_secs(5);

const BR_CODE_PREFIX: &str = "00020126580014br.gov.bcb.pix";
const MERCHANT_NAME: &str = "RASPADINHA PRO LTDA";
const MERCHANT_CITY: &str = "SAO PAULO";
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FictionalPix {
    pub qrcode: String,
    pub amount: Money,
    pub transaction_id: String,
}

fn base36<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.pick(BASE36.len())] as char)
        .collect()
}

pub fn create_fictional_pix<R: RandomSource + ?Sized>(
    amount: Money,
    rng: &mut R,
    now: DateTime<Utc>,
) -> FictionalPix {
    let transaction_id = format!(
        "TXN{}{}",
        now.timestamp_millis(),
        base36(rng, 7).to_uppercase()
    );
    let merchant = base36(rng, 13);
    let checksum = base36(rng, 4).to_uppercase();
    let qrcode = format!(
        "{BR_CODE_PREFIX}0114+{merchant}52040000530398654{cents:03}5802BR5925{MERCHANT_NAME}6009{MERCHANT_CITY}62{len}05{transaction_id}6304{checksum}",
        cents = amount.cents(),
        len = transaction_id.len(),
    );
    FictionalPix {
        qrcode,
        amount,
        transaction_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::EntropySource;
    use chrono::TimeZone;

    #[test]
    fn test_code_shape() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let pix = create_fictional_pix(Money::from_cents(2550), &mut EntropySource::seeded(5), now);
        assert!(pix.transaction_id.starts_with("TXN1700000000000"));
        assert_eq!(pix.transaction_id.len(), 3 + 13 + 7);
        assert!(pix.qrcode.starts_with(BR_CODE_PREFIX));
        assert!(pix.qrcode.contains("2550"));
        assert!(pix.qrcode.contains("RASPADINHA PRO LTDA"));
        assert!(pix.qrcode.contains(&pix.transaction_id));
        assert_eq!(pix.amount, Money::from_cents(2550));
    }
}
