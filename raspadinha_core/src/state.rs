use crate::money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KycData {
    pub cpf: String,
    pub full_name: String,
    pub birth_date: String,
}

/// Everything persisted for one player. Field names match the stored record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub balance: Money,
    pub scratch_cards_used: u32,
    pub has_won_iphone: bool,
    pub kyc_verified: bool,
    pub kyc_step1_complete: bool,
    pub kyc_step2_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_data: Option<KycData>,
    /// iPhone won but not yet credited. Omitted from the record while false.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub iphone_credit_pending: bool,
}

impl GameState {
    pub fn with_balance(balance: Money) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Saturates at `u32::MAX`; `start_round` refuses to deal past that point.
    pub fn next_round(&self) -> u32 {
        self.scratch_cards_used.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_field_names() {
        let state = GameState::with_balance(Money::from_cents(510));
        let v = serde_json::to_value(&state).unwrap();
        assert_eq!(v["balance"], serde_json::json!(5.1));
        assert_eq!(v["scratchCardsUsed"], serde_json::json!(0));
        assert!(v.get("kycStep1Complete").is_some());
        assert!(v.get("kycData").is_none());
        assert!(v.get("iphoneCreditPending").is_none());
    }

    #[test]
    fn test_reads_record_with_kyc_data() {
        let raw = r#"{"balance":20,"scratchCardsUsed":2,"hasWonIphone":false,
            "kycVerified":false,"kycStep1Complete":true,"kycStep2Complete":false,
            "kycData":{"cpf":"123.456.789-09","fullName":"Maria Silva","birthDate":"01/02/1990"}}"#;
        let state: GameState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.balance, Money::from_reais(20));
        assert_eq!(state.next_round(), 3);
        assert!(!state.iphone_credit_pending);
        assert_eq!(state.kyc_data.unwrap().full_name, "Maria Silva");
    }

    #[test]
    fn test_pending_iphone_credit_is_stored() {
        let state = GameState {
            has_won_iphone: true,
            iphone_credit_pending: true,
            ..GameState::default()
        };
        let v = serde_json::to_value(&state).unwrap();
        assert_eq!(v["iphoneCreditPending"], serde_json::json!(true));
        let back: GameState = serde_json::from_value(v).unwrap();
        assert_eq!(back, state);
    }
}
