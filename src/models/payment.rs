//! Fines and payments

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{FineStatus, PaymentMethod};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub borrow_record_id: Option<i64>,
    pub amount: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: FineStatus,
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Fine {
    pub fn is_outstanding(&self) -> bool {
        self.status == FineStatus::Pending
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FineSummary {
    #[serde(default)]
    pub total_outstanding: Decimal,
    #[serde(default)]
    pub total_paid: Decimal,
    #[serde(default)]
    pub total_waived: Decimal,
    #[serde(default)]
    pub outstanding_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayFineRequest {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaiveFineRequest {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_fine_amounts_parse_as_decimal() {
        let fine: Fine = serde_json::from_value(json!({
            "id": 4,
            "userId": 9,
            "amount": "2.50",
            "status": "PENDING",
            "issuedAt": "2026-10-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(fine.amount, Decimal::from_str("2.50").unwrap());
        assert!(fine.is_outstanding());
    }
}
