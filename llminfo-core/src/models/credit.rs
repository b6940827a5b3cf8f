//! Canonical credit record.

use serde::{Deserialize, Serialize};

/// Credit balance for providers that sell prepaid credits.
///
/// `remaining` is derived from the other two fields and is recomputed on
/// every read, including when a record is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CreditFields", into = "CreditFields")]
pub struct CreditRecord {
    /// Total purchased credits.
    pub total_credits: f64,
    /// Credits consumed so far.
    pub usage: f64,
}

impl CreditRecord {
    /// Creates a record from total and usage.
    pub fn new(total_credits: f64, usage: f64) -> Self {
        Self {
            total_credits,
            usage,
        }
    }

    /// Remaining credits. Negative when usage exceeds the total.
    pub fn remaining(&self) -> f64 {
        self.total_credits - self.usage
    }

    /// Returns true if usage has exceeded the purchased credits.
    pub fn is_overdrawn(&self) -> bool {
        self.remaining() < 0.0
    }
}

#[derive(Serialize, Deserialize)]
struct CreditFields {
    #[serde(default)]
    total_credits: f64,
    #[serde(default)]
    usage: f64,
    #[serde(default)]
    remaining: f64,
}

impl From<CreditFields> for CreditRecord {
    fn from(fields: CreditFields) -> Self {
        Self::new(fields.total_credits, fields.usage)
    }
}

impl From<CreditRecord> for CreditFields {
    fn from(record: CreditRecord) -> Self {
        Self {
            total_credits: record.total_credits,
            usage: record.usage,
            remaining: record.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_is_not_clamped() {
        let cases = [(10.0, 2.5), (10.0, 10.0), (5.0, 7.25), (0.0, 3.0), (0.0, 0.0)];
        for (total, usage) in cases {
            let credits = CreditRecord::new(total, usage);
            assert_eq!(credits.remaining(), total - usage, "total={total} usage={usage}");
        }

        let overdrawn = CreditRecord::new(5.0, 7.25);
        assert!(overdrawn.is_overdrawn());
        assert_eq!(overdrawn.remaining(), -2.25);
    }

    #[test]
    fn test_remaining_recomputed_on_deserialize() {
        let record: CreditRecord =
            serde_json::from_str(r#"{"total_credits": 20.0, "usage": 5.0, "remaining": 999.0}"#)
                .unwrap();
        assert_eq!(record.remaining(), 15.0);

        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["remaining"], 15.0);
    }
}
