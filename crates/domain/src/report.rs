//! Revenue report over committed sales.

use common::Money;
use serde::Serialize;
use store::PaymentMethodTotal;

/// Payment method label the front office records for cash sales.
pub const CASH_PAYMENT_METHOD: &str = "DINHEIRO";

/// Payment method label the front office records for PIX transfers.
pub const PIX_PAYMENT_METHOD: &str = "PIX";

/// Revenue of committed sales in a time window, grouped by payment method.
///
/// Cash and PIX get dedicated totals because the back office reconciles
/// those two daily; both are present even when zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueReport {
    pub by_payment_method: Vec<PaymentMethodTotal>,
    pub cash_total: Money,
    pub pix_total: Money,
    pub cash_and_pix_total: Money,
}

impl RevenueReport {
    /// Builds the report from per-method rows, normalizing payment method
    /// labels to uppercase and merging rows that collide after
    /// normalization.
    pub fn from_totals(rows: Vec<PaymentMethodTotal>) -> Self {
        let mut totals: std::collections::BTreeMap<String, i64> = std::collections::BTreeMap::new();
        for row in rows {
            *totals.entry(row.payment_method.to_uppercase()).or_default() += row.total.cents();
        }

        let cash_total = Money::from_cents(totals.get(CASH_PAYMENT_METHOD).copied().unwrap_or(0));
        let pix_total = Money::from_cents(totals.get(PIX_PAYMENT_METHOD).copied().unwrap_or(0));

        RevenueReport {
            by_payment_method: totals
                .into_iter()
                .map(|(payment_method, cents)| PaymentMethodTotal {
                    payment_method,
                    total: Money::from_cents(cents),
                })
                .collect(),
            cash_total,
            pix_total,
            cash_and_pix_total: cash_total + pix_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(method: &str, cents: i64) -> PaymentMethodTotal {
        PaymentMethodTotal {
            payment_method: method.to_string(),
            total: Money::from_cents(cents),
        }
    }

    #[test]
    fn report_merges_methods_case_insensitively() {
        let report = RevenueReport::from_totals(vec![
            row("pix", 1000),
            row("PIX", 500),
            row("DINHEIRO", 2000),
            row("CARTAO", 700),
        ]);

        assert_eq!(report.pix_total.cents(), 1500);
        assert_eq!(report.cash_total.cents(), 2000);
        assert_eq!(report.cash_and_pix_total.cents(), 3500);
        assert_eq!(report.by_payment_method.len(), 3);
    }

    #[test]
    fn report_is_zeroed_when_no_rows() {
        let report = RevenueReport::from_totals(vec![]);
        assert!(report.by_payment_method.is_empty());
        assert!(report.cash_total.is_zero());
        assert!(report.pix_total.is_zero());
        assert!(report.cash_and_pix_total.is_zero());
    }
}
