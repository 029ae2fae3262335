//! Invoice arithmetic shared by invoice creation, payments and the seed tool.
//!
//! All amounts are `Decimal`; percentages are expressed as 0..=100.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::InvoiceStatus;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Largest amount a `decimal(12, 2)` money column holds.
pub const MAX_MONEY: Decimal = dec!(9_999_999_999.99);

/// Computed money fields of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Rounds to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn within_money_range(value: Decimal) -> Option<Decimal> {
    (value.abs() <= MAX_MONEY).then_some(value)
}

/// `None` when the amount does not fit a money column.
pub fn checked_money_add(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_add(b).map(round_money).and_then(within_money_range)
}

/// `None` when the amount does not fit a money column.
pub fn line_total(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .map(round_money)
        .and_then(within_money_range)
}

/// `total = max(0, subtotal - discount) * (1 + tax_rate / 100)`, tax rounded to cents.
///
/// Returns `None` when the subtotal or the total does not fit a money column.
pub fn compute_totals<I>(
    line_totals: I,
    discount: Decimal,
    tax_rate: Decimal,
) -> Option<InvoiceTotals>
where
    I: IntoIterator<Item = Decimal>,
{
    let subtotal = line_totals
        .into_iter()
        .try_fold(Decimal::ZERO, checked_money_add)?;
    let taxable = subtotal.checked_sub(discount)?.max(Decimal::ZERO);
    let tax_amount = round_money(taxable.checked_mul(tax_rate)?.checked_div(ONE_HUNDRED)?);
    let total = checked_money_add(taxable, tax_amount)?;

    Some(InvoiceTotals {
        subtotal,
        discount,
        tax_rate,
        tax_amount,
        total,
    })
}

/// Status of an issued invoice given what has been collected so far.
pub fn reconcile_status(total: Decimal, paid: Decimal) -> InvoiceStatus {
    if paid >= total {
        InvoiceStatus::Paid
    } else if paid > Decimal::ZERO {
        InvoiceStatus::PartiallyPaid
    } else {
        InvoiceStatus::Issued
    }
}

/// On-hand count after selling `quantity` units. Never negative.
pub fn stock_after_sale(before: i32, quantity: i32) -> i32 {
    before.saturating_sub(quantity).max(0)
}

/// `PREFIX-YYYYMMDD-NNNN`
pub fn format_invoice_number(prefix: &str, issue_date: NaiveDate, sequence: i32) -> String {
    format!("{}-{}-{:04}", prefix, issue_date.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn service_and_product_line_without_tax() {
        let lines = [line_total(1, dec!(25)).unwrap(), line_total(1, dec!(25)).unwrap()];
        let totals = compute_totals(lines, Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(totals.subtotal, dec!(50));
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total, dec!(50));
        assert_eq!(reconcile_status(totals.total, dec!(50)), InvoiceStatus::Paid);
    }

    #[test]
    fn discount_is_applied_before_tax() {
        let totals = compute_totals([dec!(100)], dec!(20), dec!(21)).unwrap();
        assert_eq!(totals.tax_amount, dec!(16.80));
        assert_eq!(totals.total, dec!(96.80));
    }

    #[test]
    fn discount_larger_than_subtotal_floors_at_zero() {
        let totals = compute_totals([dec!(30)], dec!(45), dec!(10)).unwrap();
        assert_eq!(totals.subtotal, dec!(30));
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn tax_is_rounded_to_cents() {
        let line = line_total(3, dec!(3.33)).unwrap();
        let totals = compute_totals([line], Decimal::ZERO, dec!(10.5)).unwrap();
        assert_eq!(totals.subtotal, dec!(9.99));
        // 9.99 * 0.105 = 1.04895
        assert_eq!(totals.tax_amount, dec!(1.05));
        assert_eq!(totals.total, dec!(11.04));
    }

    #[test]
    fn amounts_beyond_a_money_column_are_refused() {
        assert_eq!(line_total(2, Decimal::MAX), None);
        assert_eq!(line_total(2, MAX_MONEY), None);
        assert_eq!(line_total(1, MAX_MONEY), Some(MAX_MONEY));
        assert!(compute_totals([MAX_MONEY, dec!(0.01)], Decimal::ZERO, Decimal::ZERO).is_none());
        // tax pushes the total past the column
        assert!(compute_totals([MAX_MONEY], Decimal::ZERO, dec!(10)).is_none());
        assert_eq!(checked_money_add(MAX_MONEY, dec!(0.01)), None);
        assert_eq!(checked_money_add(dec!(10.10), dec!(0.25)), Some(dec!(10.35)));
    }

    #[rstest]
    #[case(dec!(50), dec!(0), InvoiceStatus::Issued)]
    #[case(dec!(50), dec!(20), InvoiceStatus::PartiallyPaid)]
    #[case(dec!(50), dec!(50), InvoiceStatus::Paid)]
    #[case(dec!(50), dec!(60), InvoiceStatus::Paid)]
    #[case(dec!(0), dec!(0), InvoiceStatus::Paid)]
    fn reconciliation_table(
        #[case] total: Decimal,
        #[case] paid: Decimal,
        #[case] expected: InvoiceStatus,
    ) {
        assert_eq!(reconcile_status(total, paid), expected);
    }

    #[rstest]
    #[case(10, 3, 7)]
    #[case(2, 5, 0)]
    #[case(0, 1, 0)]
    fn stock_is_floored(#[case] before: i32, #[case] sold: i32, #[case] after: i32) {
        assert_eq!(stock_after_sale(before, sold), after);
    }

    #[test]
    fn invoice_number_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_invoice_number("INV", date, 7), "INV-20240309-0007");
        assert_eq!(format_invoice_number("VET", date, 12345), "VET-20240309-12345");
    }

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn percent() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000).prop_map(|bp| Decimal::new(bp, 2))
    }

    proptest! {
        #[test]
        fn total_matches_closed_form(
            lines in prop::collection::vec((1i32..50, money()), 0..12),
            discount in money(),
            rate in percent(),
        ) {
            let line_totals: Vec<Decimal> =
                lines.iter().map(|(q, p)| line_total(*q, *p).unwrap()).collect();
            let totals = compute_totals(line_totals.iter().copied(), discount, rate).unwrap();

            let subtotal: Decimal = line_totals.iter().copied().sum();
            prop_assert_eq!(totals.subtotal, subtotal);

            let expected = (subtotal - discount).max(Decimal::ZERO)
                * (Decimal::ONE + rate / Decimal::ONE_HUNDRED);
            prop_assert!((totals.total - expected).abs() <= dec!(0.005));
            prop_assert!(totals.total >= Decimal::ZERO);
        }

        #[test]
        fn paid_iff_payments_cover_total(total in money(), paid in money()) {
            let status = reconcile_status(total, paid);
            prop_assert_eq!(status == InvoiceStatus::Paid, paid >= total);
            prop_assert_eq!(
                status == InvoiceStatus::PartiallyPaid,
                paid > Decimal::ZERO && paid < total
            );
        }

        #[test]
        fn stock_never_negative(before in 0i32..10_000, sold in 1i32..10_000) {
            let after = stock_after_sale(before, sold);
            prop_assert_eq!(after, (before - sold).max(0));
            prop_assert!(after >= 0);
        }
    }
}
