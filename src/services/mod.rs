pub mod appointments;
pub mod billing;
pub mod catalog;
pub mod clients;
pub mod clinics;
pub mod dashboard;
pub mod invoices;
pub mod notifications;
pub mod pets;
pub mod products;
pub mod ticket;
pub mod today_turns;
pub mod vaccinations;
pub mod visits;

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};
use validator::ValidationError;

/// One-based page coordinates already clamped by the handler layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Zero-based index for `Paginator::fetch_page`.
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// Case-insensitive substring match over any of `columns`.
pub(crate) fn search_condition<C>(term: &str, columns: &[C]) -> Condition
where
    C: ColumnTrait,
{
    let pattern = format!("%{}%", term.trim().to_lowercase());
    columns.iter().fold(Condition::any(), |cond, column| {
        let lowered: SimpleExpr = Func::lower(Expr::col(*column)).into();
        cond.add(Expr::expr(lowered).like(pattern.clone()))
    })
}

/// Blank strings from form inputs are treated as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// At most two decimal places once trailing zeros are dropped.
pub(crate) fn validate_cents(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > 2 {
        let mut err = ValidationError::new("scale");
        err.message = Some("must have at most two decimal places".into());
        return Err(err);
    }
    Ok(())
}

fn validate_money_ceiling(value: &Decimal) -> Result<(), ValidationError> {
    if *value > billing::MAX_MONEY {
        let mut err = ValidationError::new("max_amount");
        err.message = Some(format!("must not exceed {}", billing::MAX_MONEY).into());
        return Err(err);
    }
    validate_cents(value)
}

/// Non-negative amount that fits a money column.
pub(crate) fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    validate_money_ceiling(value)
}

/// Strictly positive amount that fits a money column.
pub(crate) fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("must be greater than zero".into());
        return Err(err);
    }
    validate_money_ceiling(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn page_request_is_clamped() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.index(), 0);
        assert_eq!(PageRequest::new(3, 25).index(), 2);
    }

    #[test]
    fn money_must_fit_the_column() {
        assert!(validate_money(&dec!(12.50)).is_ok());
        assert!(validate_money(&dec!(12.500)).is_ok());
        assert!(validate_money(&billing::MAX_MONEY).is_ok());
        assert!(validate_money(&dec!(-0.01)).is_err());
        assert!(validate_money(&dec!(12.345)).is_err());
        assert!(validate_money(&dec!(10_000_000_000)).is_err());
        assert!(validate_money(&Decimal::MAX).is_err());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&Decimal::MAX).is_err());
    }

    #[test]
    fn blank_strings_are_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" Rex ".into())), Some("Rex".into()));
        assert_eq!(non_blank(None), None);
    }
}
