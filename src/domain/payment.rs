use bigdecimal::BigDecimal;

/// Authoritative view of a provider checkout session, with its line items.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    pub id: String,
    pub payment_status: String,
    /// Total charged, in minor currency units.
    pub amount_total: Option<i64>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub line_items: Vec<PaymentLineItem>,
}

impl PaymentSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// One purchased line as the provider recorded it. Products are identified
/// by display name only.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLineItem {
    pub product_name: String,
    pub quantity: Option<i64>,
    /// Unit price in minor currency units.
    pub unit_amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_amount: i64,
    pub quantity: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub currency: String,
    pub lines: Vec<CheckoutLine>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// Converts minor currency units to a two-decimal amount.
pub fn from_minor_units(amount: i64) -> BigDecimal {
    (BigDecimal::from(amount) / BigDecimal::from(100)).with_scale(2)
}

/// Longest digit string accepted for an amount. Real prices need far fewer.
const MAX_AMOUNT_DIGITS: u64 = 38;

/// Converts a decimal amount to minor currency units, rounded to the nearest unit.
///
/// Returns `None` when the amount cannot fit in `i64` minor units. The bound is
/// checked on digit count and exponent before any arithmetic, so amounts such
/// as `1e100000000` are rejected without being expanded.
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    use bigdecimal::ToPrimitive;

    let digits = amount.digits();
    if digits > MAX_AMOUNT_DIGITS {
        return None;
    }
    let (_, scale) = amount.as_bigint_and_exponent();
    // |amount| < 10^magnitude
    let magnitude = i64::try_from(digits).ok()?.checked_sub(scale)?;
    if magnitude > 17 {
        return None;
    }
    if magnitude < -2 {
        // Below a tenth of a minor unit.
        return Some(0);
    }

    (amount.clone() * BigDecimal::from(100)).round(0).to_i64()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn minor_units_convert_to_two_decimals() {
        assert_eq!(from_minor_units(1999).to_string(), "19.99");
        assert_eq!(from_minor_units(500).to_string(), "5.00");
        assert_eq!(from_minor_units(0).to_string(), "0.00");
    }

    #[test]
    fn decimal_amounts_round_to_nearest_cent() {
        let price = BigDecimal::from_str("19.995").unwrap();
        assert_eq!(to_minor_units(&price), Some(2000));

        let price = BigDecimal::from_str("4.5").unwrap();
        assert_eq!(to_minor_units(&price), Some(450));
    }

    #[test]
    fn oversized_amounts_are_rejected_without_expansion() {
        for raw in ["1e100000000", "1e20", "123456789012345678901234567890123456789"] {
            let price = BigDecimal::from_str(raw).unwrap();
            assert_eq!(to_minor_units(&price), None, "{raw}");
        }

        let largest = BigDecimal::from_str("92233720368547758.07").unwrap();
        assert_eq!(to_minor_units(&largest), Some(i64::MAX));
    }

    #[test]
    fn vanishing_amounts_round_to_zero() {
        let price = BigDecimal::from_str("1e-100000000").unwrap();
        assert_eq!(to_minor_units(&price), Some(0));

        let price = BigDecimal::from_str("0.004").unwrap();
        assert_eq!(to_minor_units(&price), Some(0));
    }

    #[test]
    fn only_paid_sessions_count_as_paid() {
        let mut session = PaymentSession {
            id: "cs_test_1".to_string(),
            payment_status: "unpaid".to_string(),
            amount_total: Some(1000),
            customer_email: None,
            customer_name: None,
            line_items: vec![],
        };
        assert!(!session.is_paid());

        session.payment_status = "paid".to_string();
        assert!(session.is_paid());
    }
}
