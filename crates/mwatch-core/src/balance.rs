//! Account balance parsing.
//!
//! The page renders the balance with currency decorations and thousands
//! separators (e.g. `"NGN 1,000.00"`). The stake sent back to the page is
//! the bare decimal text (`"1000.00"`).

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parsed balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Stake text to type into the page, separators removed.
    pub stake: String,
    /// Numeric amount.
    pub amount: Decimal,
}

impl Balance {
    /// Balance used whenever the text cannot be parsed.
    pub fn zero() -> Self {
        Self {
            stake: "0".to_string(),
            amount: Decimal::ZERO,
        }
    }

    /// Whether there is anything to stake.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// Parse balance text.
///
/// Picks the longest run of digits, commas and dots that contains at least
/// one digit, drops the commas and trailing separators, and parses the rest.
/// Falls back to [`Balance::zero`].
pub fn parse_balance(text: &str) -> Balance {
    let Some(run) = longest_numeric_run(text) else {
        return Balance::zero();
    };

    let cleaned: String = run.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_end_matches('.');

    match Decimal::from_str(cleaned) {
        Ok(amount) => Balance {
            stake: cleaned.to_string(),
            amount,
        },
        Err(_) => Balance::zero(),
    }
}

fn longest_numeric_run(text: &str) -> Option<&str> {
    text.split(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .filter(|run| run.chars().any(|c| c.is_ascii_digit()))
        .fold(None, |best: Option<&str>, run| match best {
            Some(b) if b.len() >= run.len() => Some(b),
            _ => Some(run),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_thousands_separator_dropped() {
        let balance = parse_balance("1,000.00");
        assert_eq!(balance.stake, "1000.00");
        assert_eq!(balance.amount, dec!(1000.00));
        assert!(balance.is_positive());
    }

    #[test]
    fn test_currency_decoration() {
        let balance = parse_balance("NGN 12,345.67");
        assert_eq!(balance.stake, "12345.67");
    }

    #[test]
    fn test_longest_run_wins() {
        // "1" from the label loses to the actual amount
        let balance = parse_balance("Wallet 1: 2,500.50 NGN");
        assert_eq!(balance.stake, "2500.50");
    }

    #[test]
    fn test_dots_without_digits_ignored() {
        let balance = parse_balance("Bal... 5");
        assert_eq!(balance.stake, "5");
    }

    #[test]
    fn test_trailing_period() {
        let balance = parse_balance("Balance is 40.");
        assert_eq!(balance.stake, "40");
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(parse_balance(""), Balance::zero());
        assert_eq!(parse_balance("--"), Balance::zero());
        assert_eq!(parse_balance("1.2.3"), Balance::zero());
        assert!(!parse_balance("0.00").is_positive());
    }
}
