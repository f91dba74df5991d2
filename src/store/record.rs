//! Access list record model

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{Error, Result};

/// How budget tokens are checked before they enter the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BudgetPolicy {
    /// Any well-formed token is stored as-is
    #[default]
    Opaque,
    /// Token must parse as a non-negative decimal number
    NonNegativeDecimal,
}

impl BudgetPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            BudgetPolicy::NonNegativeDecimal
        } else {
            BudgetPolicy::Opaque
        }
    }
}

/// One authorized identity and its budget.
///
/// Both values are kept as the exact text that was supplied; no arithmetic
/// is done on the budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub identity: String,
    pub budget: String,
}

impl Record {
    /// Build a record from request tokens, rejecting anything that would
    /// break the env file layout.
    pub fn new(identity: &str, budget: &str, policy: BudgetPolicy) -> Result<Self> {
        validate_identity(identity)?;
        validate_budget(budget, policy)?;
        Ok(Self {
            identity: identity.to_string(),
            budget: budget.to_string(),
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User: {}, Budget: {}", self.identity, self.budget)
    }
}

pub fn validate_identity(identity: &str) -> Result<()> {
    check_token("identity", identity)
}

pub fn validate_budget(budget: &str, policy: BudgetPolicy) -> Result<()> {
    check_token("budget", budget)?;

    if policy == BudgetPolicy::NonNegativeDecimal {
        let negative = match Decimal::from_str(budget) {
            Ok(value) => value.is_sign_negative() && !value.is_zero(),
            // Too many digits for a Decimal, but still a number
            Err(_) if is_decimal_literal(budget) => {
                budget.starts_with('-') && budget.bytes().any(|b| matches!(b, b'1'..=b'9'))
            }
            Err(e) => {
                return Err(Error::invalid_argument(
                    "budget",
                    budget,
                    format!("not a number ({})", e),
                ));
            }
        };
        if negative {
            return Err(Error::invalid_argument("budget", budget, "must not be negative"));
        }
    }

    Ok(())
}

/// `[+-]digits[.digits]`, with at least one digit
fn is_decimal_literal(token: &str) -> bool {
    let unsigned = token.strip_prefix(['+', '-']).unwrap_or(token);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(int.is_empty() && frac.is_empty())
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// Tokens end up inside a `KEY=a,b,c` line, so separators, quotes and
/// line breaks are off limits.
fn check_token(field: &'static str, token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(Error::invalid_argument(field, token, "must not be empty"));
    }
    if let Some(c) = token
        .chars()
        .find(|c| matches!(c, ',' | '=' | '"' | '\'') || c.is_whitespace() || c.is_control())
    {
        return Err(Error::invalid_argument(
            field,
            token,
            format!("contains forbidden character {:?}", c),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_display_matches_listing_format() {
        let record = Record::new("42", "10", BudgetPolicy::Opaque).unwrap();
        assert_eq!(record.to_string(), "User: 42, Budget: 10");
    }

    #[test]
    fn test_opaque_budget_accepts_any_token() {
        assert!(Record::new("42", "unlimited", BudgetPolicy::Opaque).is_ok());
        assert!(Record::new("42", "-5", BudgetPolicy::Opaque).is_ok());
    }

    #[test]
    fn test_strict_budget_requires_non_negative_number() {
        let strict = BudgetPolicy::NonNegativeDecimal;
        assert!(Record::new("42", "10", strict).is_ok());
        assert!(Record::new("42", "12.50", strict).is_ok());
        assert!(Record::new("42", "0", strict).is_ok());

        let err = Record::new("42", "-1", strict).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(Record::new("42", "lots", strict).is_err());
    }

    #[test]
    fn test_strict_budget_beyond_decimal_range() {
        let strict = BudgetPolicy::NonNegativeDecimal;
        assert!(Record::new("42", "100000000000000000000000000000", strict).is_ok());
        assert!(Record::new("42", "0.0000000000000000000000000000001", strict).is_ok());

        let err = Record::new("42", "-100000000000000000000000000000", strict).unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
        assert!(Record::new("42", "-000000000000000000000000000000.0", strict).is_ok());
        assert!(Record::new("42", "1.2.3", strict).is_err());
        assert!(Record::new("42", ".", strict).is_err());
    }

    #[test]
    fn test_separators_are_rejected() {
        for bad in ["4,2", "a=b", "4 2", "x\ny", "\"42\""] {
            let err = Record::new(bad, "1", BudgetPolicy::Opaque).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidArgument, "identity {:?}", bad);
        }
        assert!(Record::new("42", "1,5", BudgetPolicy::Opaque).is_err());
        assert!(Record::new("", "1", BudgetPolicy::Opaque).is_err());
    }
}
