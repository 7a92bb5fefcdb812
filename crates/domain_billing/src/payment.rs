//! Invoice payment status
//!
//! ```text
//! pending ──▶ paid
//!    │  └───▶ cancelled
//!    ▼
//! overdue ──▶ paid | cancelled
//! ```
//!
//! `paid` and `cancelled` are terminal.

use serde::{Deserialize, Serialize};

/// Payment method recorded when an invoice is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    Check,
    DigitalWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Check => "check",
            PaymentMethod::DigitalWallet => "digital_wallet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "credit_card" => Some(PaymentMethod::CreditCard),
            "debit_card" => Some(PaymentMethod::DebitCard),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "check" => Some(PaymentMethod::Check),
            "digital_wallet" => Some(PaymentMethod::DigitalWallet),
            _ => None,
        }
    }
}

/// Payment status of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "overdue" => Some(PaymentStatus::Overdue),
            "cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Cancelled)
    }

    /// Returns true if the machine allows moving to `next`
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Overdue) | (Pending, Cancelled) | (Overdue, Paid) | (Overdue, Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Overdue));
        assert!(Overdue.can_transition_to(Paid));
        assert!(!Overdue.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Paid));
    }

    #[test]
    fn test_terminal() {
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(!PaymentStatus::Overdue.is_terminal());
    }

    #[test]
    fn test_method_strings() {
        assert_eq!(PaymentMethod::parse("bank_transfer"), Some(PaymentMethod::BankTransfer));
        assert_eq!(PaymentMethod::parse("barter"), None);
    }
}
