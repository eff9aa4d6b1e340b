//! Validation for transactions entered by the user.
//!
//! The store and the view layer accept whatever they are given, so entry
//! points such as an add-transaction screen should run their raw input
//! through [TransactionForm::validate] first.

use serde::Deserialize;

use crate::{Error, transaction::TransactionType};

/// The raw input for a new transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionForm {
    /// The amount as typed, e.g. "12.50".
    pub amount: String,
    /// What the transaction was for.
    pub description: String,
    /// The label used to group the transaction.
    pub category: String,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

/// A [TransactionForm] that has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransaction {
    /// A finite amount greater than zero.
    pub amount: f64,
    /// The trimmed, non-empty description.
    pub description: String,
    /// The trimmed, non-empty category.
    pub category: String,
    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,
}

impl TransactionForm {
    /// Check the form and convert it into values ready to be stored.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the amount is not a finite number greater than zero,
    /// - [Error::EmptyDescription] if the description is blank,
    /// - or [Error::EmptyCategory] if the category is blank.
    pub fn validate(self) -> Result<ValidatedTransaction, Error> {
        let amount = parse_amount(&self.amount)?;

        let description = self.description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(ValidatedTransaction {
            amount,
            description: description.to_owned(),
            category: category.to_owned(),
            transaction_type: self.transaction_type,
        })
    }
}

fn parse_amount(text: &str) -> Result<f64, Error> {
    match text.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount(text.to_owned())),
    }
}
