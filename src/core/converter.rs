//! Conversion of resolved rows into domain transactions
//!
//! A total, pure function over well-formed input: by construction it only
//! receives rows that passed validation and resolution, so it has no error
//! path of its own. Any panic here would indicate an invariant violation
//! upstream, not bad user input.

use crate::core::resolver::ResolvedRow;
use crate::types::{Transaction, TransactionKind};

/// Map a unique, resolved row into the destination transaction representation
///
/// The amount's sign becomes the transaction kind; the stored amount is the
/// absolute magnitude.
pub fn convert(row: ResolvedRow) -> Transaction {
    let kind = if row.amount.is_sign_negative() {
        TransactionKind::Debit
    } else {
        TransactionKind::Credit
    };

    Transaction {
        kind,
        amount: row.amount.abs(),
        currency: row.currency,
        date: row.date,
        description: row.description,
        account: row.account,
        category: row.category,
        source_row: row.index,
    }
}
