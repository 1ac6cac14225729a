//! Net effective amounts: what a transaction really cost or earned once its
//! linked debts are taken into account.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    amount::Amount,
    database_id::TransactionId,
    debt::DebtStatus,
    transaction::{Transaction, TransactionDebt},
};

/// Which amount of a transaction to use for a chart series.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AmountBasis {
    /// The amount as recorded, ignoring debts.
    #[default]
    Gross,
    /// The amount less its paid linked debts.
    Net,
}

fn sum_debts(debts: &[TransactionDebt], status: DebtStatus) -> Result<Amount, Error> {
    Amount::try_sum(
        debts
            .iter()
            .filter(|debt| debt.status == status)
            .map(|debt| debt.amount),
    )
}

// All of these return [Error::AmountOverflow] if a total cannot be represented.
impl Transaction {
    /// The total of the paid debts that link to this transaction.
    pub fn settled_amount(&self) -> Result<Amount, Error> {
        sum_debts(&self.debts, DebtStatus::Paid)
    }

    /// The total of the unpaid debts that link to this transaction, i.e. the
    /// offset that is expected but has not happened yet.
    pub fn anticipated_amount(&self) -> Result<Amount, Error> {
        sum_debts(&self.debts, DebtStatus::Unpaid)
    }

    /// The gross amount less the paid linked debts.
    ///
    /// Unpaid debts do not reduce the net amount.
    pub fn net_amount(&self) -> Result<Amount, Error> {
        self.amount.checked_sub(self.settled_amount()?)
    }

    /// Whether more has been settled against this transaction than it was worth.
    ///
    /// Only possible when debts were accepted past the pending amount.
    pub fn is_over_settled(&self) -> Result<bool, Error> {
        Ok(self.net_amount()?.is_negative())
    }

    /// The amount to use for `basis`.
    pub fn amount_for(&self, basis: AmountBasis) -> Result<Amount, Error> {
        match basis {
            AmountBasis::Gross => Ok(self.amount),
            AmountBasis::Net => self.net_amount(),
        }
    }
}

/// How much of a transaction is still open to be offset by new debts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAmount {
    pub transaction_id: TransactionId,
    /// The amount as recorded.
    pub gross: Amount,
    /// The total of the paid linked debts.
    pub settled: Amount,
    /// The total of the unpaid linked debts.
    pub anticipated: Amount,
    /// `gross - settled`, the largest amount a new linked debt may have.
    pub pending: Amount,
}

impl PendingAmount {
    /// Calculate the pending amount of `transaction` from its linked debts.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountOverflow] if the debts cannot be totalled.
    pub fn of(transaction: &Transaction) -> Result<Self, Error> {
        Ok(Self {
            transaction_id: transaction.id,
            gross: transaction.amount,
            settled: transaction.settled_amount()?,
            anticipated: transaction.anticipated_amount()?,
            pending: transaction.net_amount()?,
        })
    }
}


#[cfg(test)]
mod tests {
    use crate::{
        DebtStatus, EntryType, Error,
        amount::must_parse,
        reconciliation::{
            AmountBasis, PendingAmount,
            net::test_support::{debt, transaction},
        },
    };

    #[test]
    fn net_subtracts_paid_debts_only() {
        let mut groceries = transaction(1, EntryType::Outcome, "100.00", 6);
        groceries.debts = vec![
            debt(1, "30.00", DebtStatus::Paid),
            debt(2, "20.00", DebtStatus::Unpaid),
        ];

        assert_eq!(groceries.settled_amount(), Ok(must_parse("30.00")));
        assert_eq!(groceries.anticipated_amount(), Ok(must_parse("20.00")));
        assert_eq!(groceries.net_amount(), Ok(must_parse("70.00")));
        assert_eq!(groceries.is_over_settled(), Ok(false));
    }

    #[test]
    fn net_equals_gross_without_debts() {
        let rent = transaction(1, EntryType::Outcome, "1200.00", 5);

        assert_eq!(rent.net_amount(), Ok(rent.amount));
        assert_eq!(rent.amount_for(AmountBasis::Net), rent.amount_for(AmountBasis::Gross));
    }

    #[test]
    fn detects_over_settlement() {
        let mut dinner = transaction(1, EntryType::Outcome, "40.00", 9);
        dinner.debts = vec![
            debt(1, "25.00", DebtStatus::Paid),
            debt(2, "25.00", DebtStatus::Paid),
        ];

        assert_eq!(dinner.net_amount(), Ok(must_parse("-10.00")));
        assert_eq!(dinner.is_over_settled(), Ok(true));
    }

    #[test]
    fn pending_amount_breaks_down_debts() {
        let mut groceries = transaction(7, EntryType::Outcome, "100.00", 6);
        groceries.debts = vec![
            debt(1, "30.00", DebtStatus::Paid),
            debt(2, "20.00", DebtStatus::Unpaid),
        ];

        let pending = PendingAmount::of(&groceries).unwrap();

        assert_eq!(
            pending,
            PendingAmount {
                transaction_id: 7,
                gross: must_parse("100.00"),
                settled: must_parse("30.00"),
                anticipated: must_parse("20.00"),
                pending: must_parse("70.00"),
            }
        );
    }

    #[test]
    fn debts_too_large_to_total_are_an_error() {
        let mut loan = transaction(1, EntryType::Outcome, "1.00", 10);
        loan.debts = vec![
            debt(1, "79228162514264337593543950335", DebtStatus::Paid),
            debt(2, "1", DebtStatus::Paid),
        ];

        assert_eq!(loan.net_amount(), Err(Error::AmountOverflow));
        assert_eq!(PendingAmount::of(&loan), Err(Error::AmountOverflow));
    }
}
