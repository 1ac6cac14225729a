//! Summary metrics for a reporting period.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    amount::Amount,
    database_id::TransactionId,
    entry_type::EntryType,
    reconciliation::{DateWindow, Period},
    transaction::Transaction,
};

/// Totals for the transactions in a reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub period: Period,
    pub window: DateWindow,
    /// Gross income.
    pub total_income: Amount,
    /// Outcomes net of their paid linked debts.
    pub total_outcomes: Amount,
    /// `total_income - total_outcomes`.
    pub net_balance: Amount,
    /// The net balance as a percentage of income, rounded to two decimal
    /// places. Zero when there is no income.
    pub savings_rate: Decimal,
    /// Transactions in the period whose paid debts exceed their amount.
    pub over_settled_transactions: Vec<TransactionId>,
}

/// Calculate the summary metrics for `period` evaluated on `today`.
///
/// Transactions outside the period's window are ignored.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total or the savings rate cannot be
/// represented.
pub fn summarize(
    transactions: &[Transaction],
    period: Period,
    today: Date,
) -> Result<SummaryMetrics, Error> {
    let window = period.window(today);
    let in_window = || {
        transactions
            .iter()
            .filter(move |transaction| window.contains(transaction.date))
    };

    let total_income = Amount::try_sum(
        in_window()
            .filter(|transaction| transaction.entry_type == EntryType::Income)
            .map(|transaction| transaction.amount),
    )?;

    let total_outcomes = in_window()
        .filter(|transaction| transaction.entry_type == EntryType::Outcome)
        .try_fold(Amount::ZERO, |total, transaction| {
            total.checked_add(transaction.net_amount()?)
        })?;

    let net_balance = total_income.checked_sub(total_outcomes)?;

    let mut over_settled_transactions = Vec::new();
    for transaction in in_window() {
        if transaction.is_over_settled()? {
            over_settled_transactions.push(transaction.id);
        }
    }

    Ok(SummaryMetrics {
        period,
        window,
        total_income,
        total_outcomes,
        net_balance,
        savings_rate: savings_rate(total_income, net_balance)?,
        over_settled_transactions,
    })
}

fn savings_rate(total_income: Amount, net_balance: Amount) -> Result<Decimal, Error> {
    if total_income.is_zero() {
        return Ok(Decimal::ZERO);
    }

    net_balance
        .value()
        .checked_div(total_income.value())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|rate| rate.round_dp(2))
        .ok_or(Error::AmountOverflow)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        DebtStatus, EntryType, Error,
        amount::must_parse,
        reconciliation::{
            Period,
            net::test_support::{debt, transaction},
            summarize,
        },
    };

    #[test]
    fn outcomes_are_net_and_income_is_gross() {
        let salary = transaction(1, EntryType::Income, "1000.00", 1);
        let mut groceries = transaction(2, EntryType::Outcome, "100.00", 6);
        groceries.debts = vec![
            debt(1, "30.00", DebtStatus::Paid),
            debt(2, "10.00", DebtStatus::Unpaid),
        ];

        let summary =
            summarize(&[salary, groceries], Period::Monthly, date!(2024 - 03 - 20)).unwrap();

        assert_eq!(summary.total_income, must_parse("1000.00"));
        assert_eq!(summary.total_outcomes, must_parse("70.00"));
        assert_eq!(summary.net_balance, must_parse("930.00"));
        assert_eq!(summary.savings_rate, Decimal::new(9300, 2));
        assert!(summary.over_settled_transactions.is_empty());
    }

    #[test]
    fn savings_rate_is_zero_without_income() {
        let groceries = transaction(1, EntryType::Outcome, "100.00", 6);

        let summary = summarize(&[groceries], Period::Monthly, date!(2024 - 03 - 20)).unwrap();

        assert_eq!(summary.total_income, must_parse("0"));
        assert_eq!(summary.net_balance, must_parse("-100.00"));
        assert_eq!(summary.savings_rate, Decimal::ZERO);
    }

    #[test]
    fn ignores_transactions_outside_the_period() {
        let mut last_month = transaction(1, EntryType::Income, "500.00", 1);
        last_month.date = date!(2024 - 02 - 29);
        let this_month = transaction(2, EntryType::Income, "200.00", 1);

        let monthly = summarize(
            &[last_month.clone(), this_month.clone()],
            Period::Monthly,
            date!(2024 - 03 - 01),
        )
        .unwrap();
        let yearly =
            summarize(&[last_month, this_month], Period::Yearly, date!(2024 - 03 - 01)).unwrap();

        assert_eq!(monthly.total_income, must_parse("200.00"));
        assert_eq!(yearly.total_income, must_parse("700.00"));
    }

    #[test]
    fn reports_over_settled_transactions() {
        let mut dinner = transaction(4, EntryType::Outcome, "40.00", 9);
        dinner.debts = vec![debt(1, "50.00", DebtStatus::Paid)];

        let summary = summarize(&[dinner], Period::Monthly, date!(2024 - 03 - 10)).unwrap();

        assert_eq!(summary.over_settled_transactions, vec![4]);
        assert_eq!(summary.total_outcomes, must_parse("-10.00"));
    }

    #[test]
    fn tiny_income_that_overflows_the_savings_rate_is_an_error() {
        let tip = transaction(1, EntryType::Income, "0.0000000000000000000000000001", 1);
        let groceries = transaction(2, EntryType::Outcome, "1", 6);

        let result = summarize(&[tip, groceries], Period::Monthly, date!(2024 - 03 - 20));

        assert_eq!(result, Err(Error::AmountOverflow));
    }

    #[test]
    fn outcomes_that_overflow_their_total_are_an_error() {
        let huge = transaction(1, EntryType::Outcome, "79228162514264337593543950335", 5);
        let groceries = transaction(2, EntryType::Outcome, "1", 6);

        let result = summarize(&[huge, groceries], Period::Monthly, date!(2024 - 03 - 20));

        assert_eq!(result, Err(Error::AmountOverflow));
    }
}
