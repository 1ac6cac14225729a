//! Chart series derived from the ledger.
//!
//! Provides the outcome breakdown by category, the cumulative outcome
//! evolution per category, and the monthly income/outcome flow for a year.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    amount::Amount,
    category::Category,
    database_id::CategoryId,
    entry_type::EntryType,
    reconciliation::{AmountBasis, MONTHS, Period, month_label},
    transaction::Transaction,
};

/// The net outcomes of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdownEntry {
    pub name: String,
    pub color: String,
    pub value: Amount,
}

/// Net outcomes in the period grouped by category name, largest first.
///
/// Ties are ordered by name.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a category total cannot be represented.
pub fn category_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
    period: Period,
    today: Date,
) -> Result<Vec<CategoryBreakdownEntry>, Error> {
    let window = period.window(today);
    let categories_by_id: HashMap<CategoryId, &Category> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();
    let mut totals: HashMap<String, CategoryBreakdownEntry> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.entry_type == EntryType::Outcome)
        .filter(|transaction| window.contains(transaction.date))
    {
        let (name, color) = match categories_by_id.get(&transaction.category_id) {
            Some(category) => (category.name.to_string(), category.color.clone()),
            None => (String::new(), String::new()),
        };

        let entry = totals
            .entry(name.clone())
            .or_insert_with(|| CategoryBreakdownEntry {
                name,
                color,
                value: Amount::ZERO,
            });
        entry.value = entry.value.checked_add(transaction.net_amount()?)?;
    }

    let mut breakdown: Vec<_> = totals.into_values().collect();
    breakdown.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    Ok(breakdown)
}

/// A category that appears in the evolution series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSeries {
    pub category_id: CategoryId,
    pub name: String,
    pub color: String,
}

/// The cumulative outcomes of each category up to and including one day or month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    /// The day of the month ("1".."31") or the month ("Jan".."Dec").
    pub period: String,
    pub totals: BTreeMap<CategoryId, Amount>,
}

/// The cumulative outcome series for every category with outcomes in the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEvolution {
    pub basis: AmountBasis,
    pub series: Vec<EvolutionSeries>,
    pub points: Vec<EvolutionPoint>,
}

/// Calculate the cumulative outcomes per category over the period.
///
/// The monthly view has one point per day of the month, the yearly view one
/// point per month. Every point has a total for every series, including
/// zero totals before a category's first outcome.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a running total cannot be represented.
pub fn category_evolution(
    transactions: &[Transaction],
    categories: &[Category],
    period: Period,
    today: Date,
    basis: AmountBasis,
) -> Result<CategoryEvolution, Error> {
    let window = period.window(today);
    let outcomes: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.entry_type == EntryType::Outcome)
        .filter(|transaction| window.contains(transaction.date))
        .collect();

    let category_ids: BTreeSet<CategoryId> = outcomes
        .iter()
        .map(|transaction| transaction.category_id)
        .collect();

    let series = categories
        .iter()
        .filter(|category| category_ids.contains(&category.id))
        .map(|category| EvolutionSeries {
            category_id: category.id,
            name: category.name.to_string(),
            color: category.color.clone(),
        })
        .collect::<Vec<_>>();

    // (label, index of the day or month) for every point, in order.
    let steps: Vec<(String, u16)> = match period {
        Period::Monthly => (1..=window.days())
            .map(|day| (day.to_string(), day))
            .collect(),
        Period::Yearly => MONTHS
            .iter()
            .map(|month| (month_label(*month).to_owned(), u16::from(u8::from(*month))))
            .collect(),
    };

    let step_of = |date: Date| -> u16 {
        match period {
            Period::Monthly => u16::from(date.day()),
            Period::Yearly => u16::from(u8::from(date.month())),
        }
    };

    let points = steps
        .into_iter()
        .map(|(label, step)| -> Result<EvolutionPoint, Error> {
            let mut totals: BTreeMap<CategoryId, Amount> = series
                .iter()
                .map(|series| (series.category_id, Amount::ZERO))
                .collect();

            for transaction in outcomes
                .iter()
                .filter(|transaction| step_of(transaction.date) <= step)
            {
                if let Some(total) = totals.get_mut(&transaction.category_id) {
                    *total = total.checked_add(transaction.amount_for(basis)?)?;
                }
            }

            Ok(EvolutionPoint {
                period: label,
                totals,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CategoryEvolution {
        basis,
        series,
        points,
    })
}

/// The income and outcomes of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFlow {
    pub month: String,
    /// Gross income.
    pub income: Amount,
    pub outcomes: Amount,
}

/// The income and outcomes of every month in the year containing `today`.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a monthly total cannot be represented.
pub fn monthly_flows(
    transactions: &[Transaction],
    today: Date,
    basis: AmountBasis,
) -> Result<Vec<MonthlyFlow>, Error> {
    MONTHS
        .iter()
        .map(|month| -> Result<MonthlyFlow, Error> {
            let in_month = || {
                transactions.iter().filter(|transaction| {
                    transaction.date.year() == today.year() && transaction.date.month() == *month
                })
            };

            let income = Amount::try_sum(
                in_month()
                    .filter(|transaction| transaction.entry_type == EntryType::Income)
                    .map(|transaction| transaction.amount),
            )?;
            let outcomes = in_month()
                .filter(|transaction| transaction.entry_type == EntryType::Outcome)
                .try_fold(Amount::ZERO, |total, transaction| {
                    total.checked_add(transaction.amount_for(basis)?)
                })?;

            Ok(MonthlyFlow {
                month: month_label(*month).to_owned(),
                income,
                outcomes,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        DebtStatus, DefaultCategory, EntryType, Error,
        amount::must_parse,
        category::Category,
        reconciliation::{
            AmountBasis, Period,
            charts::{category_breakdown, category_evolution, monthly_flows},
            net::test_support::{debt, transaction},
        },
    };

    fn categories() -> Vec<Category> {
        DefaultCategory::ALL
            .iter()
            .map(|category| category.to_category())
            .collect()
    }

    #[test]
    fn breakdown_uses_net_outcomes_sorted_descending() {
        let mut groceries = transaction(1, EntryType::Outcome, "100.00", 6);
        groceries.debts = vec![debt(1, "30.00", DebtStatus::Paid)];
        let transport = transaction(2, EntryType::Outcome, "80.00", 7);
        let more_groceries = transaction(3, EntryType::Outcome, "5.00", 6);
        let salary = transaction(4, EntryType::Income, "900.00", 1);

        let breakdown = category_breakdown(
            &[groceries, transport, more_groceries, salary],
            &categories(),
            Period::Monthly,
            date!(2024 - 03 - 15),
        )
        .unwrap();

        let got: Vec<_> = breakdown
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Transportation", must_parse("80.00")),
                ("Groceries", must_parse("75.00")),
            ]
        );
    }

    #[test]
    fn breakdown_ties_are_ordered_by_name() {
        let utilities = transaction(1, EntryType::Outcome, "10.00", 8);
        let groceries = transaction(2, EntryType::Outcome, "10.00", 6);

        let breakdown = category_breakdown(
            &[utilities, groceries],
            &categories(),
            Period::Monthly,
            date!(2024 - 03 - 15),
        )
        .unwrap();

        assert_eq!(breakdown[0].name, "Groceries");
        assert_eq!(breakdown[1].name, "Utilities");
    }

    #[test]
    fn monthly_evolution_has_a_cumulative_point_per_day() {
        let mut early = transaction(1, EntryType::Outcome, "10.00", 6);
        early.date = date!(2024 - 02 - 03);
        let mut late = transaction(2, EntryType::Outcome, "15.00", 6);
        late.date = date!(2024 - 02 - 20);

        let evolution = category_evolution(
            &[early, late],
            &categories(),
            Period::Monthly,
            date!(2024 - 02 - 21),
            AmountBasis::Gross,
        )
        .unwrap();

        assert_eq!(evolution.points.len(), 29);
        assert_eq!(evolution.series.len(), 1);
        assert_eq!(evolution.points[0].period, "1");
        assert_eq!(evolution.points[0].totals[&6], must_parse("0"));
        assert_eq!(evolution.points[2].totals[&6], must_parse("10.00"));
        assert_eq!(evolution.points[19].totals[&6], must_parse("25.00"));
        assert_eq!(evolution.points[28].totals[&6], must_parse("25.00"));
    }

    #[test]
    fn yearly_evolution_respects_amount_basis() {
        let mut groceries = transaction(1, EntryType::Outcome, "100.00", 6);
        groceries.date = date!(2024 - 04 - 02);
        groceries.debts = vec![debt(1, "40.00", DebtStatus::Paid)];

        let gross = category_evolution(
            &[groceries.clone()],
            &categories(),
            Period::Yearly,
            date!(2024 - 06 - 01),
            AmountBasis::Gross,
        )
        .unwrap();
        let net = category_evolution(
            &[groceries],
            &categories(),
            Period::Yearly,
            date!(2024 - 06 - 01),
            AmountBasis::Net,
        )
        .unwrap();

        assert_eq!(gross.points.len(), 12);
        assert_eq!(gross.points[2].period, "Mar");
        assert_eq!(gross.points[2].totals[&6], must_parse("0"));
        assert_eq!(gross.points[3].totals[&6], must_parse("100.00"));
        assert_eq!(gross.points[11].totals[&6], must_parse("100.00"));
        assert_eq!(net.points[11].totals[&6], must_parse("60.00"));
    }

    #[test]
    fn monthly_flows_cover_the_current_year() {
        let mut january_salary = transaction(1, EntryType::Income, "1000.00", 1);
        january_salary.date = date!(2024 - 01 - 25);
        let mut march_rent = transaction(2, EntryType::Outcome, "600.00", 5);
        march_rent.date = date!(2024 - 03 - 01);
        let mut last_year = transaction(3, EntryType::Outcome, "999.00", 5);
        last_year.date = date!(2023 - 03 - 01);

        let flows = monthly_flows(
            &[january_salary, march_rent, last_year],
            date!(2024 - 05 - 05),
            AmountBasis::Gross,
        )
        .unwrap();

        assert_eq!(flows.len(), 12);
        assert_eq!(flows[0].month, "Jan");
        assert_eq!(flows[0].income, must_parse("1000.00"));
        assert_eq!(flows[2].outcomes, must_parse("600.00"));
        assert_eq!(flows[11].income, must_parse("0"));
    }

    #[test]
    fn overflowing_category_total_is_an_error() {
        let huge = transaction(1, EntryType::Outcome, "79228162514264337593543950335", 6);
        let groceries = transaction(2, EntryType::Outcome, "1", 6);

        let result = category_breakdown(
            &[huge, groceries],
            &categories(),
            Period::Monthly,
            date!(2024 - 03 - 15),
        );

        assert_eq!(result, Err(Error::AmountOverflow));
    }
}
