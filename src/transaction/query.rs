//! Filtered transaction listing with the debts that link to each transaction.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, DebtId, TransactionId},
    entry_type::EntryType,
    transaction::{Transaction, TransactionDebt, map_transaction_row},
};

/// The order to list transactions in. Ties are always broken by ID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOrder {
    /// Newest entries first.
    #[default]
    IdDesc,
    /// Oldest entries first.
    IdAsc,
    /// Latest dates first.
    DateDesc,
    /// Earliest dates first.
    DateAsc,
}

impl TransactionOrder {
    fn order_clause(self) -> &'static str {
        match self {
            TransactionOrder::IdDesc => "ORDER BY t.id DESC",
            TransactionOrder::IdAsc => "ORDER BY t.id ASC",
            TransactionOrder::DateDesc => "ORDER BY t.date DESC, t.id DESC",
            TransactionOrder::DateAsc => "ORDER BY t.date ASC, t.id ASC",
        }
    }
}

/// The filters accepted by the transaction listing, all optional.
///
/// `from` and `to` are inclusive bounds on the date. `description` matches
/// any transaction whose description contains it, ignoring ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionFilter {
    pub id: Option<TransactionId>,
    #[serde(rename = "type")]
    pub entry_type: Option<EntryType>,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
    pub date: Option<Date>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    #[serde(default)]
    pub order: TransactionOrder,
}

/// Get the transactions matching `filter`, each with its linked debts.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn query_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut where_clause_parts = vec![];
    let mut query_parameters = vec![];

    if let Some(id) = filter.id {
        query_parameters.push(Value::Integer(id));
        where_clause_parts.push(format!("t.id = ?{}", query_parameters.len()));
    }

    if let Some(entry_type) = filter.entry_type {
        query_parameters.push(Value::Integer(entry_type.as_bool().into()));
        where_clause_parts.push(format!("t.type = ?{}", query_parameters.len()));
    }

    if let Some(category_id) = filter.category_id {
        query_parameters.push(Value::Integer(category_id));
        where_clause_parts.push(format!("t.category_id = ?{}", query_parameters.len()));
    }

    if let Some(description) = filter.description.as_deref().filter(|d| !d.is_empty()) {
        query_parameters.push(Value::Text(description.to_owned()));
        where_clause_parts.push(format!(
            "t.description LIKE '%' || ?{} || '%'",
            query_parameters.len()
        ));
    }

    if let Some(date) = filter.date {
        query_parameters.push(Value::Text(date.to_string()));
        where_clause_parts.push(format!("t.date = ?{}", query_parameters.len()));
    }

    if let Some(from) = filter.from {
        query_parameters.push(Value::Text(from.to_string()));
        where_clause_parts.push(format!("t.date >= ?{}", query_parameters.len()));
    }

    if let Some(to) = filter.to {
        query_parameters.push(Value::Text(to.to_string()));
        where_clause_parts.push(format!("t.date <= ?{}", query_parameters.len()));
    }

    let where_clause = if where_clause_parts.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_clause_parts.join(" AND "))
    };

    // Debts are ordered last so that the rows of each transaction are adjacent.
    let query = format!(
        "SELECT t.id, t.type, t.amount, t.category_id, t.description, t.date, t.source_debt_id,
            d.id, d.amount, d.status, d.person, d.description
        FROM \"transaction\" t
        LEFT JOIN debt d ON d.transaction_id = t.id
        {where_clause}
        {}, d.id ASC",
        filter.order.order_clause()
    );

    let rows = connection
        .prepare(&query)?
        .query_map(params_from_iter(query_parameters.iter()), |row| {
            Ok((map_transaction_row(row)?, map_debt_columns(row)?))
        })?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;

    let mut transactions: Vec<Transaction> = Vec::new();

    for (transaction, debt) in rows {
        let is_same_transaction = transactions
            .last()
            .is_some_and(|previous| previous.id == transaction.id);

        if !is_same_transaction {
            transactions.push(transaction);
        }

        if let (Some(debt), Some(current)) = (debt, transactions.last_mut()) {
            current.debts.push(debt);
        }
    }

    Ok(transactions)
}

fn map_debt_columns(row: &Row) -> Result<Option<TransactionDebt>, rusqlite::Error> {
    let Some(id) = row.get::<_, Option<DebtId>>(7)? else {
        return Ok(None);
    };

    Ok(Some(TransactionDebt {
        id,
        amount: row.get(8)?,
        status: row.get(9)?,
        person: row.get(10)?,
        description: row.get(11)?,
    }))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        DefaultCategory, EntryType,
        amount::must_parse,
        config::PendingLimitPolicy,
        database_id::TransactionId,
        db::must_create_test_connection,
        debt::{NewDebt, create_debt},
        transaction::{
            Transaction, create_transaction,
            query::{TransactionFilter, TransactionOrder, query_transactions},
        },
    };

    fn create(
        entry_type: EntryType,
        category: DefaultCategory,
        day: u8,
        description: &str,
        conn: &Connection,
    ) -> TransactionId {
        let date = date!(2024 - 03 - 01)
            .replace_day(day)
            .expect("invalid test day");
        create_transaction(
            Transaction::build(entry_type, must_parse("10.00"), category.id(), date)
                .description(description),
            conn,
        )
        .expect("could not create transaction")
        .id
    }

    fn ids(transactions: &[Transaction]) -> Vec<TransactionId> {
        transactions.iter().map(|transaction| transaction.id).collect()
    }

    #[test]
    fn orders_by_id_descending_by_default() {
        let conn = must_create_test_connection();
        let first = create(EntryType::Outcome, DefaultCategory::Groceries, 20, "", &conn);
        let second = create(EntryType::Outcome, DefaultCategory::Groceries, 5, "", &conn);

        let got = query_transactions(&TransactionFilter::default(), &conn).unwrap();

        assert_eq!(ids(&got), vec![second, first]);
    }

    #[test]
    fn orders_by_date_with_id_tie_break() {
        let conn = must_create_test_connection();
        let a = create(EntryType::Outcome, DefaultCategory::Groceries, 20, "", &conn);
        let b = create(EntryType::Outcome, DefaultCategory::Groceries, 5, "", &conn);
        let c = create(EntryType::Outcome, DefaultCategory::Groceries, 5, "", &conn);
        let filter = TransactionFilter {
            order: TransactionOrder::DateAsc,
            ..Default::default()
        };

        let got = query_transactions(&filter, &conn).unwrap();

        assert_eq!(ids(&got), vec![b, c, a]);
    }

    #[test]
    fn filters_by_type_and_date_range() {
        let conn = must_create_test_connection();
        create(EntryType::Income, DefaultCategory::Salary, 10, "", &conn);
        create(EntryType::Outcome, DefaultCategory::Groceries, 1, "", &conn);
        let inside = create(EntryType::Outcome, DefaultCategory::Groceries, 10, "", &conn);
        create(EntryType::Outcome, DefaultCategory::Groceries, 25, "", &conn);
        let filter = TransactionFilter {
            entry_type: Some(EntryType::Outcome),
            from: Some(date!(2024 - 03 - 02)),
            to: Some(date!(2024 - 03 - 24)),
            ..Default::default()
        };

        let got = query_transactions(&filter, &conn).unwrap();

        assert_eq!(ids(&got), vec![inside]);
    }

    #[test]
    fn filters_by_description_substring() {
        let conn = must_create_test_connection();
        let wanted = create(EntryType::Outcome, DefaultCategory::Utilities, 3, "Power bill", &conn);
        create(EntryType::Outcome, DefaultCategory::Utilities, 3, "Water", &conn);
        let filter = TransactionFilter {
            description: Some("power".to_owned()),
            ..Default::default()
        };

        let got = query_transactions(&filter, &conn).unwrap();

        assert_eq!(ids(&got), vec![wanted]);
    }

    #[test]
    fn resolves_linked_debts_in_id_order() {
        let conn = must_create_test_connection();
        let linked = create(EntryType::Outcome, DefaultCategory::Groceries, 10, "", &conn);
        let unlinked = create(EntryType::Outcome, DefaultCategory::Groceries, 11, "", &conn);
        let mut debt_ids = vec![];
        for person in ["Alice", "Bob"] {
            let debt = create_debt(
                NewDebt::build(
                    EntryType::Income,
                    must_parse("2.50"),
                    DefaultCategory::DebtPayments.id(),
                    person,
                    date!(2024 - 03 - 10),
                )
                .transaction_id(linked),
                PendingLimitPolicy::Enforce,
                &conn,
            )
            .unwrap();
            debt_ids.push(debt.id);
        }

        let got = query_transactions(&TransactionFilter::default(), &conn).unwrap();

        assert_eq!(ids(&got), vec![unlinked, linked]);
        assert!(got[0].debts.is_empty());
        let linked_debt_ids: Vec<_> = got[1].debts.iter().map(|debt| debt.id).collect();
        assert_eq!(linked_debt_ids, debt_ids);
        assert_eq!(got[1].debts[0].person, "Alice");
    }
}
