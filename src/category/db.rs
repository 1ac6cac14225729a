//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryName, DefaultCategory, ValidCategoryForm},
    database_id::CategoryId,
    entry_type::EntryType,
};

/// Create a category and return it with its generated ID.
pub fn create_category(form: ValidCategoryForm, connection: &Connection) -> Result<Category, Error> {
    let transaction = connection.unchecked_transaction()?;

    let category = transaction
        .prepare(
            "INSERT INTO category (name, type, color) VALUES (?1, ?2, ?3)
             RETURNING id, name, type, color",
        )?
        .query_row(
            (form.name.as_ref(), form.entry_type, &form.color),
            map_row,
        )?;

    transaction.commit()?;

    Ok(category)
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type, color FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a category that a new or edited entry of `entry_type` refers to.
///
/// # Errors
/// Returns [Error::InvalidCategory] if the category does not exist, or
/// [Error::CategoryTypeMismatch] if it cannot hold entries of `entry_type`.
pub fn get_category_for_entry(
    category_id: CategoryId,
    entry_type: EntryType,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = get_category(category_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCategory(category_id),
        error => error,
    })?;

    category.check_accepts(entry_type)?;

    Ok(category)
}

/// Retrieve all categories ordered by ID, optionally only those of `entry_type`.
pub fn get_categories(
    entry_type: Option<EntryType>,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    match entry_type {
        Some(entry_type) => connection
            .prepare("SELECT id, name, type, color FROM category WHERE type = ?1 ORDER BY id ASC;")?
            .query_map([entry_type], map_row)?
            .map(|maybe_category| maybe_category.map_err(|error| error.into()))
            .collect(),
        None => connection
            .prepare("SELECT id, name, type, color FROM category ORDER BY id ASC;")?
            .query_map([], map_row)?
            .map(|maybe_category| maybe_category.map_err(|error| error.into()))
            .collect(),
    }
}

/// Update a category's name and color.
///
/// The type is part of the form so that clients can send the full category
/// back, but it must match the stored type.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the category doesn't exist, or
/// [Error::CategoryTypeChange] if the type differs from the stored one.
pub fn update_category(
    category_id: CategoryId,
    form: ValidCategoryForm,
    connection: &Connection,
) -> Result<Category, Error> {
    let transaction = connection.unchecked_transaction()?;

    let existing = get_category(category_id, &transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingCategory,
        error => error,
    })?;

    if existing.entry_type != form.entry_type {
        return Err(Error::CategoryTypeChange(category_id));
    }

    transaction.execute(
        "UPDATE category SET name = ?1, color = ?2 WHERE id = ?3",
        (form.name.as_ref(), &form.color, category_id),
    )?;

    transaction.commit()?;

    Ok(Category {
        id: category_id,
        name: form.name,
        entry_type: existing.entry_type,
        color: form.color,
    })
}

/// Delete a category by ID.
///
/// # Errors
/// Returns [Error::ProtectedCategory] for default categories,
/// [Error::DeleteMissingCategory] if the category doesn't exist, or
/// [Error::CategoryInUse] if transactions or debts still refer to it.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    if DefaultCategory::is_reserved(category_id) {
        return Err(Error::ProtectedCategory(category_id));
    }

    let transaction = connection.unchecked_transaction()?;

    let rows_affected = transaction
        .execute("DELETE FROM category WHERE id = ?1", [category_id])
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::CategoryInUse(category_id),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    transaction.commit()?;

    Ok(())
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type INTEGER NOT NULL CHECK (type IN (0, 1)),
            color TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_type ON category(type);",
    )?;

    Ok(())
}

/// Insert the default categories if they are missing.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO category (id, name, type, color) VALUES (?1, ?2, ?3, ?4)",
    )?;

    for default_category in DefaultCategory::ALL {
        let category = default_category.to_category();
        statement.execute((
            category.id,
            category.name.as_ref(),
            category.entry_type,
            &category.color,
        ))?;
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let entry_type = row.get(2)?;
    let color = row.get(3)?;

    Ok(Category {
        id,
        name,
        entry_type,
        color,
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        EntryType, Error,
        amount::must_parse,
        category::{
            Category, CategoryName, DefaultCategory,
            db::{
                create_category, delete_category, get_categories, get_category,
                get_category_for_entry, update_category,
            },
            domain::ValidCategoryForm,
        },
        db::must_create_test_connection,
        transaction::{Transaction, create_transaction},
    };

    fn pets_form() -> ValidCategoryForm {
        ValidCategoryForm {
            name: CategoryName::new_unchecked("Pets"),
            entry_type: EntryType::Outcome,
            color: "#123456".to_owned(),
        }
    }

    fn must_create_pets(connection: &Connection) -> Category {
        create_category(pets_form(), connection).expect("could not create test category")
    }

    #[test]
    fn create_category_succeeds_after_reserved_ids() {
        let connection = must_create_test_connection();

        let category = must_create_pets(&connection);

        assert!(category.id > 10);
        assert_eq!(category.name.as_ref(), "Pets");
        assert_eq!(category.entry_type, EntryType::Outcome);
    }

    #[test]
    fn default_categories_are_seeded() {
        let connection = must_create_test_connection();

        let groceries = get_category(DefaultCategory::Groceries.id(), &connection).unwrap();

        assert_eq!(groceries, DefaultCategory::Groceries.to_category());
    }

    #[test]
    fn filtering_by_outcome_excludes_income_categories() {
        let connection = must_create_test_connection();

        let categories = get_categories(Some(EntryType::Outcome), &connection).unwrap();

        assert!(!categories.is_empty());
        assert!(
            categories
                .iter()
                .all(|category| category.entry_type == EntryType::Outcome)
        );
        assert!(
            !categories
                .iter()
                .any(|category| category.id == DefaultCategory::Salary.id())
        );
    }

    #[test]
    fn listing_without_filter_returns_all_in_id_order() {
        let connection = must_create_test_connection();
        let pets = must_create_pets(&connection);

        let categories = get_categories(None, &connection).unwrap();

        assert_eq!(categories.len(), 11);
        assert_eq!(categories.first().map(|c| c.id), Some(1));
        assert_eq!(categories.last(), Some(&pets));
    }

    #[test]
    fn get_category_for_entry_rejects_wrong_type() {
        let connection = must_create_test_connection();

        let result = get_category_for_entry(
            DefaultCategory::Salary.id(),
            EntryType::Outcome,
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::CategoryTypeMismatch {
                category_id: DefaultCategory::Salary.id(),
                category_type: EntryType::Income,
                entry_type: EntryType::Outcome,
            })
        );
    }

    #[test]
    fn get_category_for_entry_rejects_unknown_category() {
        let connection = must_create_test_connection();

        let result = get_category_for_entry(999, EntryType::Outcome, &connection);

        assert_eq!(result, Err(Error::InvalidCategory(999)));
    }

    #[test]
    fn update_category_changes_name_and_color() {
        let connection = must_create_test_connection();
        let pets = must_create_pets(&connection);
        let form = ValidCategoryForm {
            name: CategoryName::new_unchecked("Pet food"),
            entry_type: EntryType::Outcome,
            color: "#abcdef".to_owned(),
        };

        let updated = update_category(pets.id, form, &connection).unwrap();

        assert_eq!(get_category(pets.id, &connection), Ok(updated.clone()));
        assert_eq!(updated.name.as_ref(), "Pet food");
        assert_eq!(updated.color, "#abcdef");
    }

    #[test]
    fn update_category_rejects_type_change() {
        let connection = must_create_test_connection();
        let pets = must_create_pets(&connection);
        let form = ValidCategoryForm {
            entry_type: EntryType::Income,
            ..pets_form()
        };

        let result = update_category(pets.id, form, &connection);

        assert_eq!(result, Err(Error::CategoryTypeChange(pets.id)));
        assert_eq!(get_category(pets.id, &connection), Ok(pets));
    }

    #[test]
    fn update_category_with_invalid_id_returns_not_found() {
        let connection = must_create_test_connection();

        let result = update_category(999999, pets_form(), &connection);

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_category_succeeds() {
        let connection = must_create_test_connection();
        let pets = must_create_pets(&connection);

        delete_category(pets.id, &connection).expect("could not delete category");

        assert_eq!(get_category(pets.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_default_category_is_rejected() {
        let connection = must_create_test_connection();

        let result = delete_category(DefaultCategory::DebtPayments.id(), &connection);

        assert_eq!(result, Err(Error::ProtectedCategory(10)));
        assert!(get_category(10, &connection).is_ok());
    }

    #[test]
    fn delete_category_with_invalid_id_returns_not_found() {
        let connection = must_create_test_connection();

        let result = delete_category(999999, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }

    #[test]
    fn delete_category_in_use_is_a_conflict() {
        let connection = must_create_test_connection();
        let pets = must_create_pets(&connection);
        create_transaction(
            Transaction::build(EntryType::Outcome, must_parse("12.00"), pets.id, date!(2024 - 03 - 10)),
            &connection,
        )
        .expect("could not create test transaction");

        let result = delete_category(pets.id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse(pets.id)));
        assert_eq!(get_category(pets.id, &connection), Ok(pets));
    }
}
