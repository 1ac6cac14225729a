//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, database_id::CategoryId, entry_type::EntryType};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for transactions and debts (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category. IDs 1 to 10 belong to [DefaultCategory].
    pub id: CategoryId,
    /// The display name.
    pub name: CategoryName,
    /// Whether the category is for income or outcome entries. Never changes
    /// after the category is created.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// A display color, e.g. "#22c55e".
    pub color: String,
}

impl Category {
    /// Whether transactions and debts of `entry_type` may use this category.
    ///
    /// Categories only accept entries of their own type, except for
    /// [DefaultCategory::DebtPayments] which holds settlements of both
    /// payable and receivable debts.
    pub fn accepts(&self, entry_type: EntryType) -> bool {
        self.entry_type == entry_type || self.id == DefaultCategory::DebtPayments.id()
    }

    /// Check that transactions and debts of `entry_type` may use this category.
    ///
    /// # Errors
    /// Returns [Error::CategoryTypeMismatch] if [Category::accepts] is false.
    pub fn check_accepts(&self, entry_type: EntryType) -> Result<(), Error> {
        if self.accepts(entry_type) {
            Ok(())
        } else {
            Err(Error::CategoryTypeMismatch {
                category_id: self.id,
                category_type: self.entry_type,
                entry_type,
            })
        }
    }
}

/// The categories that every ledger starts with.
///
/// Their IDs are reserved and they cannot be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum DefaultCategory {
    Salary = 1,
    Investments = 2,
    GiftRefund = 3,
    Freelance = 4,
    RentMortgage = 5,
    Groceries = 6,
    Transportation = 7,
    Utilities = 8,
    Entertainment = 9,
    DebtPayments = 10,
}

impl DefaultCategory {
    /// All default categories in ID order.
    pub const ALL: [DefaultCategory; 10] = [
        DefaultCategory::Salary,
        DefaultCategory::Investments,
        DefaultCategory::GiftRefund,
        DefaultCategory::Freelance,
        DefaultCategory::RentMortgage,
        DefaultCategory::Groceries,
        DefaultCategory::Transportation,
        DefaultCategory::Utilities,
        DefaultCategory::Entertainment,
        DefaultCategory::DebtPayments,
    ];

    /// The reserved database ID.
    pub fn id(self) -> CategoryId {
        self as CategoryId
    }

    /// Whether `id` belongs to a default category.
    pub fn is_reserved(id: CategoryId) -> bool {
        Self::ALL.iter().any(|category| category.id() == id)
    }

    /// The category as it is seeded into a new database.
    pub fn to_category(self) -> Category {
        let (name, entry_type, color) = match self {
            DefaultCategory::Salary => ("Salary", EntryType::Income, "#22c55e"),
            DefaultCategory::Investments => ("Investments", EntryType::Income, "#14b8a6"),
            DefaultCategory::GiftRefund => ("Gift/Refund", EntryType::Income, "#06b6d4"),
            DefaultCategory::Freelance => ("Freelance", EntryType::Income, "#3b82f6"),
            DefaultCategory::RentMortgage => ("Rent/Mortgage", EntryType::Outcome, "#ef4444"),
            DefaultCategory::Groceries => ("Groceries", EntryType::Outcome, "#f97316"),
            DefaultCategory::Transportation => ("Transportation", EntryType::Outcome, "#f59e0b"),
            DefaultCategory::Utilities => ("Utilities", EntryType::Outcome, "#eab308"),
            DefaultCategory::Entertainment => ("Entertainment", EntryType::Outcome, "#8b5cf6"),
            DefaultCategory::DebtPayments => ("Debt Payments", EntryType::Outcome, "#84cc16"),
        };

        Category {
            id: self.id(),
            name: CategoryName::new_unchecked(name),
            entry_type,
            color: color.to_owned(),
        }
    }
}

/// Request body for category creation and editing.
///
/// Fields are optional so that a missing field is reported as a validation
/// error naming that field.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A category form that has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCategoryForm {
    pub name: CategoryName,
    pub entry_type: EntryType,
    pub color: String,
}

impl TryFrom<CategoryForm> for ValidCategoryForm {
    type Error = Error;

    fn try_from(form: CategoryForm) -> Result<Self, Self::Error> {
        let name = CategoryName::new(&form.name.ok_or(Error::MissingField("name"))?)?;
        let entry_type = form.entry_type.ok_or(Error::MissingField("type"))?;
        let color = form.color.ok_or(Error::MissingField("color"))?;
        let color = color.trim();

        if color.is_empty() {
            return Err(Error::EmptyCategoryColor);
        }

        Ok(Self {
            name,
            entry_type,
            color: color.to_owned(),
        })
    }
}

#[cfg(test)]
mod category_name_tests {
    use crate::{Error, category::CategoryName};

    #[test]
    fn new_fails_on_empty_string() {
        let name = CategoryName::new("");

        assert_eq!(name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let name = CategoryName::new("\n\t \r");

        assert_eq!(name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_surrounding_whitespace() {
        let name = CategoryName::new("  Pets ").unwrap();

        assert_eq!(name.as_ref(), "Pets");
    }
}

#[cfg(test)]
mod category_typing_tests {
    use crate::{
        EntryType, Error,
        category::{
            Category, CategoryName, DefaultCategory,
            domain::{CategoryForm, ValidCategoryForm},
        },
    };

    fn outcome_category(id: i64) -> Category {
        Category {
            id,
            name: CategoryName::new_unchecked("Pets"),
            entry_type: EntryType::Outcome,
            color: "#000000".to_owned(),
        }
    }

    #[test]
    fn accepts_entries_of_its_own_type_only() {
        let category = outcome_category(11);

        assert!(category.accepts(EntryType::Outcome));
        assert!(!category.accepts(EntryType::Income));
        assert_eq!(
            category.check_accepts(EntryType::Income),
            Err(Error::CategoryTypeMismatch {
                category_id: 11,
                category_type: EntryType::Outcome,
                entry_type: EntryType::Income,
            })
        );
    }

    #[test]
    fn debt_payments_accepts_both_types() {
        let category = DefaultCategory::DebtPayments.to_category();

        assert!(category.accepts(EntryType::Income));
        assert!(category.accepts(EntryType::Outcome));
    }

    #[test]
    fn reserved_ids_are_one_to_ten() {
        assert!((1..=10).all(DefaultCategory::is_reserved));
        assert!(!DefaultCategory::is_reserved(0));
        assert!(!DefaultCategory::is_reserved(11));
    }

    #[test]
    fn form_reports_first_missing_field() {
        let form = CategoryForm {
            name: Some("Pets".to_owned()),
            entry_type: None,
            color: Some("#fff".to_owned()),
        };

        assert_eq!(
            ValidCategoryForm::try_from(form),
            Err(Error::MissingField("type"))
        );
    }

    #[test]
    fn form_rejects_blank_color() {
        let form = CategoryForm {
            name: Some("Pets".to_owned()),
            entry_type: Some(EntryType::Outcome),
            color: Some("  ".to_owned()),
        };

        assert_eq!(
            ValidCategoryForm::try_from(form),
            Err(Error::EmptyCategoryColor)
        );
    }
}
