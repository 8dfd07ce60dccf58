/// Permission codes checked by the authorization gate
pub const TRANSACTIONS_READ: &str = "Transactions.Read";
pub const TRANSACTIONS_WRITE: &str = "Transactions.Write";
pub const EXPENSE_CATEGORIES_READ: &str = "ExpenseCategories.Read";
pub const EXPENSE_CATEGORIES_WRITE: &str = "ExpenseCategories.Write";
pub const INCOME_CATEGORIES_READ: &str = "IncomeCategories.Read";
pub const INCOME_CATEGORIES_WRITE: &str = "IncomeCategories.Write";
pub const ASSETS_READ: &str = "Assets.Read";
pub const ASSETS_WRITE: &str = "Assets.Write";

/// Granted to every newly registered user
pub const DEFAULT_USER_PERMISSIONS: &[&str] = &[
    TRANSACTIONS_READ,
    TRANSACTIONS_WRITE,
    EXPENSE_CATEGORIES_READ,
    EXPENSE_CATEGORIES_WRITE,
    INCOME_CATEGORIES_READ,
    INCOME_CATEGORIES_WRITE,
    ASSETS_READ,
    ASSETS_WRITE,
];

pub fn default_user_permissions() -> Vec<String> {
    DEFAULT_USER_PERMISSIONS
        .iter()
        .map(|p| p.to_string())
        .collect()
}
