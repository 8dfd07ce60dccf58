/// Finance records and operations
///
/// Thin command/query handlers over the repository. Each operation declares
/// its permission, cache and invalidation behaviour through its descriptor;
/// the pipeline does the rest.

pub mod assets;
pub mod categories;
pub mod transactions;

pub use assets::{AddAsset, AddAssetRequest, GetAssets};
pub use categories::{
    AddCategoryRequest, AddExpenseCategory, AddIncomeCategory, GetExpenseCategories,
    GetIncomeCategories,
};
pub use transactions::{AddTransaction, AddTransactionRequest, GetTransactions};

use crate::db::Record;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query scoped to one user's records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

impl UserQuery {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Record for ExpenseCategory {
    const KIND: &'static str = "expense_category";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeCategory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Record for IncomeCategory {
    const KIND: &'static str = "income_category";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    /// Always positive; `kind` carries the direction
    pub amount_cents: i64,
    pub category_id: Uuid,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Record for Transaction {
    const KIND: &'static str = "transaction";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub value_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Record for Asset {
    const KIND: &'static str = "asset";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Trimmed display name, rejecting whitespace-only input
pub(crate) fn normalize_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Name cannot be blank".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Groceries ").unwrap(), "Groceries");
        assert!(matches!(normalize_name(" \t"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_transaction_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Expense).unwrap(),
            "\"expense\""
        );
        let kind: TransactionKind = serde_json::from_str("\"income\"").unwrap();
        assert_eq!(kind, TransactionKind::Income);
    }
}
