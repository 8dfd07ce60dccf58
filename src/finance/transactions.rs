/// Transaction operations
use super::{ExpenseCategory, IncomeCategory, Transaction, TransactionKind, UserQuery};
use crate::auth::permissions::{TRANSACTIONS_READ, TRANSACTIONS_WRITE};
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::pipeline::{Operation, OperationDescriptor};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddTransactionRequest {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    pub category_id: Uuid,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Defaults to now
    pub occurred_at: Option<DateTime<Utc>>,
}

pub struct GetTransactions {
    repository: Arc<dyn Repository<Transaction>>,
}

impl GetTransactions {
    pub fn new(repository: Arc<dyn Repository<Transaction>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for GetTransactions {
    type Request = UserQuery;
    type Response = Vec<Transaction>;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("GetTransactions")
            .require_permission(TRANSACTIONS_READ)
            .cache_for_minutes(5)
    }

    fn owner(request: &UserQuery) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: UserQuery) -> AppResult<Vec<Transaction>> {
        let mut transactions = self.repository.find_all().await?;
        transactions.retain(|t| t.user_id == request.user_id);
        // Newest first; sort is stable so same-instant entries keep insertion order
        transactions.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(transactions)
    }
}

pub struct AddTransaction {
    transactions: Arc<dyn Repository<Transaction>>,
    expense_categories: Arc<dyn Repository<ExpenseCategory>>,
    income_categories: Arc<dyn Repository<IncomeCategory>>,
}

impl AddTransaction {
    pub fn new(
        transactions: Arc<dyn Repository<Transaction>>,
        expense_categories: Arc<dyn Repository<ExpenseCategory>>,
        income_categories: Arc<dyn Repository<IncomeCategory>>,
    ) -> Self {
        Self {
            transactions,
            expense_categories,
            income_categories,
        }
    }

    /// The category must exist, match the transaction kind, and belong to the same user
    async fn check_category(&self, request: &AddTransactionRequest) -> AppResult<()> {
        let owner = match request.kind {
            TransactionKind::Expense => self
                .expense_categories
                .get(request.category_id)
                .await?
                .map(|c| c.user_id),
            TransactionKind::Income => self
                .income_categories
                .get(request.category_id)
                .await?
                .map(|c| c.user_id),
        };

        match owner {
            Some(user_id) if user_id == request.user_id => Ok(()),
            _ => Err(AppError::NotFound(format!(
                "No {:?} category {} for this user",
                request.kind, request.category_id
            ))),
        }
    }
}

#[async_trait]
impl Operation for AddTransaction {
    type Request = AddTransactionRequest;
    type Response = Transaction;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("AddTransaction")
            .require_permission(TRANSACTIONS_WRITE)
            .invalidates("GetTransactions")
    }

    fn owner(request: &AddTransactionRequest) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: AddTransactionRequest) -> AppResult<Transaction> {
        request.validate()?;
        self.check_category(&request).await?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            kind: request.kind,
            amount_cents: request.amount_cents,
            category_id: request.category_id,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            occurred_at: request.occurred_at.unwrap_or(now),
            created_at: now,
        };
        self.transactions.add(&transaction).await?;

        Ok(transaction)
    }
}
