/// Expense and income category operations
use super::{normalize_name, ExpenseCategory, IncomeCategory, UserQuery};
use crate::auth::permissions::{
    EXPENSE_CATEGORIES_READ, EXPENSE_CATEGORIES_WRITE, INCOME_CATEGORIES_READ,
    INCOME_CATEGORIES_WRITE,
};
use crate::db::Repository;
use crate::error::AppResult;
use crate::pipeline::{Operation, OperationDescriptor};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// New category for either kind
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCategoryRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

pub struct GetExpenseCategories {
    repository: Arc<dyn Repository<ExpenseCategory>>,
}

impl GetExpenseCategories {
    pub fn new(repository: Arc<dyn Repository<ExpenseCategory>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for GetExpenseCategories {
    type Request = UserQuery;
    type Response = Vec<ExpenseCategory>;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("GetExpenseCategories")
            .require_permission(EXPENSE_CATEGORIES_READ)
            .cache_for_minutes(10)
    }

    fn owner(request: &UserQuery) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: UserQuery) -> AppResult<Vec<ExpenseCategory>> {
        let mut categories = self.repository.find_all().await?;
        categories.retain(|c| c.user_id == request.user_id);
        Ok(categories)
    }
}

pub struct AddExpenseCategory {
    repository: Arc<dyn Repository<ExpenseCategory>>,
}

impl AddExpenseCategory {
    pub fn new(repository: Arc<dyn Repository<ExpenseCategory>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for AddExpenseCategory {
    type Request = AddCategoryRequest;
    type Response = ExpenseCategory;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("AddExpenseCategory")
            .require_permission(EXPENSE_CATEGORIES_WRITE)
            .invalidates("GetExpenseCategories")
    }

    fn owner(request: &AddCategoryRequest) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: AddCategoryRequest) -> AppResult<ExpenseCategory> {
        request.validate()?;

        let category = ExpenseCategory {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            name: normalize_name(&request.name)?,
            created_at: Utc::now(),
        };
        self.repository.add(&category).await?;

        Ok(category)
    }
}

pub struct GetIncomeCategories {
    repository: Arc<dyn Repository<IncomeCategory>>,
}

impl GetIncomeCategories {
    pub fn new(repository: Arc<dyn Repository<IncomeCategory>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for GetIncomeCategories {
    type Request = UserQuery;
    type Response = Vec<IncomeCategory>;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("GetIncomeCategories")
            .require_permission(INCOME_CATEGORIES_READ)
            .cache_for_minutes(10)
    }

    fn owner(request: &UserQuery) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: UserQuery) -> AppResult<Vec<IncomeCategory>> {
        let mut categories = self.repository.find_all().await?;
        categories.retain(|c| c.user_id == request.user_id);
        Ok(categories)
    }
}

pub struct AddIncomeCategory {
    repository: Arc<dyn Repository<IncomeCategory>>,
}

impl AddIncomeCategory {
    pub fn new(repository: Arc<dyn Repository<IncomeCategory>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for AddIncomeCategory {
    type Request = AddCategoryRequest;
    type Response = IncomeCategory;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("AddIncomeCategory")
            .require_permission(INCOME_CATEGORIES_WRITE)
            .invalidates("GetIncomeCategories")
    }

    fn owner(request: &AddCategoryRequest) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: AddCategoryRequest) -> AppResult<IncomeCategory> {
        request.validate()?;

        let category = IncomeCategory {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            name: normalize_name(&request.name)?,
            created_at: Utc::now(),
        };
        self.repository.add(&category).await?;

        Ok(category)
    }
}
