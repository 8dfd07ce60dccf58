/// Asset operations
use super::{normalize_name, Asset, UserQuery};
use crate::auth::permissions::{ASSETS_READ, ASSETS_WRITE};
use crate::db::Repository;
use crate::error::AppResult;
use crate::pipeline::{Operation, OperationDescriptor};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddAssetRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0))]
    pub value_cents: i64,
}

pub struct GetAssets {
    repository: Arc<dyn Repository<Asset>>,
}

impl GetAssets {
    pub fn new(repository: Arc<dyn Repository<Asset>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for GetAssets {
    type Request = UserQuery;
    type Response = Vec<Asset>;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("GetAssets")
            .require_permission(ASSETS_READ)
            .cache_for_minutes(10)
    }

    fn owner(request: &UserQuery) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: UserQuery) -> AppResult<Vec<Asset>> {
        let mut assets = self.repository.find_all().await?;
        assets.retain(|a| a.user_id == request.user_id);
        Ok(assets)
    }
}

pub struct AddAsset {
    repository: Arc<dyn Repository<Asset>>,
}

impl AddAsset {
    pub fn new(repository: Arc<dyn Repository<Asset>>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for AddAsset {
    type Request = AddAssetRequest;
    type Response = Asset;

    fn descriptor() -> OperationDescriptor {
        OperationDescriptor::new("AddAsset")
            .require_permission(ASSETS_WRITE)
            .invalidates("GetAssets")
    }

    fn owner(request: &AddAssetRequest) -> Option<Uuid> {
        Some(request.user_id)
    }

    async fn execute(&self, request: AddAssetRequest) -> AppResult<Asset> {
        request.validate()?;

        let asset = Asset {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            name: normalize_name(&request.name)?,
            value_cents: request.value_cents,
            created_at: Utc::now(),
        };
        self.repository.add(&asset).await?;

        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, SqliteRepository};
    use crate::error::AppError;

    #[tokio::test]
    async fn test_add_and_list_assets() {
        let repository: Arc<dyn Repository<Asset>> =
            Arc::new(SqliteRepository::<Asset>::new(test_pool().await));
        let add = AddAsset::new(Arc::clone(&repository));
        let get = GetAssets::new(repository);

        let user = Uuid::new_v4();
        let car = add
            .execute(AddAssetRequest {
                user_id: user,
                name: "Car".to_string(),
                value_cents: 950_000,
            })
            .await
            .unwrap();

        assert_eq!(get.execute(UserQuery::new(user)).await.unwrap(), vec![car]);
        assert!(get.execute(UserQuery::new(Uuid::new_v4())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_value_rejected() {
        let add = AddAsset::new(Arc::new(SqliteRepository::<Asset>::new(test_pool().await)));
        let result = add
            .execute(AddAssetRequest {
                user_id: Uuid::new_v4(),
                name: "Debt".to_string(),
                value_cents: -1,
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
