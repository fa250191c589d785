//! Category service domain logic.

use anyhow::{anyhow, Result};
use log::info;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::DbConnection;
use crate::domain::commands::categories::{CategoryResult, CreateCategoryCommand};
use crate::domain::models::Category;
use crate::storage::CategoryRepository;
use shared::AccountContext;

#[derive(Clone)]
pub struct CategoryService {
    category_repository: CategoryRepository,
}

impl CategoryService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            category_repository: CategoryRepository::new(db),
        }
    }

    pub async fn create_category(&self, command: CreateCategoryCommand) -> Result<CategoryResult> {
        if command.name.trim().is_empty() {
            return Err(anyhow!("Category name cannot be empty"));
        }

        let now_millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis() as u64;
        let category = Category {
            id: shared::Category::generate_id(now_millis),
            name: command.name.trim().to_string(),
            kind: command.kind,
            context: command.context,
            is_active: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        self.category_repository.store_category(&category).await?;
        info!("Created category {}", category.id);

        Ok(CategoryResult {
            category,
            success_message: "Category created successfully".to_string(),
        })
    }

    pub async fn list_categories(&self, context: Option<AccountContext>) -> Result<Vec<Category>> {
        self.category_repository.list_categories(context).await
    }

    /// Delete a category, or deactivate it when transactions or line items
    /// still reference it.
    pub async fn delete_category(&self, category_id: &str) -> Result<bool> {
        self.category_repository
            .get_category(category_id)
            .await?
            .ok_or_else(|| anyhow!("Category not found: {}", category_id))?;

        if self.category_repository.is_referenced(category_id).await? {
            self.category_repository
                .set_category_active(category_id, false)
                .await?;
            Ok(false)
        } else {
            self.category_repository.delete_category(category_id).await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::CashFlowKind;

    async fn create_test_service() -> CategoryService {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        CategoryService::new(db)
    }

    #[tokio::test]
    async fn test_create_and_list_categories() {
        let service = create_test_service().await;

        service
            .create_category(CreateCategoryCommand {
                name: "Groceries".to_string(),
                kind: CashFlowKind::Expense,
                context: AccountContext::Personal,
            })
            .await
            .unwrap();

        let listed = service.list_categories(Some(AccountContext::Personal)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Groceries");
        assert!(listed[0].is_active);
    }

    #[tokio::test]
    async fn test_unreferenced_category_is_hard_deleted() {
        let service = create_test_service().await;
        let created = service
            .create_category(CreateCategoryCommand {
                name: "Transient".to_string(),
                kind: CashFlowKind::Expense,
                context: AccountContext::Personal,
            })
            .await
            .unwrap();

        let deleted = service.delete_category(&created.category.id).await.unwrap();
        assert!(deleted);
        assert!(service
            .list_categories(None)
            .await
            .unwrap()
            .is_empty());
    }
}
