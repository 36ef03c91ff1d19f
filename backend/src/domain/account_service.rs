use std::sync::Arc;
use tracing::{info, warn};

use crate::storage::traits::{Connection, UserStorage};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("User {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Service for the caller's own account
#[derive(Clone)]
pub struct AccountService<C: Connection> {
    user_repository: C::UserRepository,
}

impl<C: Connection> AccountService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
        }
    }

    /// Delete the user together with every baby and measurement they own
    pub async fn delete_account(&self, user_id: i64) -> Result<(), AccountError> {
        info!("Deleting account of user {}", user_id);

        if self.user_repository.delete_user(user_id).await? {
            Ok(())
        } else {
            warn!("User not found for deletion: {}", user_id);
            Err(AccountError::NotFound(user_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DbConnection;

    #[tokio::test]
    async fn test_delete_account_once() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let users = db.create_user_repository();
        let user_id = users.create_user("parent@example.com").await.unwrap();
        let service = AccountService::new(Arc::new(db));

        service.delete_account(user_id).await.unwrap();
        assert_eq!(users.find_user_id_by_email("parent@example.com").await.unwrap(), None);
        assert!(matches!(
            service.delete_account(user_id).await.unwrap_err(),
            AccountError::NotFound(id) if id == user_id
        ));
    }
}
