use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::baby::{CreateBabyCommand, UpdateBabyCommand};
use crate::domain::models::baby::{normalize_name, parse_birth_date, Baby, BabyValidationError, NewBaby};
use crate::storage::sqlite::connection::now_timestamp;
use crate::storage::traits::{BabyStorage, Connection};

#[derive(Debug, thiserror::Error)]
pub enum BabyError {
    #[error(transparent)]
    Validation(#[from] BabyValidationError),
    #[error("Baby not found: {0}")]
    NotFound(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Service for managing a user's babies
#[derive(Clone)]
pub struct BabyService<C: Connection> {
    baby_repository: C::BabyRepository,
}

impl<C: Connection> BabyService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let baby_repository = connection.create_baby_repository();
        Self { baby_repository }
    }

    /// Create a baby after trimming and validating its fields
    pub async fn create_baby(&self, user_id: i64, command: CreateBabyCommand) -> Result<Baby, BabyError> {
        info!("Creating baby for user {}: name={}", user_id, command.name);

        let birth_date = parse_birth_date(&command.birth_date)?;
        let new_baby = NewBaby::new(&command.name, command.gender, birth_date)?;
        let baby = self.baby_repository.store_baby(user_id, &new_baby).await?;

        info!("Created baby {} ({})", baby.id, baby.name);
        Ok(baby)
    }

    /// List a user's babies, newest first
    pub async fn list_babies(&self, user_id: i64) -> Result<Vec<Baby>, BabyError> {
        let mut babies = self.baby_repository.list_babies(user_id).await?;
        babies.reverse();
        info!("Found {} babies for user {}", babies.len(), user_id);
        Ok(babies)
    }

    /// Apply a partial update. Every provided field is validated before anything is stored.
    pub async fn update_baby(
        &self,
        user_id: i64,
        baby_id: i64,
        command: UpdateBabyCommand,
    ) -> Result<Baby, BabyError> {
        info!("Updating baby {} for user {}", baby_id, user_id);

        let mut baby = self
            .baby_repository
            .get_baby(user_id, baby_id)
            .await?
            .ok_or(BabyError::NotFound(baby_id))?;

        if let Some(name) = command.name.as_deref() {
            baby.name = normalize_name(name)?;
        }
        if let Some(gender) = command.gender {
            baby.gender = gender;
        }
        if let Some(birth_date) = command.birth_date.as_deref() {
            baby.birth_date = parse_birth_date(birth_date)?;
        }
        baby.updated_at = now_timestamp();

        self.baby_repository.update_baby(&baby).await?;
        Ok(baby)
    }

    /// Delete a baby together with its measurements
    pub async fn delete_baby(&self, user_id: i64, baby_id: i64) -> Result<(), BabyError> {
        info!("Deleting baby {} for user {}", baby_id, user_id);

        if self.baby_repository.delete_baby(user_id, baby_id).await? {
            Ok(())
        } else {
            warn!("Baby not found for deletion: {}", baby_id);
            Err(BabyError::NotFound(baby_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::baby::Gender;
    use crate::storage::traits::UserStorage;
    use crate::storage::DbConnection;

    async fn setup_test() -> (BabyService<DbConnection>, i64) {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let user_id = db
            .create_user_repository()
            .create_user("parent@example.com")
            .await
            .expect("Failed to create user");
        (BabyService::new(Arc::new(db)), user_id)
    }

    fn create_command(name: &str, birth_date: &str) -> CreateBabyCommand {
        CreateBabyCommand {
            name: name.to_string(),
            gender: Gender::Female,
            birth_date: birth_date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_baby_trims_name_and_accepts_timestamps() {
        let (service, user_id) = setup_test().await;

        let baby = service
            .create_baby(user_id, create_command("  Ada ", "2024-02-10T22:00:00-05:00"))
            .await
            .unwrap();

        assert_eq!(baby.name, "Ada");
        assert_eq!(baby.birth_date.to_string(), "2024-02-11");
    }

    #[tokio::test]
    async fn test_create_baby_rejects_invalid_fields() {
        let (service, user_id) = setup_test().await;

        let err = service.create_baby(user_id, create_command("   ", "2024-01-01")).await.unwrap_err();
        assert!(matches!(err, BabyError::Validation(BabyValidationError::EmptyName)));

        let err = service.create_baby(user_id, create_command("Ada", "soon")).await.unwrap_err();
        assert!(matches!(err, BabyError::Validation(BabyValidationError::InvalidBirthDate)));

        assert!(service.list_babies(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_babies_newest_first() {
        let (service, user_id) = setup_test().await;
        service.create_baby(user_id, create_command("First", "2023-01-01")).await.unwrap();
        service.create_baby(user_id, create_command("Second", "2024-01-01")).await.unwrap();

        let names: Vec<String> = service
            .list_babies(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Second".to_string(), "First".to_string()]);
    }

    #[tokio::test]
    async fn test_update_baby_partial_fields() {
        let (service, user_id) = setup_test().await;
        let baby = service.create_baby(user_id, create_command("Ada", "2023-01-01")).await.unwrap();

        let updated = service
            .update_baby(
                user_id,
                baby.id,
                UpdateBabyCommand {
                    gender: Some(Gender::Male),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.gender, Gender::Male);
        assert_eq!(updated.birth_date, baby.birth_date);

        let err = service
            .update_baby(
                user_id,
                baby.id,
                UpdateBabyCommand {
                    name: Some("x".repeat(51)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BabyError::Validation(BabyValidationError::NameTooLong)));
    }

    #[tokio::test]
    async fn test_updated_baby_matches_stored_row() {
        let (service, user_id) = setup_test().await;
        let baby = service.create_baby(user_id, create_command("Ada", "2023-01-01")).await.unwrap();

        let updated = service
            .update_baby(
                user_id,
                baby.id,
                UpdateBabyCommand {
                    name: Some("Adele".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reloaded = service.baby_repository.get_baby(user_id, baby.id).await.unwrap().unwrap();
        assert_eq!(updated, reloaded);
    }

    #[tokio::test]
    async fn test_missing_baby_is_not_found() {
        let (service, user_id) = setup_test().await;

        let err = service.update_baby(user_id, 99, UpdateBabyCommand::default()).await.unwrap_err();
        assert!(matches!(err, BabyError::NotFound(99)));

        let err = service.delete_baby(user_id, 99).await.unwrap_err();
        assert!(matches!(err, BabyError::NotFound(99)));
    }
}
