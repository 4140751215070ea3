use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::database::entities::profiles;
use crate::errors::{CoreError, CoreResult};
use crate::services::ValidationService;

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    db: DatabaseConnection,
}

impl ProfileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, profile_id: i32) -> CoreResult<profiles::Model> {
        profiles::Entity::find_by_id(profile_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Profile", profile_id.to_string()))
    }

    pub async fn update_profile(
        &self,
        profile_id: i32,
        update: ProfileUpdate,
    ) -> CoreResult<profiles::Model> {
        let profile = self.get_profile(profile_id).await?;
        let mut active: profiles::ActiveModel = profile.into();

        if let Some(full_name) = update.full_name.as_deref() {
            active.full_name = Set(ValidationService::required_text("full_name", full_name, 100)?);
        }

        // An empty string clears the avatar
        if let Some(avatar_url) = update.avatar_url.as_deref() {
            let avatar_url = avatar_url.trim();
            active.avatar_url = if avatar_url.is_empty() {
                Set(None)
            } else {
                Set(Some(ValidationService::validate_url("avatar_url", avatar_url)?))
            };
        }

        if let Some(bio) = update.bio.as_deref() {
            active.bio = Set(ValidationService::optional_text("bio", Some(bio), 1000)?);
        }

        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await?;

        tracing::debug!(profile_id, "Profile updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{setup_test_db, TEST_HASH_COST};
    use crate::errors::CoreErrorKind;
    use crate::services::AuthService;

    async fn profile(db: &DatabaseConnection) -> profiles::Model {
        AuthService::new(db.clone())
            .with_hash_cost(TEST_HASH_COST)
            .sign_up("grace@example.com", "password1", "Grace Hopper")
            .await
            .unwrap()
            .profile
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let db = setup_test_db().await;
        let created = profile(&db).await;
        let service = ProfileService::new(db);

        let updated = service
            .update_profile(
                created.id,
                ProfileUpdate {
                    bio: Some("Compilers".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.full_name, "Grace Hopper");
        assert_eq!(updated.bio.as_deref(), Some("Compilers"));

        let cleared = service
            .update_profile(
                created.id,
                ProfileUpdate {
                    bio: Some("  ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.bio, None);
    }

    #[tokio::test]
    async fn blank_name_and_long_bio_are_rejected() {
        let db = setup_test_db().await;
        let created = profile(&db).await;
        let service = ProfileService::new(db);

        let err = service
            .update_profile(
                created.id,
                ProfileUpdate {
                    full_name: Some("   ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);

        let err = service
            .update_profile(
                created.id,
                ProfileUpdate {
                    bio: Some("x".repeat(1001)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let db = setup_test_db().await;
        let err = ProfileService::new(db).get_profile(42).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
    }
}
