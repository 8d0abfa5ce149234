use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2,
};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{non_blank, CreateUserRequest, NewUser, ProfileLists, UpdateProfileRequest, User};
use crate::repository::UserRepository;

/// Hash a password with Argon2id. Returns the PHC string stored in `users`.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> AppResult<User> {
        req.validate()?;

        // Argon2 is CPU bound; keep it off the async workers.
        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))??;

        let user = self
            .users
            .create(NewUser {
                username: req.username.trim().to_string(),
                name: req.name.trim().to_string(),
                email: req.email.trim().to_string(),
                password_hash,
                role: req.role.unwrap_or_default(),
            })
            .await?;

        info!(user_id = user.id, username = %user.username, role = user.role.as_str(), "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.users.list_all().await
    }

    /// Partial update. The profile counts as completed once any list is filled in.
    pub async fn update_profile(&self, user_id: i64, req: UpdateProfileRequest) -> AppResult<User> {
        req.validate()?;
        let mark_completed = req.sets_any_list();

        self.users
            .update_profile(user_id, &req, mark_completed)
            .await?
            .ok_or_else(|| AppError::user_not_found(user_id))
    }

    pub async fn search(&self, query: Option<&str>) -> AppResult<Vec<User>> {
        let fragment = non_blank(query)
            .ok_or_else(|| AppError::BadRequest("Search query must not be empty".to_string()))?;
        self.users.search(&fragment).await
    }

    pub async fn aura(&self, user_id: i64) -> AppResult<ProfileLists> {
        Ok(self.get_user(user_id).await?.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::repository::memory::MemoryStore;
    use argon2::{PasswordHash, PasswordVerifier};

    fn request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            name: "Elif Kaya".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            role: None,
        }
    }

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_user_hashes_password_and_defaults_role() {
        let service = service();
        let user = service
            .create_user(request("elif", "elif@campus.edu"))
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Student);
        assert!(!user.profile_completed);
        assert_ne!(user.password_hash, "correct horse");
        let parsed = PasswordHash::new(&user.password_hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = service();
        service
            .create_user(request("elif", "elif@campus.edu"))
            .await
            .unwrap();

        let err = service
            .create_user(request("elif2", "elif@campus.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let err = service()
            .create_user(request("ab", "not-an-email"))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(details) => {
                assert!(details.contains("email"));
                assert!(details.contains("username"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_profile_marks_completed() {
        let service = service();
        let user = service
            .create_user(request("elif", "elif@campus.edu"))
            .await
            .unwrap();

        let renamed = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    name: Some("Elif K.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Elif K.");
        assert!(!renamed.profile_completed);

        let updated = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    skills: Some(vec!["rust".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.profile_completed);
        assert_eq!(updated.name, "Elif K.");
        assert_eq!(
            service.aura(user.id).await.unwrap().skills,
            vec!["rust".to_string()]
        );
    }

    #[tokio::test]
    async fn test_search_rejects_blank_and_matches_case_insensitively() {
        let service = service();
        service
            .create_user(request("elif", "elif@campus.edu"))
            .await
            .unwrap();

        assert!(matches!(
            service.search(Some("   ")).await.unwrap_err(),
            AppError::BadRequest(_)
        ));
        let found = service.search(Some(" KAYA ")).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let err = service().get_user(404).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found with id: 404");
    }
}
