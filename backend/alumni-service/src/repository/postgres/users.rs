use async_trait::async_trait;
use error_types::error_codes;
use sqlx::PgPool;
use tracing::debug;

use super::{like_pattern, violated_constraint};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateProfileRequest, User};
use crate::repository::UserRepository;

const USER_COLUMNS: &str = r#"
    id, username, name, email, password_hash, role, profile_completed,
    skills, education, tech_stack, languages, frameworks, communication_skills,
    certifications, projects, soft_skills, hobbies, experience, internships,
    created_at, updated_at
"#;

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error) -> AppError {
    match violated_constraint(&err) {
        Some("users_username_key") => {
            AppError::conflict(error_codes::USER_ALREADY_EXISTS, "Username already exists")
        }
        Some("users_email_key") => {
            AppError::conflict(error_codes::USER_ALREADY_EXISTS, "Email already exists")
        }
        _ => err.into(),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (username, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        debug!(user_id = created.id, username = %created.username, "created user");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn update_profile(
        &self,
        id: i64,
        update: &UpdateProfileRequest,
        mark_completed: bool,
    ) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                name                 = COALESCE($2, name),
                skills               = COALESCE($3, skills),
                education            = COALESCE($4, education),
                tech_stack           = COALESCE($5, tech_stack),
                languages            = COALESCE($6, languages),
                frameworks           = COALESCE($7, frameworks),
                communication_skills = COALESCE($8, communication_skills),
                certifications       = COALESCE($9, certifications),
                projects             = COALESCE($10, projects),
                soft_skills          = COALESCE($11, soft_skills),
                hobbies              = COALESCE($12, hobbies),
                experience           = COALESCE($13, experience),
                internships          = COALESCE($14, internships),
                profile_completed    = profile_completed OR $15,
                updated_at           = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(&update.skills)
            .bind(&update.education)
            .bind(&update.tech_stack)
            .bind(&update.languages)
            .bind(&update.frameworks)
            .bind(&update.communication_skills)
            .bind(&update.certifications)
            .bind(&update.projects)
            .bind(&update.soft_skills)
            .bind(&update.hobbies)
            .bind(&update.experience)
            .bind(&update.internships)
            .bind(mark_completed)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn search(&self, fragment: &str) -> AppResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users \
             WHERE LOWER(username) LIKE $1 OR LOWER(name) LIKE $1 \
             ORDER BY username",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(like_pattern(&fragment.to_lowercase()))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn count_existing(&self, ids: &[i64]) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
