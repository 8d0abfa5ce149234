use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate_not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Student,
    Alumni,
    Professor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "STUDENT",
            UserRole::Alumni => "ALUMNI",
            UserRole::Professor => "PROFESSOR",
            UserRole::Admin => "ADMIN",
        }
    }
}

/// Free-form profile lists. Also the body of the aura endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProfileLists {
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub tech_stack: Vec<String>,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub communication_skills: Vec<String>,
    pub certifications: Vec<String>,
    pub projects: Vec<String>,
    pub soft_skills: Vec<String>,
    pub hobbies: Vec<String>,
    pub experience: Vec<String>,
    pub internships: Vec<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub profile_completed: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub profile: ProfileLists,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(
        length(min = 3, max = 50, message = "username must be 3-50 characters"),
        custom(function = "validate_not_blank", message = "username must not be blank")
    )]
    pub username: String,
    #[validate(
        length(min = 1, max = 100, message = "name must be 1-100 characters"),
        custom(function = "validate_not_blank", message = "name must not be blank")
    )]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Partial profile update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(
        length(min = 1, max = 100, message = "name must be 1-100 characters"),
        custom(function = "validate_not_blank", message = "name must not be blank")
    )]
    pub name: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<String>>,
    pub tech_stack: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub frameworks: Option<Vec<String>>,
    pub communication_skills: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    pub projects: Option<Vec<String>>,
    pub soft_skills: Option<Vec<String>>,
    pub hobbies: Option<Vec<String>>,
    pub experience: Option<Vec<String>>,
    pub internships: Option<Vec<String>>,
}

impl UpdateProfileRequest {
    /// True when the update fills in at least one profile list.
    pub fn sets_any_list(&self) -> bool {
        [
            &self.skills,
            &self.education,
            &self.tech_stack,
            &self.languages,
            &self.frameworks,
            &self.communication_skills,
            &self.certifications,
            &self.projects,
            &self.soft_skills,
            &self.hobbies,
            &self.experience,
            &self.internships,
        ]
        .iter()
        .any(|list| list.as_ref().map(|l| !l.is_empty()).unwrap_or(false))
    }

    /// Apply to in-memory lists, keeping values the update leaves out.
    pub fn apply_to(&self, profile: &mut ProfileLists) {
        fn set(target: &mut Vec<String>, value: &Option<Vec<String>>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        set(&mut profile.skills, &self.skills);
        set(&mut profile.education, &self.education);
        set(&mut profile.tech_stack, &self.tech_stack);
        set(&mut profile.languages, &self.languages);
        set(&mut profile.frameworks, &self.frameworks);
        set(&mut profile.communication_skills, &self.communication_skills);
        set(&mut profile.certifications, &self.certifications);
        set(&mut profile.projects, &self.projects);
        set(&mut profile.soft_skills, &self.soft_skills);
        set(&mut profile.hobbies, &self.hobbies);
        set(&mut profile.experience, &self.experience);
        set(&mut profile.internships, &self.internships);
    }
}

/// Compact user view for lists and search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub profile_completed: bool,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            email: user.email,
            role: user.role,
            profile_completed: user.profile_completed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    #[serde(alias = "q", alias = "username")]
    pub query: Option<String>,
}
