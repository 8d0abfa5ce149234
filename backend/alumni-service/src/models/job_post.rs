use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{non_blank, validate_not_blank, PageRequest};

pub const DEFAULT_POST_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobPost {
    pub id: i64,
    pub username: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJobPost {
    pub username: String,
    pub description: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(custom(function = "validate_not_blank", message = "username is required"))]
    pub username: String,
    #[validate(
        length(max = 5000, message = "description must be at most 5000 characters"),
        custom(function = "validate_not_blank", message = "description is required")
    )]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 5, message = "at most 5 images per post"))]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreatedResponse {
    pub message: String,
    pub post_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Raw query string of `GET /api/posts/search`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSearchQuery {
    pub keyword: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Normalised search criteria handed to the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct PostSearchCriteria {
    /// Trimmed, lower-cased keyword; `None` when blank
    pub keyword: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: PageRequest,
}

impl From<PostSearchQuery> for PostSearchCriteria {
    fn from(query: PostSearchQuery) -> Self {
        Self {
            keyword: non_blank(query.keyword.as_deref()).map(|k| k.to_lowercase()),
            date_from: query.date_from,
            date_to: query.date_to,
            page: PageRequest::normalize(query.page, query.size, DEFAULT_POST_PAGE_SIZE),
        }
    }
}

impl PostSearchCriteria {
    /// Same predicate the SQL query applies.
    pub fn matches(&self, post: &JobPost) -> bool {
        let keyword_ok = self
            .keyword
            .as_ref()
            .map(|k| post.description.to_lowercase().contains(k.as_str()))
            .unwrap_or(true);
        let from_ok = self.date_from.map(|f| post.created_at >= f).unwrap_or(true);
        let to_ok = self.date_to.map(|t| post.created_at <= t).unwrap_or(true);
        keyword_ok && from_ok && to_ok
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedPostResponse {
    pub posts: Vec<JobPost>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_elements: i64,
    pub page_size: i64,
    pub is_first: bool,
    pub is_last: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PagedPostResponse {
    pub fn new(posts: Vec<JobPost>, page: PageRequest, total_elements: i64) -> Self {
        let total_pages = page.total_pages(total_elements);
        let has_next = page.has_next(total_pages);
        Self {
            posts,
            current_page: page.page,
            total_pages,
            total_elements,
            page_size: page.size,
            is_first: page.page == 0,
            is_last: !has_next,
            has_next,
            has_previous: page.page > 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActingUserQuery {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub user_id: i64,
    #[validate(
        length(min = 1, max = 1000, message = "content must be 1-1000 characters"),
        custom(function = "validate_not_blank", message = "content must not be blank")
    )]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(description: &str, day: u32) -> JobPost {
        let at = Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap();
        JobPost {
            id: day as i64,
            username: "hasan".to_string(),
            description: description.to_string(),
            image_urls: vec![],
            like_count: 0,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_criteria_normalisation() {
        let criteria = PostSearchCriteria::from(PostSearchQuery {
            keyword: Some("  Rust  ".to_string()),
            page: Some(-1),
            size: Some(1000),
            ..Default::default()
        });
        assert_eq!(criteria.keyword.as_deref(), Some("rust"));
        assert_eq!(criteria.page, PageRequest { page: 0, size: 100 });

        let blank = PostSearchCriteria::from(PostSearchQuery {
            keyword: Some("   ".to_string()),
            ..Default::default()
        });
        assert!(blank.keyword.is_none());
        assert_eq!(blank.page.size, DEFAULT_POST_PAGE_SIZE);
    }

    #[test]
    fn test_criteria_matching_is_case_insensitive_and_inclusive() {
        let criteria = PostSearchCriteria {
            keyword: Some("backend".to_string()),
            date_from: Some(Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()),
            date_to: Some(Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap()),
            page: PageRequest { page: 0, size: 10 },
        };
        assert!(criteria.matches(&post("Hiring a BACKEND engineer", 2)));
        assert!(criteria.matches(&post("backend role", 4)));
        assert!(!criteria.matches(&post("backend role", 5)));
        assert!(!criteria.matches(&post("frontend role", 3)));
    }

    #[test]
    fn test_paged_response_flags() {
        let response = PagedPostResponse::new(vec![], PageRequest { page: 0, size: 10 }, 25);
        assert_eq!(response.total_pages, 3);
        assert!(response.is_first);
        assert!(response.has_next);
        assert!(!response.has_previous);
        assert!(!response.is_last);

        let beyond = PagedPostResponse::new(vec![], PageRequest { page: 5, size: 10 }, 25);
        assert!(beyond.is_last);
        assert!(!beyond.has_next);
        assert!(beyond.has_previous);
    }

    #[test]
    fn test_paged_response_on_huge_page_index() {
        let capped = PageRequest::normalize(Some(i64::MAX), Some(10), DEFAULT_POST_PAGE_SIZE);
        let response = PagedPostResponse::new(vec![], capped, 5);
        assert!(!response.has_next);
        assert!(response.is_last);

        let raw = PagedPostResponse::new(vec![], PageRequest { page: i64::MAX, size: 10 }, 5);
        assert!(!raw.has_next);
        assert!(raw.has_previous);
    }
}
