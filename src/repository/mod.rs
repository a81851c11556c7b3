use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    AdminDashboardStats, Comment, CreatePostRequest, NewUser, Post, PostPage, PostQuery, Role,
    UpdatePostRequest, User,
};
use crate::site_content::{SiteContent, SiteContentBody, SiteContentKey};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

pub(crate) const EMAIL_TAKEN: &str = "이미 사용 중인 이메일입니다.";

/// Repository Trait
///
/// Persistence contract for accounts, the community board and site content blocks.
/// Ordered content entities live behind the generic `ContentRepository<T>` instead.
///
/// Every operation returns `Result<_, AppError>` so storage failures surface as 500s
/// instead of being swallowed into empty results.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// Emails are stored lower-cased; the lookup normalizes its input the same way.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;

    /// Changes a role. Demoting the last admin fails with `LastAdmin` and changes nothing;
    /// the check and the write happen as one atomic step, and the role the user had at
    /// that step is reported back.
    async fn update_user_role(&self, id: Uuid, role: Role) -> Result<RoleChange, AppError>;

    /// Deletes an account under the same last-admin guard as `update_user_role`.
    /// Posts and comments of the user stay, with their author cleared.
    async fn delete_user(&self, id: Uuid) -> Result<(), AppError>;

    async fn count_admins(&self) -> Result<i64, AppError>;

    // --- Community Board ---
    /// Newest first. Hidden posts are only included for the admin listing.
    async fn list_posts(&self, query: &PostQuery, include_hidden: bool)
    -> Result<PostPage, AppError>;
    async fn get_post(&self, id: Uuid, include_hidden: bool) -> Result<Option<Post>, AppError>;
    /// Increments the view counter of a visible post and returns it.
    async fn record_post_view(&self, id: Uuid) -> Result<Option<Post>, AppError>;
    async fn create_post(&self, author_id: Uuid, req: CreatePostRequest)
    -> Result<Post, AppError>;
    /// Partial update (COALESCE semantics). Ownership is checked by the caller.
    async fn update_post(&self, id: Uuid, req: UpdatePostRequest)
    -> Result<Option<Post>, AppError>;
    async fn set_post_visibility(&self, id: Uuid, is_active: bool)
    -> Result<Option<Post>, AppError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError>;
    /// Fails with `NotFound` when the post does not exist or is hidden.
    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Comment, AppError>;
    /// Owner-only delete: returns false unless the comment exists AND belongs to `author_id`.
    async fn delete_comment(&self, id: i64, author_id: Uuid) -> Result<bool, AppError>;
    /// Admin override: deletes any comment.
    async fn delete_comment_admin(&self, id: i64) -> Result<bool, AppError>;

    // --- Site Content ---
    async fn list_site_content(&self) -> Result<Vec<SiteContent>, AppError>;
    async fn get_site_content(&self, key: SiteContentKey)
    -> Result<Option<SiteContent>, AppError>;
    async fn upsert_site_content(&self, body: SiteContentBody) -> Result<SiteContent, AppError>;
    async fn delete_site_content(&self, key: SiteContentKey) -> Result<bool, AppError>;

    // --- Admin ---
    async fn get_stats(&self) -> Result<AdminDashboardStats, AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Outcome of `update_user_role`: the stored user and the role it held before.
#[derive(Debug, Clone)]
pub struct RoleChange {
    pub user: User,
    pub previous: Role,
}

impl RoleChange {
    pub fn changed(&self) -> bool {
        self.previous != self.user.role
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
