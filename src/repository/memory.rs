use async_trait::async_trait;
use chrono::Utc;
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::atomic::{AtomicI64, Ordering},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{EMAIL_TAKEN, Repository, RoleChange, normalize_email};
use crate::content::{ContentEntity, ContentRepository, OrderEntry, sort_for_display};
use crate::error::AppError;
use crate::models::{
    AdminDashboardStats, Comment, CreatePostRequest, NewUser, Post, PostPage, PostQuery, Role,
    UpdatePostRequest, User,
};
use crate::site_content::{SiteContent, SiteContentBody, SiteContentKey};

type ContentTables = HashMap<TypeId, Box<dyn Any + Send>>;

/// InMemoryRepository
///
/// Process-local implementation used for local runs without `DATABASE_URL` and by the
/// test-suite. Lock order is users, then posts, then comments; no method takes them
/// in another order.
#[derive(Default)]
pub struct InMemoryRepository {
    users: Mutex<Vec<User>>,
    posts: Mutex<Vec<Post>>,
    comments: Mutex<Vec<Comment>>,
    site_content: Mutex<HashMap<SiteContentKey, SiteContent>>,
    content: Mutex<ContentTables>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn author_names(&self) -> HashMap<Uuid, String> {
        self.users
            .lock()
            .await
            .iter()
            .map(|u| (u.id, u.name.clone()))
            .collect()
    }

    fn with_author(mut post: Post, names: &HashMap<Uuid, String>) -> Post {
        post.author_name = post.author_id.and_then(|id| names.get(&id).cloned());
        post
    }

    /// Runs `f` on the table of `T`, creating it on first use.
    async fn with_table<T, R>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> R + Send,
    ) -> Result<R, AppError>
    where
        T: ContentEntity,
    {
        let mut tables = self.content.lock().await;
        let table = tables
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<T>::new()));
        let rows = table
            .downcast_mut::<Vec<T>>()
            .ok_or_else(|| anyhow::anyhow!("content table for {} has the wrong type", T::TABLE))?;
        Ok(f(rows))
    }
}

fn ensure_unique<T: ContentEntity>(rows: &[T], candidate: &T) -> Result<(), AppError> {
    let Some(key) = candidate.unique_key() else {
        return Ok(());
    };
    let taken = rows
        .iter()
        .any(|row| row.id() != candidate.id() && row.unique_key() == Some(key));
    if taken {
        return Err(AppError::Conflict("이미 존재하는 항목입니다.".into()));
    }
    Ok(())
}

fn matches_search(post: &Post, term: Option<&str>) -> bool {
    match term {
        Some(term) => {
            let term = term.to_lowercase();
            post.title.to_lowercase().contains(&term) || post.content.to_lowercase().contains(&term)
        }
        None => true,
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.lock().await.clone())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let email = normalize_email(&user.email);
        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut users = self.users.lock().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The count and the write happen under one hold of the users lock.
    async fn update_user_role(&self, id: Uuid, role: Role) -> Result<RoleChange, AppError> {
        let mut users = self.users.lock().await;
        let admins = users.iter().filter(|u| u.is_admin()).count();

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("사용자"))?;

        if user.is_admin() && role != Role::Admin && admins <= 1 {
            return Err(AppError::LastAdmin);
        }
        let previous = user.role;
        user.role = role;
        Ok(RoleChange {
            user: user.clone(),
            previous,
        })
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        let mut users = self.users.lock().await;
        let admins = users.iter().filter(|u| u.is_admin()).count();

        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("사용자"))?;
        if users[index].is_admin() && admins <= 1 {
            return Err(AppError::LastAdmin);
        }
        users.remove(index);

        for post in self.posts.lock().await.iter_mut() {
            if post.author_id == Some(id) {
                post.author_id = None;
            }
        }
        for comment in self.comments.lock().await.iter_mut() {
            if comment.author_id == Some(id) {
                comment.author_id = None;
            }
        }
        Ok(())
    }

    async fn count_admins(&self) -> Result<i64, AppError> {
        let users = self.users.lock().await;
        Ok(users.iter().filter(|u| u.is_admin()).count() as i64)
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        include_hidden: bool,
    ) -> Result<PostPage, AppError> {
        let names = self.author_names().await;
        let posts = self.posts.lock().await;

        // Newest insert first among equal timestamps.
        let mut matching: Vec<&Post> = posts
            .iter()
            .rev()
            .filter(|p| include_hidden || p.is_active)
            .filter(|p| matches_search(p, query.search_term()))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page() as usize)
            .map(|p| Self::with_author(p.clone(), &names))
            .collect();

        Ok(PostPage {
            items,
            total,
            page: query.page(),
            per_page: query.per_page(),
        })
    }

    async fn get_post(&self, id: Uuid, include_hidden: bool) -> Result<Option<Post>, AppError> {
        let names = self.author_names().await;
        let posts = self.posts.lock().await;
        Ok(posts
            .iter()
            .find(|p| p.id == id && (include_hidden || p.is_active))
            .map(|p| Self::with_author(p.clone(), &names)))
    }

    async fn record_post_view(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let names = self.author_names().await;
        let mut posts = self.posts.lock().await;
        Ok(posts
            .iter_mut()
            .find(|p| p.id == id && p.is_active)
            .map(|p| {
                p.view_count += 1;
                Self::with_author(p.clone(), &names)
            }))
    }

    async fn create_post(
        &self,
        author_id: Uuid,
        req: CreatePostRequest,
    ) -> Result<Post, AppError> {
        let names = self.author_names().await;
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: Some(author_id),
            author_name: None,
            title: req.title,
            content: req.content,
            view_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().await.push(post.clone());
        Ok(Self::with_author(post, &names))
    }

    async fn update_post(
        &self,
        id: Uuid,
        req: UpdatePostRequest,
    ) -> Result<Option<Post>, AppError> {
        let names = self.author_names().await;
        let mut posts = self.posts.lock().await;
        Ok(posts.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(title) = req.title {
                p.title = title;
            }
            if let Some(content) = req.content {
                p.content = content;
            }
            p.updated_at = Utc::now();
            Self::with_author(p.clone(), &names)
        }))
    }

    async fn set_post_visibility(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Post>, AppError> {
        let names = self.author_names().await;
        let mut posts = self.posts.lock().await;
        Ok(posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.is_active = is_active;
            p.updated_at = Utc::now();
            Self::with_author(p.clone(), &names)
        }))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, AppError> {
        let mut posts = self.posts.lock().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        let removed = posts.len() < before;
        if removed {
            self.comments.lock().await.retain(|c| c.post_id != id);
        }
        Ok(removed)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let names = self.author_names().await;
        let comments = self.comments.lock().await;
        Ok(comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| {
                let mut comment = c.clone();
                comment.author_name = c.author_id.and_then(|id| names.get(&id).cloned());
                comment
            })
            .collect())
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Comment, AppError> {
        let names = self.author_names().await;
        let posts = self.posts.lock().await;
        if !posts.iter().any(|p| p.id == post_id && p.is_active) {
            return Err(AppError::not_found("게시글"));
        }

        let comment = Comment {
            id: self.next_id(),
            post_id,
            author_id: Some(author_id),
            author_name: names.get(&author_id).cloned(),
            content,
            created_at: Utc::now(),
        };
        self.comments.lock().await.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64, author_id: Uuid) -> Result<bool, AppError> {
        let mut comments = self.comments.lock().await;
        let before = comments.len();
        comments.retain(|c| !(c.id == id && c.author_id == Some(author_id)));
        Ok(comments.len() < before)
    }

    async fn delete_comment_admin(&self, id: i64) -> Result<bool, AppError> {
        let mut comments = self.comments.lock().await;
        let before = comments.len();
        comments.retain(|c| c.id != id);
        Ok(comments.len() < before)
    }

    async fn list_site_content(&self) -> Result<Vec<SiteContent>, AppError> {
        let blocks = self.site_content.lock().await;
        let mut list: Vec<SiteContent> = blocks.values().cloned().collect();
        list.sort_by_key(|block| block.body.key().as_str());
        Ok(list)
    }

    async fn get_site_content(
        &self,
        key: SiteContentKey,
    ) -> Result<Option<SiteContent>, AppError> {
        Ok(self.site_content.lock().await.get(&key).cloned())
    }

    async fn upsert_site_content(&self, body: SiteContentBody) -> Result<SiteContent, AppError> {
        let block = SiteContent {
            body,
            updated_at: Utc::now(),
        };
        self.site_content
            .lock()
            .await
            .insert(block.body.key(), block.clone());
        Ok(block)
    }

    async fn delete_site_content(&self, key: SiteContentKey) -> Result<bool, AppError> {
        Ok(self.site_content.lock().await.remove(&key).is_some())
    }

    async fn get_stats(&self) -> Result<AdminDashboardStats, AppError> {
        let users = self.users.lock().await;
        let posts = self.posts.lock().await;
        let comments = self.comments.lock().await;
        Ok(AdminDashboardStats {
            total_users: users.len() as i64,
            total_admins: users.iter().filter(|u| u.is_admin()).count() as i64,
            total_posts: posts.len() as i64,
            hidden_posts: posts.iter().filter(|p| !p.is_active).count() as i64,
            total_comments: comments.len() as i64,
        })
    }
}

#[async_trait]
impl<T: ContentEntity> ContentRepository<T> for InMemoryRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<T>, AppError> {
        self.with_table::<T, _>(|rows| {
            let mut list: Vec<T> = rows
                .iter()
                .filter(|row| !active_only || row.is_active())
                .cloned()
                .collect();
            sort_for_display(&mut list);
            list
        })
        .await
    }

    async fn get(&self, id: i64, active_only: bool) -> Result<Option<T>, AppError> {
        self.with_table::<T, _>(|rows| {
            rows.iter()
                .find(|row| row.id() == id && (!active_only || row.is_active()))
                .cloned()
        })
        .await
    }

    async fn create(&self, req: T::Create) -> Result<T, AppError> {
        T::validate(&req)?;
        let row = T::build(self.next_id(), req, Utc::now());
        self.with_table::<T, _>(|rows| -> Result<T, AppError> {
            ensure_unique(rows, &row)?;
            rows.push(row.clone());
            Ok(row)
        })
        .await?
    }

    async fn update(&self, id: i64, req: T::Update) -> Result<Option<T>, AppError> {
        self.with_table::<T, _>(|rows| -> Result<Option<T>, AppError> {
            let Some(index) = rows.iter().position(|row| row.id() == id) else {
                return Ok(None);
            };
            let mut merged = rows[index].clone();
            merged.apply(req, Utc::now());
            merged.check()?;
            ensure_unique(rows, &merged)?;
            rows[index] = merged.clone();
            Ok(Some(merged))
        })
        .await?
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        self.with_table::<T, _>(|rows| {
            let before = rows.len();
            rows.retain(|row| row.id() != id);
            rows.len() < before
        })
        .await
    }

    async fn reorder(&self, entries: Vec<OrderEntry>) -> Result<Vec<T>, AppError> {
        self.with_table::<T, _>(|rows| -> Result<Vec<T>, AppError> {
            if entries
                .iter()
                .any(|entry| !rows.iter().any(|row| row.id() == entry.id))
            {
                return Err(AppError::not_found(T::LABEL));
            }
            let now = Utc::now();
            for entry in &entries {
                if let Some(row) = rows.iter_mut().find(|row| row.id() == entry.id) {
                    row.set_order(entry.order, now);
                }
            }
            let mut list = rows.clone();
            sort_for_display(&mut list);
            Ok(list)
        })
        .await?
    }
}
