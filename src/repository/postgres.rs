use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder, types::Json};
use uuid::Uuid;

use super::{EMAIL_TAKEN, Repository, RoleChange, normalize_email};
use crate::content::{ContentEntity, ContentRepository, OrderEntry};
use crate::error::AppError;
use crate::models::{
    AdminDashboardStats, Comment, CreatePostRequest, NewUser, Post, PostPage, PostQuery, Role,
    UpdatePostRequest, User, UserRow,
};
use crate::site_content::{SiteContent, SiteContentBody, SiteContentKey, SiteContentRow};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

const POST_SELECT: &str = r#"
    SELECT
        p.id, p.author_id, u.name AS author_name, p.title, p.content,
        p.view_count, p.is_active, p.created_at, p.updated_at
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, u.name AS author_name, c.content, c.created_at
    FROM comments c
    LEFT JOIN users u ON u.id = c.author_id
"#;

/// PostgresRepository
///
/// The production implementation of `Repository` and of every `ContentRepository<T>`,
/// backed by a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Locks every admin row for the rest of the transaction and returns their ids.
    /// Concurrent role changes and deletions queue behind this lock, so the count they
    /// see is the count they mutate against.
    async fn lock_admins(
        tx: &mut sqlx::Transaction<'_, Postgres>,
    ) -> Result<Vec<Uuid>, AppError> {
        let admins: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE role = 'admin' ORDER BY id FOR UPDATE")
                .fetch_all(&mut **tx)
                .await?;
        Ok(admins.into_iter().map(|(id,)| id).collect())
    }

    async fn lock_user(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<User, AppError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        match row {
            Some(row) => Ok(User::try_from(row)?),
            None => Err(AppError::not_found("사용자")),
        }
    }
}

/// Adds the WHERE clause shared by the board count and page queries.
fn push_post_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &PostQuery,
    include_hidden: bool,
) {
    builder.push(" WHERE 1 = 1");
    if !include_hidden {
        builder.push(" AND p.is_active = true");
    }
    if let Some(term) = query.search_term() {
        let pattern = format!("%{term}%");
        builder.push(" AND (p.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR p.content ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.name)
        .bind(normalize_email(&user.email))
        .bind(user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(EMAIL_TAKEN.into()),
            other => other,
        })?;
        Ok(User::try_from(row)?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// update_user_role
    ///
    /// One transaction: lock all admin rows, lock the target, check, write, commit.
    /// Returning early drops the transaction, which rolls it back.
    async fn update_user_role(&self, id: Uuid, role: Role) -> Result<RoleChange, AppError> {
        let mut tx = self.pool.begin().await?;

        let admins = Self::lock_admins(&mut tx).await?;
        let target = Self::lock_user(&mut tx, id).await?;
        let previous = target.role;

        if previous == role {
            return Ok(RoleChange {
                user: target,
                previous,
            });
        }
        if target.is_admin() && role != Role::Admin && admins.len() <= 1 {
            return Err(AppError::LastAdmin);
        }

        let row: UserRow = sqlx::query_as(&format!(
            "UPDATE users SET role = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(role.as_str())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(RoleChange {
            user: User::try_from(row)?,
            previous,
        })
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let admins = Self::lock_admins(&mut tx).await?;
        let target = Self::lock_user(&mut tx, id).await?;

        if target.is_admin() && admins.len() <= 1 {
            return Err(AppError::LastAdmin);
        }

        // posts.author_id / comments.author_id are ON DELETE SET NULL
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn count_admins(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// list_posts
    ///
    /// Search and visibility filters are parameterized through QueryBuilder; the same
    /// filter feeds the total count so pagination stays consistent.
    async fn list_posts(
        &self,
        query: &PostQuery,
        include_hidden: bool,
    ) -> Result<PostPage, AppError> {
        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        push_post_filter(&mut count_builder, query, include_hidden);
        let (total,) = count_builder
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_SELECT);
        push_post_filter(&mut builder, query, include_hidden);
        builder.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        builder.push_bind(query.per_page());
        builder.push(" OFFSET ");
        builder.push_bind(query.offset());
        let items = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        Ok(PostPage {
            items,
            total,
            page: query.page(),
            per_page: query.per_page(),
        })
    }

    async fn get_post(&self, id: Uuid, include_hidden: bool) -> Result<Option<Post>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_SELECT);
        builder.push(" WHERE p.id = ");
        builder.push_bind(id);
        if !include_hidden {
            builder.push(" AND p.is_active = true");
        }
        Ok(builder
            .build_query_as::<Post>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn record_post_view(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let updated: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 AND is_active = true RETURNING id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(_) => self.get_post(id, false).await,
            None => Ok(None),
        }
    }

    async fn create_post(
        &self,
        author_id: Uuid,
        req: CreatePostRequest,
    ) -> Result<Post, AppError> {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO posts (author_id, title, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(author_id)
        .bind(req.title)
        .bind(req.content)
        .fetch_one(&self.pool)
        .await?;

        self.get_post(id, true)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("post {id} vanished after insert")))
    }

    async fn update_post(
        &self,
        id: Uuid,
        req: UpdatePostRequest,
    ) -> Result<Option<Post>, AppError> {
        let updated: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE posts SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                updated_at = now()
            WHERE id = $3
            RETURNING id
            "#,
        )
        .bind(req.title)
        .bind(req.content)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(_) => self.get_post(id, true).await,
            None => Ok(None),
        }
    }

    async fn set_post_visibility(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Post>, AppError> {
        let updated: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE posts SET is_active = $1, updated_at = now() WHERE id = $2 RETURNING id",
        )
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(_) => self.get_post(id, true).await,
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, AppError> {
        // comments.post_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    /// add_comment
    ///
    /// The visibility check and the insert are one statement: the INSERT selects from
    /// the visible post, so a missing or hidden post inserts nothing.
    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH target AS (
                SELECT id FROM posts WHERE id = $1 AND is_active = true
            ), inserted AS (
                INSERT INTO comments (post_id, author_id, content)
                SELECT id, $2, $3 FROM target
                RETURNING id, post_id, author_id, content, created_at
            )
            SELECT i.id, i.post_id, i.author_id, u.name AS author_name, i.content, i.created_at
            FROM inserted i
            LEFT JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        comment.ok_or_else(|| AppError::not_found("게시글"))
    }

    async fn delete_comment(&self, id: i64, author_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment_admin(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_site_content(&self) -> Result<Vec<SiteContent>, AppError> {
        let rows: Vec<SiteContentRow> =
            sqlx::query_as("SELECT key, content, updated_at FROM site_content ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
        let blocks = rows
            .into_iter()
            .map(SiteContent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(blocks)
    }

    async fn get_site_content(
        &self,
        key: SiteContentKey,
    ) -> Result<Option<SiteContent>, AppError> {
        let row: Option<SiteContentRow> =
            sqlx::query_as("SELECT key, content, updated_at FROM site_content WHERE key = $1")
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(SiteContent::try_from).transpose()?)
    }

    async fn upsert_site_content(&self, body: SiteContentBody) -> Result<SiteContent, AppError> {
        let content = body.content_value().map_err(anyhow::Error::from)?;
        let row: SiteContentRow = sqlx::query_as(
            r#"
            INSERT INTO site_content (key, content, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE
                SET content = EXCLUDED.content, updated_at = now()
            RETURNING key, content, updated_at
            "#,
        )
        .bind(body.key().as_str())
        .bind(Json(content))
        .fetch_one(&self.pool)
        .await?;
        Ok(SiteContent::try_from(row)?)
    }

    async fn delete_site_content(&self, key: SiteContentKey) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM site_content WHERE key = $1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_stats(&self) -> Result<AdminDashboardStats, AppError> {
        let (total_users, total_admins, total_posts, hidden_posts, total_comments): (
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM users WHERE role = 'admin'),
                (SELECT COUNT(*) FROM posts),
                (SELECT COUNT(*) FROM posts WHERE is_active = false),
                (SELECT COUNT(*) FROM comments)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminDashboardStats {
            total_users,
            total_admins,
            total_posts,
            hidden_posts,
            total_comments,
        })
    }
}

/// Generic ordered-content storage. Table and column names come from `ContentEntity`
/// constants, never from request data; values are always bound.
#[async_trait]
impl<T: ContentEntity> ContentRepository<T> for PostgresRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<T>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM {}", T::COLUMNS, T::TABLE));
        if active_only {
            builder.push(" WHERE is_active = true");
        }
        builder.push(" ORDER BY sort_order ASC, id ASC");
        Ok(builder.build_query_as::<T>().fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i64, active_only: bool) -> Result<Option<T>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            T::COLUMNS,
            T::TABLE
        ));
        builder.push_bind(id);
        if active_only {
            builder.push(" AND is_active = true");
        }
        Ok(builder
            .build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, req: T::Create) -> Result<T, AppError> {
        T::validate(&req)?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {} ", T::TABLE));
        T::push_insert(&mut builder, req);
        builder.push(format!(" RETURNING {}", T::COLUMNS));

        Ok(builder.build_query_as::<T>().fetch_one(&self.pool).await?)
    }

    /// update
    ///
    /// The merged row is checked inside the transaction; a row that breaks a record
    /// rule is rolled back.
    async fn update(&self, id: i64, req: T::Update) -> Result<Option<T>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
        T::push_update(&mut builder, req);
        builder.push("updated_at = now() WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {}", T::COLUMNS));

        let updated = builder
            .build_query_as::<T>()
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = updated else {
            return Ok(None);
        };
        row.check()?;

        tx.commit().await?;
        Ok(Some(row))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", T::TABLE))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, entries: Vec<OrderEntry>) -> Result<Vec<T>, AppError> {
        let mut tx = self.pool.begin().await?;

        let statement = format!(
            "UPDATE {} SET sort_order = $1, updated_at = now() WHERE id = $2",
            T::TABLE
        );
        for entry in &entries {
            let result = sqlx::query(&statement)
                .bind(entry.order)
                .bind(entry.id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::not_found(T::LABEL));
            }
        }

        let rows = sqlx::query_as::<_, T>(&format!(
            "SELECT {} FROM {} ORDER BY sort_order ASC, id ASC",
            T::COLUMNS,
            T::TABLE
        ))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rows)
    }
}
