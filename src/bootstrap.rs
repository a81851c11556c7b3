//! Startup tasks that run before the server accepts requests.

use crate::{
    config::SeedAdmin,
    error::AppError,
    handlers::users::new_account,
    models::{Role, User},
    repository::{RepositoryState, normalize_email},
};

/// seed_admin
///
/// Creates the configured administrator when the site has none, so a fresh install can
/// be managed at all. Does nothing once any admin exists, and never touches an existing
/// account with the same email.
pub async fn seed_admin(repo: &RepositoryState, seed: &SeedAdmin) -> Result<Option<User>, AppError> {
    if repo.count_admins().await? > 0 {
        tracing::debug!("admin account present; skipping seed");
        return Ok(None);
    }

    let email = normalize_email(&seed.email);
    if repo.find_user_by_email(&email).await?.is_some() {
        tracing::warn!(email = %email, "seed admin email belongs to an existing non-admin account");
        return Ok(None);
    }

    let account = new_account(&seed.name, &email, &seed.password, Role::Admin)?;
    let user = repo.create_user(account).await?;
    tracing::info!(user_id = %user.id, email = %user.email, "seeded initial admin account");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use std::sync::Arc;

    fn seed() -> SeedAdmin {
        SeedAdmin {
            name: "관리자".to_string(),
            email: "Admin@Church.local".to_string(),
            password: "changeme123".to_string(),
        }
    }

    #[tokio::test]
    async fn seeds_once() {
        let repo: RepositoryState = Arc::new(InMemoryRepository::new());

        let first = seed_admin(&repo, &seed()).await.unwrap();
        assert_eq!(first.unwrap().email, "admin@church.local");

        let second = seed_admin(&repo, &seed()).await.unwrap();
        assert!(second.is_none());
        assert_eq!(repo.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_short_seed_password() {
        let repo: RepositoryState = Arc::new(InMemoryRepository::new());
        let mut weak = seed();
        weak.password = "short".to_string();

        let err = seed_admin(&repo, &weak).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
