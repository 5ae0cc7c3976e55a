use chrono::Utc;
use uuid::Uuid;

use crate::auth::CredentialService;
use crate::config::AppConfig;
use crate::models::Account;
use crate::repository::{RepoError, Repository};

/// ensure_seed_admin
///
/// First-run provisioning of the bootstrap administrator. Idempotent: if an
/// account already holds the reserved email, nothing happens. The created
/// account is the single seed admin that the lifecycle guard protects from
/// demotion and deletion.
pub async fn ensure_seed_admin(
    repo: &dyn Repository,
    credentials: &dyn CredentialService,
    config: &AppConfig,
) -> Result<(), String> {
    if repo
        .find_account_by_email(&config.seed_admin_email)
        .await
        .is_some()
    {
        tracing::debug!("seed admin already present");
        return Ok(());
    }

    let password_hash = credentials.hash(&config.seed_admin_password)?;

    let account = Account {
        id: Uuid::new_v4(),
        name: "Administrator".to_string(),
        email: config.seed_admin_email.to_lowercase(),
        password_hash,
        role: "admin".to_string(),
        is_active: true,
        created_at: Utc::now(),
    };

    match repo.create_account(account).await {
        Ok(_) => {
            tracing::info!("seed admin account created");
            tracing::warn!("change the seed admin password after the first login");
            Ok(())
        }
        // Another instance won the creation race; the account exists, which is
        // all this function guarantees.
        Err(RepoError::Conflict) => Ok(()),
        Err(RepoError::Database(reason)) => Err(reason),
    }
}
