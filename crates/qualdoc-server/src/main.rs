//! QUALDOC Server — application entry point.
//!
//! Initializes storage: connects to SurrealDB, runs migrations, seeds
//! the canonical permission catalog, and creates the bootstrap
//! administrator if `QUALDOC_ADMIN_EMAIL` / `QUALDOC_ADMIN_PASSWORD`
//! are set. The HTTP layer mounts on top of the engine crates.

use qualdoc_access::{AuthConfig, AuthService};
use qualdoc_core::error::QualdocError;
use qualdoc_core::models::permission::codes;
use qualdoc_core::models::user::CreateUser;
use qualdoc_core::repository::{PermissionRepository, UserRepository};
use qualdoc_db::repository::{
    SurrealPermissionRepository, SurrealSessionRepository, SurrealUserRepository,
};
use qualdoc_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("qualdoc=info".parse()?),
        )
        .json()
        .init();

    tracing::info!("Starting QUALDOC server...");

    let config = DbConfig::from_env();
    let manager = DbManager::connect(&config).await?;
    let db = manager.client().clone();

    qualdoc_db::run_migrations(&db).await?;

    // Seed the canonical permission catalog. Conflicts mean an earlier
    // bootstrap (or a concurrent one) already seeded the entry.
    let permission_repo = SurrealPermissionRepository::new(db.clone());
    for (code, description) in codes::ALL {
        match permission_repo
            .create(qualdoc_core::models::permission::CreatePermission {
                code: (*code).into(),
                description: (*description).into(),
            })
            .await
        {
            Ok(_) => tracing::info!(code = %code, "Seeded permission"),
            Err(QualdocError::Conflict { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    // Bootstrap administrator, if configured and absent.
    if let (Ok(email), Ok(password)) = (
        std::env::var("QUALDOC_ADMIN_EMAIL"),
        std::env::var("QUALDOC_ADMIN_PASSWORD"),
    ) {
        let user_repo = SurrealUserRepository::new(db.clone());
        let session_repo = SurrealSessionRepository::new(db.clone());
        let auth = AuthService::new(user_repo.clone(), session_repo, AuthConfig::default());

        match user_repo.get_by_email(&email).await {
            Ok(_) => tracing::info!(email = %email, "Bootstrap administrator already exists"),
            Err(QualdocError::NotFound { .. }) => {
                auth.validate_password_policy(&password)?;
                let admin = user_repo
                    .create(CreateUser {
                        email: email.clone(),
                        full_name: "Administrator".into(),
                        password,
                        is_superuser: true,
                        approval_level: 5,
                        individual_permissions: Vec::new(),
                        metadata: None,
                    })
                    .await?;
                tracing::info!(email = %email, id = %admin.id, "Created bootstrap administrator");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!("Storage bootstrap complete.");

    Ok(())
}
