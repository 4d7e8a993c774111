use std::sync::Arc;
use std::time::Duration;

use auth_core::parse_ttl;
use auth_core::PasswordHasher;
use auth_core::TokenCodec;
use auth_service::auth::models::AuthUser;
use auth_service::auth::models::EmailAddress;
use auth_service::auth::models::Role;
use auth_service::auth::models::UserId;
use auth_service::auth::ports::AuthRepository;
use auth_service::auth::ports::AuthServicePort;
use auth_service::auth::service::AuthService;
use auth_service::config::Config;
use auth_service::config::SeedConfig;
use auth_service::inbound::http::router::create_router;
use auth_service::inbound::http::router::AppState;
use auth_service::repositories::InMemoryAuthRepository;
use auth_service::repositories::PostgresAuthRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    // Configuration errors are fatal here, before any listener exists.
    let config = Config::load()?;

    // One parsed value per class feeds both the signed expiry and the
    // persisted record expiry; they can never diverge.
    let access_ttl = parse_ttl(config.tokens.access_ttl.as_deref(), DEFAULT_ACCESS_TTL);
    let refresh_ttl = parse_ttl(config.tokens.refresh_ttl.as_deref(), DEFAULT_REFRESH_TTL);

    tracing::info!(
        http_port = config.server.http_port,
        store = if config.database.is_some() { "postgres" } else { "memory" },
        access_ttl_secs = access_ttl.as_secs(),
        refresh_ttl_secs = refresh_ttl.as_secs(),
        "Configuration loaded"
    );

    let auth_service: Arc<dyn AuthServicePort> = match &config.database {
        Some(database) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database.url)
                .await?;
            tracing::info!(max_connections = 5, "Database connection pool created");

            let repository = Arc::new(PostgresAuthRepository::new(pool, database.schema.clone()));
            repository.migrate().await?;
            tracing::info!(schema = %database.schema, "Credential store ready");

            if let Some(seed) = &config.seed {
                seed_account(repository.as_ref(), seed).await?;
            }

            Arc::new(AuthService::new(
                repository,
                config.tokens.access_secret.as_bytes(),
                config.tokens.refresh_secret.as_bytes(),
                access_ttl,
                refresh_ttl,
            ))
        }
        None => {
            let repository = Arc::new(InMemoryAuthRepository::new());

            if let Some(seed) = &config.seed {
                seed_account(repository.as_ref(), seed).await?;
            }

            Arc::new(AuthService::new(
                repository,
                config.tokens.access_secret.as_bytes(),
                config.tokens.refresh_secret.as_bytes(),
                access_ttl,
                refresh_ttl,
            ))
        }
    };

    let state = AppState {
        auth_service,
        access_codec: Arc::new(TokenCodec::new(config.tokens.access_secret.as_bytes())),
        secure_cookies: config.is_production(),
    };

    let address = format!("0.0.0.0:{}", config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Http server listening");

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}

/// Pre-populate one account from configuration. A bootstrap convenience:
/// an already-registered seed email is left untouched.
async fn seed_account<R: AuthRepository>(
    repository: &R,
    seed: &SeedConfig,
) -> Result<(), anyhow::Error> {
    let email = EmailAddress::new(seed.email.clone())?;

    if repository.find_by_email(email.as_str()).await?.is_some() {
        tracing::info!("Seed account already present");
        return Ok(());
    }

    let roles: Vec<Role> = seed
        .roles
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|name| name.trim().parse::<Role>().ok())
        .collect();
    let roles = if roles.is_empty() {
        vec![Role::Admin]
    } else {
        roles
    };

    let password_hash = PasswordHasher::new().hash(&seed.password)?;

    let user = AuthUser {
        id: UserId::new(),
        email,
        password_hash,
        roles,
    };
    let user_id = user.id;

    repository.save_user(user).await?;
    tracing::info!(user_id = %user_id, "Seed account created");

    Ok(())
}
