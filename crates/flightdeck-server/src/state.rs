use std::{fs, path::Path, str::FromStr, sync::Arc};

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use flightdeck_core::ExclusionList;
use flightdeck_token::{Clock, SigningSecret, SystemClock, TokenCodec};

use crate::config::AppConfig;
use crate::store::{InMemorySessionStore, SessionMemoryStore, SqliteUserStore, UserStore};

/// Shared application state.
///
/// Everything here is either read-only after init (codec, exclusions,
/// config-derived values) or internally synchronized (the stores), so a
/// clone per request is cheap and no lock is held across awaits.
#[derive(Clone)]
pub struct AppState {
    pub cfg: AppConfig,
    pub codec: Arc<TokenCodec>,
    pub users: Arc<dyn UserStore>,
    pub memory: Arc<dyn SessionMemoryStore>,
    pub exclusions: Arc<ExclusionList>,
    pub clock: Arc<dyn Clock>,
    pub cookie_name: String,
}

impl AppState {
    /// Initialize production state: SQLite pool + migrations, system
    /// clock, in-process chat memory.
    pub async fn init(cfg: &AppConfig) -> anyhow::Result<Self> {
        cfg.validate()?;

        ensure_parent_dir(&cfg.server.sqlite_path)?;
        let options = SqliteConnectOptions::from_str(&sqlite_url(&cfg.server.sqlite_path))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let users: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(pool));
        let memory: Arc<dyn SessionMemoryStore> = Arc::new(InMemorySessionStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Self::with_stores(cfg.clone(), users, memory, clock)
    }

    /// Assemble state from explicit collaborators (used by init and by
    /// tests that substitute stores or the clock).
    pub fn with_stores(
        cfg: AppConfig,
        users: Arc<dyn UserStore>,
        memory: Arc<dyn SessionMemoryStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let secret = SigningSecret::from_config(&cfg.auth);
        let codec = Arc::new(TokenCodec::new(
            secret,
            &cfg.auth.algorithm,
            Arc::clone(&clock),
        )?);
        let exclusions = Arc::new(ExclusionList::new(cfg.auth.excluded_paths.clone()));
        let cookie_name = cfg.auth.cookie_name.clone();

        Ok(Self {
            cfg,
            codec,
            users,
            memory,
            exclusions,
            clock,
            cookie_name,
        })
    }

    /// The configured token lifetime.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cfg.auth.token_ttl_minutes)
    }
}

fn sqlite_url(path: &str) -> String {
    // sqlx sqlite URL format: sqlite://relative/path.db (or sqlite:/abs/path.db)
    if Path::new(path).is_absolute() {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn ensure_parent_dir(file_path: &str) -> anyhow::Result<()> {
    let p = Path::new(file_path);
    if let Some(parent) = p.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
