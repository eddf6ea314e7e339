//! Application Startup
//!
//! Builds the collaborators once at process start, wires them into
//! `AppState` and serves the router until a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::application::services::{
    AuthService, CommentService, ConversationService, EngagementService, EventService,
    FriendService, NotificationService, PostService, ReportService, SearchService, UploadService,
    UserService,
};
use crate::config::{RateLimitBackend, Settings};
use crate::domain::ports::{DependencyProbe, ObjectStore, RateLimitStore};
use crate::domain::{
    CommentRepository, ConversationRepository, EngagementRepository, EventRepository,
    NotificationRepository, PostRepository, RelationshipRepository, ReportRepository,
    SessionRepository, UserRepository,
};
use crate::infrastructure::cache::{self, MemoryRateLimitStore, RedisProbe, RedisRateLimitStore};
use crate::infrastructure::database::{self, PgProbe};
use crate::infrastructure::repositories::{
    PgCommentRepository, PgConversationRepository, PgEngagementRepository, PgEventRepository,
    PgNotificationRepository, PgPostRepository, PgRelationshipRepository, PgReportRepository,
    PgSessionRepository, PgUserRepository,
};
use crate::infrastructure::storage::LocalObjectStore;
use crate::presentation::http::routes;
use crate::presentation::middleware::RateLimiter;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;
use crate::shared::snowflake::SnowflakeGenerator;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);
const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub engagement: Arc<dyn EngagementRepository>,
    pub relationships: Arc<dyn RelationshipRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub events: Arc<dyn EventRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub rate_limit_store: Arc<dyn RateLimitStore>,
    pub object_store: Arc<dyn ObjectStore>,
    pub probes: Vec<Arc<dyn DependencyProbe>>,
    pub settings: Arc<Settings>,
    pub snowflake: Arc<SnowflakeGenerator>,
}

impl AppState {
    /// Page request from `?cursor=&limit=`, clamped to the configured limits.
    pub fn page(&self, cursor: Option<&str>, limit: Option<i64>) -> Result<PageRequest, AppError> {
        PageRequest::parse(cursor, limit, self.settings.pagination.limits())
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.rate_limit_store.clone(), self.settings.rate_limit.fail_open)
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.users.clone(),
            self.sessions.clone(),
            self.snowflake.clone(),
            self.settings.session.clone(),
        )
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(
            self.users.clone(),
            self.relationships.clone(),
            self.posts.clone(),
            self.snowflake.clone(),
        )
    }

    pub fn friend_service(&self) -> FriendService {
        FriendService::new(self.users.clone(), self.relationships.clone(), self.snowflake.clone())
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(self.posts.clone(), self.relationships.clone(), self.snowflake.clone())
    }

    pub fn comment_service(&self) -> CommentService {
        CommentService::new(
            self.posts.clone(),
            self.comments.clone(),
            self.relationships.clone(),
            self.snowflake.clone(),
        )
    }

    pub fn engagement_service(&self) -> EngagementService {
        EngagementService::new(
            self.posts.clone(),
            self.engagement.clone(),
            self.relationships.clone(),
            self.snowflake.clone(),
        )
    }

    pub fn conversation_service(&self) -> ConversationService {
        ConversationService::new(
            self.users.clone(),
            self.relationships.clone(),
            self.conversations.clone(),
            self.snowflake.clone(),
        )
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(self.notifications.clone())
    }

    pub fn event_service(&self) -> EventService {
        EventService::new(self.events.clone(), self.snowflake.clone())
    }

    pub fn report_service(&self) -> ReportService {
        ReportService::new(
            self.users.clone(),
            self.posts.clone(),
            self.comments.clone(),
            self.reports.clone(),
            self.snowflake.clone(),
        )
    }

    pub fn search_service(&self) -> SearchService {
        SearchService::new(self.users.clone(), self.posts.clone(), self.relationships.clone())
    }

    pub fn upload_service(&self) -> UploadService {
        UploadService::new(self.object_store.clone(), self.snowflake.clone())
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    state: AppState,
    memory_rate_limits: Option<Arc<MemoryRateLimitStore>>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
            tracing::info!("Database migrations applied");
        }

        let mut probes: Vec<Arc<dyn DependencyProbe>> = vec![Arc::new(PgProbe::new(db.clone()))];

        let mut memory_rate_limits = None;
        let rate_limit_store: Arc<dyn RateLimitStore> = match settings.rate_limit.backend {
            RateLimitBackend::Redis => {
                let redis = cache::create_redis_client(&settings.redis).await?;
                probes.push(Arc::new(RedisProbe::new(redis.clone())));
                Arc::new(RedisRateLimitStore::new(redis))
            }
            RateLimitBackend::Memory => {
                tracing::warn!("Using in-process rate limit counters; limits are per instance");
                let store = Arc::new(MemoryRateLimitStore::new());
                memory_rate_limits = Some(store.clone());
                store
            }
        };

        let object_store = Arc::new(LocalObjectStore::from_settings(&settings.storage));
        tokio::fs::create_dir_all(&settings.storage.root_dir).await?;

        let snowflake = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id,
            settings.snowflake.epoch,
        ));

        let addr = settings.server.socket_addr()?;

        let state = AppState {
            users: Arc::new(PgUserRepository::new(db.clone())),
            sessions: Arc::new(PgSessionRepository::new(db.clone())),
            posts: Arc::new(PgPostRepository::new(db.clone())),
            comments: Arc::new(PgCommentRepository::new(db.clone())),
            engagement: Arc::new(PgEngagementRepository::new(db.clone())),
            relationships: Arc::new(PgRelationshipRepository::new(db.clone())),
            conversations: Arc::new(PgConversationRepository::new(db.clone())),
            notifications: Arc::new(PgNotificationRepository::new(db.clone())),
            events: Arc::new(PgEventRepository::new(db.clone())),
            reports: Arc::new(PgReportRepository::new(db)),
            rate_limit_store,
            object_store,
            probes,
            settings: Arc::new(settings),
            snowflake,
        };

        let router = routes::create_router(state.clone());

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self {
            listener,
            router,
            state,
            memory_rate_limits,
        })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let maintenance = tokio::spawn(run_maintenance(
            self.state.clone(),
            self.memory_rate_limits.clone(),
            stop_rx,
        ));

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        let _ = stop_tx.send(true);
        if let Err(e) = maintenance.await {
            tracing::warn!(error = %e, "Maintenance task ended abnormally");
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Expired-session cleanup and, for the memory backend, window purging.
async fn run_maintenance(
    state: AppState,
    memory_rate_limits: Option<Arc<MemoryRateLimitStore>>,
    mut stop: watch::Receiver<bool>,
) {
    let mut sessions_tick = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
    let mut purge_tick = tokio::time::interval(RATE_LIMIT_PURGE_INTERVAL);

    loop {
        tokio::select! {
            _ = sessions_tick.tick() => {
                match state.auth_service().cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Expired sessions removed"),
                    Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
                }
            }
            _ = purge_tick.tick() => {
                if let Some(store) = &memory_rate_limits {
                    store.purge_expired();
                }
            }
            _ = stop.changed() => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
