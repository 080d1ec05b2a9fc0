use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{memory::MemoryUserRepo, repo::PgUserRepo, repo::UserRepo, store::CredentialStore};
use crate::config::AppConfig;
use crate::mail::{self, Mailer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: CredentialStore,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let repo: Arc<dyn UserRepo> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                Arc::new(PgUserRepo::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory user store");
                Arc::new(MemoryUserRepo::new())
            }
        };

        let mailer: Arc<dyn Mailer> = Arc::from(mail::from_config(&config.mail)?);

        Ok(Self::from_parts(config, repo, mailer))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        repo: Arc<dyn UserRepo>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            users: CredentialStore::new(repo),
            mailer,
        }
    }

    /// Memory-backed state with a fixed signing secret and a recording mailer.
    #[cfg(test)]
    pub fn fake(mailer: Arc<dyn Mailer>) -> Self {
        use crate::config::{JwtConfig, MailConfig};

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            jwt: JwtConfig {
                secret: Some("test-secret".into()),
                lifetime: Some(std::time::Duration::from_secs(60 * 60)),
            },
            mail: MailConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                from: "no-reply@localhost".into(),
            },
        });
        Self::from_parts(config, Arc::new(MemoryUserRepo::new()), mailer)
    }
}
