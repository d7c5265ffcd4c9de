use crate::{
    config::RuntimeConfiguration,
    error::{
        CreateUploadsDirectorySnafu, GetDatabaseConnectionSnafu, MakeQuerySnafu, MantraResult,
        MigrateSnafu, OpenDatabaseSnafu,
    },
};
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use sqlx::{Pool, Sqlite, Transaction, sqlite::SqlitePoolOptions};
use std::ops::Deref;

#[derive(Clone, Debug)]
pub struct MantraState {
    pool: Pool<Sqlite>,
    config: RuntimeConfiguration,
}

impl MantraState {
    pub async fn new(options: SqlitePoolOptions, config: RuntimeConfiguration) -> MantraResult<Self> {
        let pool = options
            .connect_with(config.db_config().connect_options())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        let uploads = config.upload_config();
        tokio::fs::create_dir_all(uploads.directory())
            .await
            .context(CreateUploadsDirectorySnafu {
                path: uploads.directory(),
            })?;

        Ok(Self { pool, config })
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    #[allow(clippy::unused_self)] //in case self is ever needed :)
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Success Mantra Institute" }
                }
                body class="bg-gray-50 min-h-screen flex flex-col items-center text-gray-900" {
                    nav class="w-full bg-blue-800 text-white px-8 py-4 flex flex-row justify-between" {
                        a href="/" class="font-bold text-lg" {"Success Mantra Institute"}
                        a href="/register" class="hover:underline" {"Register"}
                    }
                    (markup)
                }
            }
        }
    }

    pub async fn get_transaction(&self) -> MantraResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.context(GetDatabaseConnectionSnafu)
    }

    ///folds the WAL back into the main database file, then closes the pool
    pub async fn sensible_shutdown(&self) -> MantraResult<()> {
        let checkpoint = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu);

        info!("Closing database pool");
        self.pool.close().await;
        checkpoint.map(|_| ())
    }
}

impl Deref for MantraState {
    type Target = Pool<Sqlite>;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}
