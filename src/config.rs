use crate::error::{BadEnvVarSnafu, MantraResult, ParseBoolSnafu, ParseNumberSnafu};
use dotenvy::var;
use snafu::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use std::{
    env::VarError,
    path::{Path, PathBuf},
    sync::Arc,
};

pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

fn get_env_var_or(name: &'static str, default: &str) -> MantraResult<String> {
    match var(name) {
        Ok(x) => Ok(x),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(default.to_string()),
        Err(source) => Err(source).context(BadEnvVarSnafu { name }),
    }
}

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    server_ip: Arc<str>,
    db_config: Arc<DbConfig>,
    upload_config: Arc<UploadConfig>,
    seed_sample_data: bool,
}

impl RuntimeConfiguration {
    pub fn new() -> MantraResult<Self> {
        let seed_sample_data = get_env_var_or("MANTRA_SEED_SAMPLE_DATA", "false")?
            .parse()
            .context(ParseBoolSnafu {
                name: "MANTRA_SEED_SAMPLE_DATA",
            })?;

        Ok(Self {
            server_ip: get_env_var_or("MANTRA_SERVER_IP", "127.0.0.1:3001")?.into(),
            db_config: Arc::new(DbConfig::new()?),
            upload_config: Arc::new(UploadConfig::new()?),
            seed_sample_data,
        })
    }

    ///config rooted in one directory, for tests and throwaway instances
    #[cfg(test)]
    pub fn in_directory(dir: &Path) -> Self {
        Self {
            server_ip: "127.0.0.1:0".into(),
            db_config: Arc::new(DbConfig {
                path: dir.join("students.db"),
            }),
            upload_config: Arc::new(UploadConfig {
                directory: dir.join("uploads"),
                max_photo_bytes: MAX_PHOTO_BYTES,
                max_body_bytes: 10 * 1024 * 1024,
            }),
            seed_sample_data: false,
        }
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn upload_config(&self) -> Arc<UploadConfig> {
        self.upload_config.clone()
    }

    pub const fn seed_sample_data(&self) -> bool {
        self.seed_sample_data
    }
}

#[derive(Debug)]
pub struct DbConfig {
    path: PathBuf,
}

impl DbConfig {
    pub fn new() -> MantraResult<Self> {
        Ok(Self {
            path: get_env_var_or("MANTRA_DB_PATH", "students.db")?.into(),
        })
    }

    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
    }
}

#[derive(Debug)]
pub struct UploadConfig {
    directory: PathBuf,
    max_photo_bytes: usize,
    max_body_bytes: usize,
}

impl UploadConfig {
    pub fn new() -> MantraResult<Self> {
        let max_body_bytes = get_env_var_or("MANTRA_MAX_BODY_BYTES", "10485760")?
            .parse()
            .context(ParseNumberSnafu {
                name: "MANTRA_MAX_BODY_BYTES",
            })?;

        Ok(Self {
            directory: get_env_var_or("MANTRA_UPLOADS_DIR", "uploads")?.into(),
            max_photo_bytes: MAX_PHOTO_BYTES,
            max_body_bytes,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub const fn max_photo_bytes(&self) -> usize {
        self.max_photo_bytes
    }

    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_vars_fall_back_to_defaults() {
        assert_eq!(
            get_env_var_or("MANTRA_NEVER_SET_IN_ANY_ENVIRONMENT", "fallback").unwrap(),
            "fallback"
        );
    }

    #[test]
    fn test_config_lives_in_the_given_directory() {
        let dir = Path::new("/tmp/mantra");
        let config = RuntimeConfiguration::in_directory(dir);

        assert_eq!(config.upload_config().directory(), dir.join("uploads"));
        assert_eq!(config.upload_config().max_photo_bytes(), 2 * 1024 * 1024);
        assert!(!config.seed_sample_data());
    }
}
