// On-disk credential persistence: one small file per database.

use std::path::{Path, PathBuf};

use crate::{StdbError, StdbResult};

const DEFAULT_DIR_NAME: &str = ".spacetimedb_client_credentials";

/// The identity and token of one database, as persisted on disk.
///
/// The file `{dir}/{database}.creds` holds two UTF-8 lines:
/// the identity, then the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity: String,
    pub token: String,
}

impl Credentials {
    pub fn new<I: Into<String>, T: Into<String>>(identity: I, token: T) -> Self {
        Self {
            identity: identity.into(),
            token: token.into(),
        }
    }

    /// The default credential directory: `$HOME/.spacetimedb_client_credentials`,
    /// or the directory name itself when `HOME` is unset.
    pub fn default_dir() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(DEFAULT_DIR_NAME),
            None => PathBuf::from(DEFAULT_DIR_NAME),
        }
    }

    fn file_path(dir: &Path, database: &str) -> PathBuf {
        dir.join(format!("{database}.creds"))
    }

    /// Loads the credentials of `database`, if a file exists.
    pub fn load(dir: &Path, database: &str) -> StdbResult<Option<Self>> {
        let path = Self::file_path(dir, database);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let (identity, token) = content.split_once('\n').ok_or_else(|| {
            StdbError::InvalidResponse(format!("malformed credential file {}", path.display()))
        })?;
        Ok(Some(Self {
            identity: identity.to_string(),
            token: token.trim_end_matches('\n').to_string(),
        }))
    }

    /// Saves the credentials for `database`, creating `dir` if needed.
    pub fn save(&self, dir: &Path, database: &str) -> StdbResult<()> {
        std::fs::create_dir_all(dir)?;
        let path = Self::file_path(dir, database);
        std::fs::write(&path, format!("{}\n{}", self.identity, self.token))?;
        debug!("saved credentials to {}", path.display());
        Ok(())
    }
}
