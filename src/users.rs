use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Telegram usernames: 5 to 32 characters in practice, we only refuse what can't be one.
const CHAT_HANDLE_PATTERN: &str = r"^[A-Za-z0-9_]{1,32}$";

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("invalid Telegram username `{0}` (letters, digits and underscores, 32 characters max)")]
    InvalidHandle(String),
    #[error("no Telegram username is linked to {0}")]
    NotFound(String),
    #[error("couldn't access users file {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lowercased GitHub login → Telegram username.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Identities(BTreeMap<String, String>);

impl Identities {
    pub fn chat_handle(&self, login: &str) -> Option<&str> {
        self.0.get(&login.to_lowercase()).map(String::as_str)
    }

    /// Name to display for a GitHub login: the linked Telegram mention, or the login itself.
    pub fn display_name(&self, login: &str) -> String {
        match self.chat_handle(login) {
            Some(handle) => format!("@{}", handle),
            None => login.to_owned(),
        }
    }
}

impl<L: AsRef<str>, H: Into<String>> FromIterator<(L, H)> for Identities {
    fn from_iter<I: IntoIterator<Item = (L, H)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(login, handle)| (login.as_ref().to_lowercase(), handle.into()))
                .collect(),
        )
    }
}

/// Links GitHub logins to Telegram usernames. The whole mapping lives in a flat YAML file which
/// is read (and written back, for mutations) on every operation.
pub struct UserStore {
    path: PathBuf,
    handle_regex: Regex,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle_regex: Regex::new(CHAT_HANDLE_PATTERN).expect("pattern is valid"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the mapping. A missing file is created empty, and an unreadable one is treated as
    /// empty.
    pub fn load(&self) -> Identities {
        if !self.path.is_file() {
            debug!("users file {} not found, creating it", self.path.display());
            if let Err(e) = self.save(&Identities::default()) {
                warn!("{}", e);
            }
            return Identities::default();
        }

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                warn!("couldn't open users file {}: {}", self.path.display(), e);
                return Identities::default();
            }
        };

        // an empty file is a valid, empty, YAML document
        match serde_yaml::from_reader::<_, Option<BTreeMap<String, String>>>(BufReader::new(file)) {
            Ok(mapping) => Identities(mapping.unwrap_or_default()),
            Err(e) => {
                warn!(
                    "couldn't parse users file {}, using an empty mapping: {}",
                    self.path.display(),
                    e
                );
                Identities::default()
            }
        }
    }

    /// Replaces the users file atomically: the mapping is written next to it, synced, then
    /// renamed over it.
    fn save(&self, identities: &Identities) -> Result<(), UserStoreError> {
        let storage_error = |source| UserStoreError::Storage {
            path: self.path.clone(),
            source,
        };

        let content = serde_yaml::to_string(&identities.0)
            .map_err(|e| storage_error(io::Error::new(io::ErrorKind::Other, e.to_string())))?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        {
            let mut file = File::create(&tmp_path).map_err(storage_error)?;
            file.write_all(content.as_bytes()).map_err(storage_error)?;
            file.sync_all().map_err(storage_error)?;
        }
        fs::rename(&tmp_path, &self.path).map_err(storage_error)?;

        trace!("saved {} identities", identities.0.len());
        Ok(())
    }

    pub fn resolve(&self, login: &str) -> String {
        self.load().display_name(login)
    }

    pub fn link(&self, login: &str, chat_handle: &str) -> Result<(), UserStoreError> {
        if !self.handle_regex.is_match(chat_handle) {
            return Err(UserStoreError::InvalidHandle(chat_handle.to_owned()));
        }

        let mut identities = self.load();
        identities
            .0
            .insert(login.to_lowercase(), chat_handle.to_owned());
        self.save(&identities)?;

        debug!("linked {} to @{}", login, chat_handle);
        Ok(())
    }

    pub fn unlink(&self, login: &str) -> Result<(), UserStoreError> {
        let mut identities = self.load();
        if identities.0.remove(&login.to_lowercase()).is_none() {
            return Err(UserStoreError::NotFound(login.to_owned()));
        }
        self.save(&identities)?;

        debug!("unlinked {}", login);
        Ok(())
    }
}
