//! The single owner of the persisted auth tokens. Every component that cares
//! whether the user is signed in goes through here rather than touching the
//! token file itself.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::models::Tokens;

pub struct Session {
    path: PathBuf,
    tokens: Option<Tokens>,
}

impl Session {
    /// Read the stored tokens, if any, from the platform data directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    /// Same, from an explicit path. A missing file is an anonymous session,
    /// not an error.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let tokens = match fs::read_to_string(&path) {
            Ok(raw) => Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("Corrupt session file: {}", path.display()))?,
            ),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read session file: {}", path.display()))
            }
        };
        Ok(Self { path, tokens })
    }

    fn default_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "rtjobs") {
            Ok(proj_dirs.data_dir().join("session.json"))
        } else {
            Ok(PathBuf::from("rtjobs-session.json"))
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    pub fn tokens(&self) -> Option<&Tokens> {
        self.tokens.as_ref()
    }

    /// Persist a fresh token pair (login).
    pub fn save(&mut self, tokens: Tokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&tokens)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;
        self.tokens = Some(tokens);
        Ok(())
    }

    /// Drop the stored tokens (logout). Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to remove session file: {}", self.path.display())
                })
            }
        }
        self.tokens = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "rtjobs-session-test-{}-{}.json",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn test_missing_file_is_anonymous() {
        let session = Session::load_from(temp_session_path("missing")).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.tokens().is_none());
    }

    #[test]
    fn test_save_load_clear_round_trip() {
        let path = temp_session_path("roundtrip");
        let mut session = Session::load_from(path.clone()).unwrap();
        session
            .save(Tokens {
                access: "a-token".to_string(),
                refresh: "r-token".to_string(),
            })
            .unwrap();
        assert!(session.is_authenticated());

        let reloaded = Session::load_from(path.clone()).unwrap();
        assert_eq!(reloaded.tokens().unwrap().access, "a-token");
        assert_eq!(reloaded.tokens().unwrap().refresh, "r-token");

        let mut session = reloaded;
        session.clear().unwrap();
        assert!(!session.is_authenticated());
        assert!(!path.exists());

        // Clearing again is fine.
        session.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_session_path("corrupt");
        fs::write(&path, "not json").unwrap();
        let result = Session::load_from(path.clone());
        assert!(result.is_err());
        fs::remove_file(path).unwrap();
    }
}
