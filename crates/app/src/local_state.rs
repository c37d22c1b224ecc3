use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sessions remembered between runs, one per backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalState {
    pub sessions: Vec<SessionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntry {
    pub base_url: String,
    pub email: String,
    pub token: String,
}

impl LocalState {
    pub fn load(path: &str) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let parent = Path::new(path).parent();
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)?;
        Ok(())
    }

    pub fn session_for(&self, base_url: &str) -> Option<&SessionEntry> {
        self.sessions
            .iter()
            .find(|entry| entry.base_url == base_url)
    }

    pub fn set_session(&mut self, base_url: &str, email: &str, token: &str) {
        if let Some(entry) = self
            .sessions
            .iter_mut()
            .find(|entry| entry.base_url == base_url)
        {
            entry.email = email.to_string();
            entry.token = token.to_string();
            return;
        }

        self.sessions.push(SessionEntry {
            base_url: base_url.to_string(),
            email: email.to_string(),
            token: token.to_string(),
        });
    }

    /// Forgets the session of `base_url`, returning whether there was one.
    pub fn clear_session(&mut self, base_url: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|entry| entry.base_url != base_url);
        self.sessions.len() != before
    }
}
