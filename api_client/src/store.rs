//! 本地缓存：免责声明标记、Cookies 与直播间号。

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::ApiResult;
use domain::Credentials;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoredSession {
    #[serde(default)]
    pub disclaimer_accepted: bool,
    #[serde(default)]
    pub cookies: String,
    #[serde(default)]
    pub room_id: String,
}

impl StoredSession {
    pub fn credentials(&self) -> Credentials {
        Credentials { room_id: self.room_id.clone(), cookies: self.cookies.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "Bili", "LivePanel")
}

impl LocalStore {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|proj| proj.config_dir().join("session.json"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件不存在或已损坏时返回空会话
    pub fn load(&self) -> StoredSession {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return StoredSession::default(),
        };
        match serde_json::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                warn!("本地会话文件已损坏，将忽略: {} ({})", self.path.display(), e);
                StoredSession::default()
            }
        }
    }

    pub fn save(&self, session: &StoredSession) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, data)?;
        info!("会话已保存到 {}", self.path.display());
        Ok(())
    }

    pub fn update(&self, f: impl FnOnce(&mut StoredSession)) -> ApiResult<()> {
        let mut session = self.load();
        f(&mut session);
        self.save(&session)
    }

    pub fn save_credentials(&self, creds: &Credentials) -> ApiResult<()> {
        self.update(|s| {
            s.cookies = creds.cookies.clone();
            s.room_id = creds.room_id.clone();
        })
    }

    pub fn clear_credentials(&self) -> ApiResult<()> {
        self.update(|s| {
            s.cookies.clear();
            s.room_id.clear();
        })
    }
}
