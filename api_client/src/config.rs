//! 面板配置，保存在平台配置目录下的 `config.json`。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::project_dirs;
use crate::ApiResult;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// 启动时从哪里读取免责声明与登录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BootstrapMode {
    #[default]
    Backend,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub qr_lifetime_secs: u32,
    pub countdown_tick_ms: u64,
    pub poll_interval_ms: u64,
    pub login_redirect_ms: u64,
    pub toast_ms: u64,
}

impl Timings {
    /// 周期与有效期至少为 1，零值会让定时器无法启动
    pub fn clamped(self) -> Self {
        Self {
            qr_lifetime_secs: self.qr_lifetime_secs.max(1),
            countdown_tick_ms: self.countdown_tick_ms.max(1),
            poll_interval_ms: self.poll_interval_ms.max(1),
            login_redirect_ms: self.login_redirect_ms,
            toast_ms: self.toast_ms,
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            qr_lifetime_secs: 180,
            countdown_tick_ms: 1000,
            poll_interval_ms: 500,
            login_redirect_ms: 1500,
            toast_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub base_url: String,
    pub bootstrap: BootstrapMode,
    /// 推流凭据导出目录，缺省为当前目录
    pub export_dir: Option<PathBuf>,
    /// GUI 使用的中文字体
    pub font_path: Option<PathBuf>,
    pub timings: Timings,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bootstrap: BootstrapMode::default(),
            export_dir: None,
            font_path: None,
            timings: Timings::default(),
        }
    }
}

impl PanelConfig {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|proj| proj.config_dir().join("config.json"))
    }

    /// 读取默认位置的配置，文件不存在时使用默认值
    pub fn load() -> ApiResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> ApiResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.timings = config.timings.clamped();
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> ApiResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
