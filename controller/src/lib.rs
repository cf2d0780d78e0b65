//! 直播面板控制器：持有全部界面状态，把界面命令转换为后端请求。
//!
//! `PanelController` 克隆开销很小，内部共享同一份状态。所有命令都是普通的
//! async 方法，由界面层的事件分发调用；界面只通过 [`PanelView`] 接收更新。

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use api_client::{BootstrapMode, LocalStore, PanelApi, PanelConfig, Timings};
use domain::{Credentials, InputError};
use tracing::{info, warn};

mod live;
mod login;
mod room;
mod state;
mod timer;
pub mod view;

pub use state::{Baseline, PanelState, RoomDraft};
pub use view::{LiveButton, Page, PanelView, QrImage, StreamField, Tone, ViewUpdate};

use timer::TimerSlot;
use view::LoadingGuard;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub mode: BootstrapMode,
    pub timings: Timings,
    pub export_dir: PathBuf,
}

impl ControllerOptions {
    pub fn from_config(config: &PanelConfig) -> Self {
        Self { mode: config.bootstrap, timings: config.timings.clone().clamped(), export_dir: config.export_dir() }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from_config(&PanelConfig::default())
    }
}

struct Inner {
    api: Arc<dyn PanelApi>,
    view: Arc<dyn PanelView>,
    store: LocalStore,
    options: ControllerOptions,
    state: Mutex<PanelState>,
    countdown: TimerSlot,
    poll: TimerSlot,
}

#[derive(Clone)]
pub struct PanelController {
    inner: Arc<Inner>,
}

impl PanelController {
    pub fn new(api: Arc<dyn PanelApi>, view: Arc<dyn PanelView>, store: LocalStore, options: ControllerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                view,
                store,
                options,
                state: Mutex::new(PanelState::default()),
                countdown: TimerSlot::new("倒计时"),
                poll: TimerSlot::new("扫码轮询"),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PanelState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> PanelState {
        self.state().clone()
    }

    fn timings(&self) -> &Timings {
        &self.inner.options.timings
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn emit(&self, update: ViewUpdate) {
        self.inner.view.apply(update);
    }

    pub fn show_toast(&self, message: impl Into<String>, tone: Tone) {
        self.emit(ViewUpdate::Toast { message: message.into(), tone });
    }

    pub fn show_status(&self, message: impl Into<String>, tone: Tone) {
        self.emit(ViewUpdate::Status { message: message.into(), tone });
    }

    /// 本地校验失败：只更新状态栏，不发请求
    fn reject_input(&self, err: InputError) -> bool {
        self.show_status(err.to_string(), Tone::Error);
        false
    }

    fn loading(&self) -> LoadingGuard<'_> {
        LoadingGuard::show(self.inner.view.as_ref())
    }

    pub fn countdown_active(&self) -> bool {
        self.inner.countdown.is_active()
    }

    pub fn polling_active(&self) -> bool {
        self.inner.poll.is_active()
    }

    /// 停止所有定时任务
    pub fn shutdown(&self) {
        self.inner.countdown.stop();
        self.inner.poll.stop();
    }

    pub fn set_room_id(&self, room_id: impl Into<String>) {
        self.state().session.room_id = room_id.into();
    }

    pub fn set_cookies(&self, cookies: impl Into<String>) {
        self.state().session.cookies = cookies.into();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state().draft.title = title.into();
    }

    pub fn set_tags_input(&self, tags: impl Into<String>) {
        self.state().draft.tags_input = tags.into();
    }

    /// 启动流程：读取应用信息、免责声明状态，同时加载分区
    pub async fn bootstrap(&self) {
        tokio::join!(self.check_first_visit(), self.load_areas());
    }

    async fn check_first_visit(&self) {
        let app_info = match self.inner.api.application_info().await {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("获取应用信息失败: {}", e);
                None
            }
        };

        if let Some(app) = &app_info {
            self.state().is_live = app.account.is_live;
            if app.account.is_live {
                self.emit(ViewUpdate::LiveButton(LiveButton::Stop));
            }
            self.state().version = app.application.version.clone();
            self.emit(ViewUpdate::Version(app.application.version.clone()));
        }

        let accepted = match self.inner.options.mode {
            BootstrapMode::Backend => app_info.as_ref().map_or(true, |i| i.disclaimer_accepted()),
            BootstrapMode::Local => self.inner.store.load().disclaimer_accepted,
        };
        if accepted {
            self.check_login_status().await;
        } else {
            self.state().disclaimer_pending = true;
            self.emit(ViewUpdate::Disclaimer(true));
        }
    }

    pub async fn accept_disclaimer(&self) {
        match self.inner.options.mode {
            BootstrapMode::Backend => {
                if let Err(e) = self.inner.api.accept_disclaimer().await {
                    warn!("记录免责声明失败: {}", e);
                }
            }
            BootstrapMode::Local => {
                if let Err(e) = self.inner.store.update(|s| s.disclaimer_accepted = true) {
                    warn!("记录免责声明失败: {}", e);
                }
            }
        }
        self.state().disclaimer_pending = false;
        self.emit(ViewUpdate::Disclaimer(false));
        self.check_login_status().await;
    }

    pub async fn reject_disclaimer(&self) {
        if self.inner.options.mode == BootstrapMode::Backend {
            // 后端收到后会直接退出，连接中断属于正常情况
            if let Err(e) = self.inner.api.reject_disclaimer().await {
                info!("后端已退出: {}", e);
            }
        }
        self.state().disclaimer_pending = false;
        self.emit(ViewUpdate::Disclaimer(false));
        self.show_toast("用户拒绝免责声明，程序即将退出", Tone::Error);
        self.shutdown();
        self.emit(ViewUpdate::Close);
    }

    /// 只查询是否已有会话，不切换页面
    pub async fn is_logged_in(&self) -> bool {
        match self.inner.options.mode {
            BootstrapMode::Backend => self.inner.api.check_login().await.unwrap_or_else(|e| {
                warn!("检查登录状态失败: {}", e);
                false
            }),
            BootstrapMode::Local => self.inner.store.load().credentials().is_complete(),
        }
    }

    /// 已登录则进入主页面并填充凭据，否则进入扫码登录
    pub async fn check_login_status(&self) -> bool {
        if !self.is_logged_in().await {
            self.show_login_page().await;
            return false;
        }

        self.show_main_page();
        let creds = match self.inner.options.mode {
            BootstrapMode::Backend => self.inner.api.credentials().await.unwrap_or_else(|e| {
                warn!("获取凭据失败: {}", e);
                Credentials::default()
            }),
            BootstrapMode::Local => self.inner.store.load().credentials(),
        };
        self.apply_session(creds);
        true
    }

    fn show_main_page(&self) {
        self.inner.countdown.stop();
        self.inner.poll.stop();
        {
            let mut state = self.state();
            state.logging_in = false;
            state.page = Some(Page::Main);
        }
        self.emit(ViewUpdate::Page(Page::Main));
        self.emit(ViewUpdate::LiveControlVisible(true));
    }

    async fn show_login_page(&self) {
        self.state().page = Some(Page::Login);
        self.emit(ViewUpdate::Page(Page::Login));
        self.generate_qr_code().await;
    }

    fn apply_session(&self, creds: Credentials) {
        self.state().session = creds.clone();
        self.emit(ViewUpdate::Session(creds));
    }

    pub async fn exit_application(&self) {
        self.show_status("正在退出应用...", Tone::Info);
        self.shutdown();
        if let Err(e) = self.inner.api.exit_application().await {
            info!("后端已退出: {}", e);
        }
        self.emit(ViewUpdate::Close);
    }

    /// 退出登录：清空会话、直播状态与本地缓存，回到扫码页
    pub async fn logout(&self) -> bool {
        if let Err(e) = self.inner.api.logout().await {
            warn!("退出登录失败: {}", e);
            self.show_status("退出登录失败！", Tone::Error);
            return false;
        }
        {
            let mut state = self.state();
            state.session = Credentials::default();
            state.is_live = false;
            state.stream = Default::default();
        }
        if let Err(e) = self.inner.store.clear_credentials() {
            warn!("清除本地凭据失败: {}", e);
        }
        self.emit(ViewUpdate::Session(Credentials::default()));
        self.emit(ViewUpdate::Stream(Default::default()));
        self.emit(ViewUpdate::LiveButton(LiveButton::Start));
        self.emit(ViewUpdate::LiveControlVisible(false));
        self.show_toast("已退出登录", Tone::Success);
        self.show_login_page().await;
        true
    }
}
