//! 把控制器推送的 `ViewUpdate` 落到界面模型上，由渲染循环读取。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use controller::{LiveButton, Page, PanelView, QrImage, Tone, ViewUpdate};
use domain::area::{CHILD_PLACEHOLDER, PARENT_PLACEHOLDER};
use domain::{Choices, StreamCredentials};
use eframe::egui;

pub struct Toast {
    pub message: String,
    pub tone: Tone,
    pub shown_at: Instant,
}

pub struct ViewModel {
    pub page: Option<Page>,
    pub disclaimer: bool,
    /// 加载遮罩的引用计数
    pub loading: u32,
    pub toasts: Vec<Toast>,
    pub status: Option<(String, Tone)>,

    pub qr: Option<QrImage>,
    /// 每次换二维码加一，渲染层据此重建纹理
    pub qr_generation: u64,
    pub qr_placeholder: Option<String>,
    pub qr_status: String,
    pub countdown: u32,

    pub room_id: String,
    pub cookies: String,
    pub title: String,
    pub tags: String,
    pub parents: Choices,
    pub children: Choices,
    pub parent: Option<i64>,
    pub child: Option<i64>,

    pub live_visible: bool,
    pub live_button: LiveButton,
    pub stream: StreamCredentials,
    pub version: String,

    pub pending_clipboard: Option<String>,
    pub close: bool,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            page: None,
            disclaimer: false,
            loading: 0,
            toasts: Vec::new(),
            status: None,
            qr: None,
            qr_generation: 0,
            qr_placeholder: None,
            qr_status: String::new(),
            countdown: 0,
            room_id: String::new(),
            cookies: String::new(),
            title: String::new(),
            tags: String::new(),
            parents: Choices::empty(PARENT_PLACEHOLDER),
            children: Choices::empty(CHILD_PLACEHOLDER),
            parent: None,
            child: None,
            live_visible: false,
            live_button: LiveButton::Start,
            stream: StreamCredentials::default(),
            version: String::new(),
            pending_clipboard: None,
            close: false,
        }
    }
}

impl ViewModel {
    fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::Toast { message, tone } => {
                self.toasts.push(Toast { message, tone, shown_at: Instant::now() });
            }
            ViewUpdate::Status { message, tone } => self.status = Some((message, tone)),
            ViewUpdate::Loading(true) => self.loading += 1,
            ViewUpdate::Loading(false) => self.loading = self.loading.saturating_sub(1),
            ViewUpdate::Disclaimer(visible) => self.disclaimer = visible,
            ViewUpdate::Page(page) => self.page = Some(page),
            ViewUpdate::LiveControlVisible(visible) => self.live_visible = visible,
            ViewUpdate::Qr(image) => {
                self.qr = Some(image);
                self.qr_placeholder = None;
                self.qr_generation += 1;
            }
            ViewUpdate::QrPlaceholder(text) => {
                self.qr = None;
                self.qr_placeholder = Some(text);
                self.qr_generation += 1;
            }
            ViewUpdate::QrStatus(text) => self.qr_status = text,
            ViewUpdate::Countdown(secs) => self.countdown = secs,
            ViewUpdate::Session(creds) => {
                self.room_id = creds.room_id;
                self.cookies = creds.cookies;
            }
            ViewUpdate::LiveButton(button) => self.live_button = button,
            ViewUpdate::Stream(stream) => self.stream = stream,
            ViewUpdate::ParentAreas(choices) => self.parents = choices,
            ViewUpdate::ChildAreas(choices) => self.children = choices,
            ViewUpdate::AreaSelection { parent, child } => {
                self.parent = parent;
                self.child = child;
            }
            ViewUpdate::RoomForm { title, tags } => {
                self.title = title;
                self.tags = tags;
            }
            ViewUpdate::Version(version) => self.version = version,
            ViewUpdate::Close => self.close = true,
        }
    }
}

pub fn lock(model: &Mutex<ViewModel>) -> MutexGuard<'_, ViewModel> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct GuiView {
    model: Arc<Mutex<ViewModel>>,
    ctx: egui::Context,
}

impl GuiView {
    pub fn new(model: Arc<Mutex<ViewModel>>, ctx: egui::Context) -> Self {
        Self { model, ctx }
    }
}

impl PanelView for GuiView {
    fn apply(&self, update: ViewUpdate) {
        lock(&self.model).apply(update);
        self.ctx.request_repaint();
    }

    /// 剪贴板只能在渲染线程写入，先挂起到下一帧
    fn write_clipboard(&self, text: &str) -> anyhow::Result<()> {
        lock(&self.model).pending_clipboard = Some(text.to_string());
        self.ctx.request_repaint();
        Ok(())
    }
}
