//! 控制器与界面之间的适配层。界面只需要把 `ViewUpdate` 渲染出来。

use domain::{Choices, Credentials, StreamCredentials};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Main,
}

/// 开播/停播按钮的外观
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveButton {
    Start,
    Stop,
}

impl LiveButton {
    pub fn for_live(is_live: bool) -> Self {
        if is_live {
            LiveButton::Stop
        } else {
            LiveButton::Start
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LiveButton::Start => "开播",
            LiveButton::Stop => "停播",
        }
    }
}

/// 后端生成的 PNG；拿不到图片时界面可自行用 `url` 绘制二维码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    pub url: String,
    pub png: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamField {
    Addr,
    Code,
}

impl StreamField {
    pub fn label(self) -> &'static str {
        match self {
            StreamField::Addr => "推流地址",
            StreamField::Code => "推流密钥",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    Toast { message: String, tone: Tone },
    Status { message: String, tone: Tone },
    Loading(bool),
    Disclaimer(bool),
    Page(Page),
    LiveControlVisible(bool),
    Qr(QrImage),
    QrPlaceholder(String),
    QrStatus(String),
    Countdown(u32),
    Session(Credentials),
    LiveButton(LiveButton),
    Stream(StreamCredentials),
    ParentAreas(Choices),
    ChildAreas(Choices),
    AreaSelection { parent: Option<i64>, child: Option<i64> },
    RoomForm { title: String, tags: String },
    Version(String),
    Close,
}

pub trait PanelView: Send + Sync {
    fn apply(&self, update: ViewUpdate);

    fn write_clipboard(&self, text: &str) -> anyhow::Result<()>;
}

/// 访问期间显示加载遮罩，离开作用域时必定隐藏
pub(crate) struct LoadingGuard<'a> {
    view: &'a dyn PanelView,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn show(view: &'a dyn PanelView) -> Self {
        view.apply(ViewUpdate::Loading(true));
        Self { view }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.view.apply(ViewUpdate::Loading(false));
    }
}
