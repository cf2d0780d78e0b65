use domain::{AreaParent, Credentials, StreamCredentials, WebQrInfo};

use crate::view::Page;

/// 表单中可编辑的直播间信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomDraft {
    pub title: String,
    /// 用户输入的原始标签串，逗号分隔
    pub tags_input: String,
    pub parent_area: Option<i64>,
    pub child_area: Option<i64>,
}

/// 最近一次成功同步的标题与标签，仅用于展示
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    pub title: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub page: Option<Page>,
    pub disclaimer_pending: bool,
    pub version: String,
    pub is_live: bool,
    pub session: Credentials,
    pub areas: Vec<AreaParent>,
    pub draft: RoomDraft,
    pub baseline: Baseline,
    pub qr: Option<WebQrInfo>,
    /// 扫码已确认，正在等待跳转到主页面
    pub logging_in: bool,
    pub countdown: u32,
    pub stream: StreamCredentials,
}
