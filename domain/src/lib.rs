use serde::{Deserialize, Serialize};

pub mod area;
pub mod export;
pub mod validate;
mod serde_ext;

pub use area::{child_choices, parent_choices, AreaOption, Choices};
pub use export::{report_contents, report_file_name};
pub use validate::{parse_tags, validate_inputs, validate_title, InputError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginState {
    LoggedIn,
    NeedQrCode,
}

impl From<bool> for LoginState {
    fn from(logged_in: bool) -> Self {
        if logged_in {
            LoginState::LoggedIn
        } else {
            LoginState::NeedQrCode
        }
    }
}

/// 后端 `{success, data}` 包装
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
}

/// 后端错误响应里的 `data.error`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ApplicationMeta {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub build: String,
    /// 为 true 表示已经同意过免责声明；缺省视为已同意
    #[serde(default)]
    pub first_access: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AccountMeta {
    #[serde(default)]
    pub is_live: bool,
    #[serde(default, deserialize_with = "serde_ext::string_or_number")]
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppInfo {
    #[serde(default)]
    pub application: ApplicationMeta,
    #[serde(default)]
    pub account: AccountMeta,
}

impl AppInfo {
    pub fn disclaimer_accepted(&self) -> bool {
        self.application.first_access.unwrap_or(true)
    }
}

/// 登录凭据：直播间号与 Cookie 串
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default, deserialize_with = "serde_ext::string_or_number")]
    pub room_id: String,
    #[serde(default)]
    pub cookies: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.room_id.trim().is_empty() && !self.cookies.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WebQrInfo {
    pub url: String,
    pub qrcode_key: String,
}

/// 扫码轮询状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrPollStatus {
    Success,
    AwaitingScan,
    ScannedUnconfirmed,
    Other(i64),
}

impl QrPollStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => QrPollStatus::Success,
            86101 => QrPollStatus::AwaitingScan,
            86090 => QrPollStatus::ScannedUnconfirmed,
            other => QrPollStatus::Other(other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct QrPollResult {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Credentials>,
}

impl QrPollResult {
    pub fn status(&self) -> QrPollStatus {
        QrPollStatus::from_code(self.code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AreaChild {
    #[serde(deserialize_with = "serde_ext::i64_or_string")]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AreaParent {
    #[serde(deserialize_with = "serde_ext::i64_or_string")]
    pub id: i64,
    pub name: String,
    #[serde(rename = "list", default)]
    pub children: Vec<AreaChild>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RoomArea {
    #[serde(default, deserialize_with = "serde_ext::opt_i64_or_string")]
    pub parent_id: Option<i64>,
    #[serde(default, deserialize_with = "serde_ext::opt_i64_or_string")]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RoomInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub live_status: i32,
    #[serde(default)]
    pub area: RoomArea,
}

impl RoomInfo {
    /// 去掉空标签后的列表
    pub fn clean_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AreaUpdate {
    pub area: i64,
    pub sub_area: i64,
}

/// `POST room/info` 的局部更新体，只序列化有值的字段
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RoomUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<AreaUpdate>,
}

impl RoomUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Default::default() }
    }

    pub fn tags(tags: Vec<String>) -> Self {
        Self { tags: Some(tags), ..Default::default() }
    }

    pub fn area(parent_id: i64, child_id: i64) -> Self {
        Self {
            area: Some(AreaUpdate { area: parent_id, sub_area: child_id }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartLiveRequest {
    pub area: i64,
}

/// 推流地址与推流密钥
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StreamCredentials {
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub code: String,
}

impl StreamCredentials {
    pub fn is_complete(&self) -> bool {
        !self.addr.is_empty() && !self.code.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StartLiveData {
    #[serde(default)]
    pub rtmp: StreamCredentials,
}
