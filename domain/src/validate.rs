//! 本地校验，失败时不会发出任何请求。

use thiserror::Error;

pub const TITLE_MAX_CHARS: usize = 41;
pub const TAG_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("错误：直播间号不能为空！")]
    MissingRoomId,
    #[error("错误：Cookies 不能为空！")]
    MissingCookies,
    #[error("错误：{0}不能为空！")]
    EmptyContent(&'static str),
    #[error("错误：直播间标题长度不能超过 41 个字符！")]
    TitleTooLong,
    #[error("错误：标签 \"{0}\" 长度不能超过 20 个字符！")]
    TagTooLong(String),
    #[error("错误：请选择直播间分区！")]
    MissingArea,
    #[error("请先获取直播间信息后再开播！")]
    MissingLiveArea,
}

/// 直播间号、Cookies 与可选的内容字段依次检查，遇到第一个失败即返回
pub fn validate_inputs(room_id: &str, cookies: &str, content: Option<(&str, &'static str)>) -> Result<(), InputError> {
    if room_id.trim().is_empty() {
        return Err(InputError::MissingRoomId);
    }
    if cookies.trim().is_empty() {
        return Err(InputError::MissingCookies);
    }
    if let Some((value, name)) = content {
        if value.trim().is_empty() {
            return Err(InputError::EmptyContent(name));
        }
    }
    Ok(())
}

/// 返回去掉首尾空白后的标题
pub fn validate_title(raw: &str) -> Result<String, InputError> {
    let title = raw.trim();
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(InputError::TitleTooLong);
    }
    Ok(title.to_string())
}

/// 半角与全角逗号都可作分隔符；空标签丢弃，重复标签只保留第一次出现
pub fn parse_tags(raw: &str) -> Result<Vec<String>, InputError> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split([',', '，']).map(str::trim).filter(|t| !t.is_empty()) {
        if tag.chars().count() > TAG_MAX_CHARS {
            return Err(InputError::TagTooLong(tag.to_string()));
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    Ok(tags)
}
