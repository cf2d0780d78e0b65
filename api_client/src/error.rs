use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),
    /// 后端以非 2xx 状态返回，`message` 取自 `data.error`
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("后端返回 success = false")]
    Unsuccessful,
    #[error("响应缺少 data 字段")]
    MissingData,
    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("本地文件读写失败: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// 后端给出的业务错误信息，可原样展示给用户
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
