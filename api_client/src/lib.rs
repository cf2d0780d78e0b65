//! 与直播面板后端交互的 HTTP 客户端。

use async_trait::async_trait;
use domain::{
    AppInfo, AreaParent, Credentials, Envelope, ErrorBody, QrPollResult, RoomInfo, RoomUpdate, StartLiveData,
    StartLiveRequest, StreamCredentials, WebQrInfo,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub mod config;
mod error;
pub mod store;

pub use config::{BootstrapMode, PanelConfig, Timings};
pub use error::{ApiError, ApiResult};
pub use store::{LocalStore, StoredSession};

/// 面板后端提供的全部接口
#[async_trait]
pub trait PanelApi: Send + Sync {
    async fn application_info(&self) -> ApiResult<AppInfo>;
    /// 记录已同意免责声明
    async fn accept_disclaimer(&self) -> ApiResult<()>;
    async fn reject_disclaimer(&self) -> ApiResult<()>;
    async fn exit_application(&self) -> ApiResult<()>;

    async fn check_login(&self) -> ApiResult<bool>;
    async fn credentials(&self) -> ApiResult<Credentials>;
    async fn login_qr_code(&self) -> ApiResult<WebQrInfo>;
    /// 返回 base64 编码的 PNG
    async fn qr_image(&self, link: &str) -> ApiResult<String>;
    async fn poll_qr_login(&self, qrcode_key: &str) -> ApiResult<QrPollResult>;
    async fn logout(&self) -> ApiResult<()>;

    async fn area_list(&self) -> ApiResult<Vec<AreaParent>>;
    async fn room_info(&self) -> ApiResult<RoomInfo>;
    async fn update_room(&self, update: &RoomUpdate) -> ApiResult<()>;

    async fn start_live(&self, area_id: i64) -> ApiResult<StreamCredentials>;
    async fn stop_live(&self) -> ApiResult<()>;
}

pub struct PanelClient {
    client: Client,
    base_url: String,
}

impl PanelClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("BiliLivePanel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// 非 2xx 时取 `data.error` 作为错误信息，否则解包 `{success, data}`
    async fn read_envelope<T: DeserializeOwned>(resp: Response) -> ApiResult<Envelope<T>> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<ErrorBody>>(&bytes)
                .ok()
                .and_then(|e| e.data)
                .map(|d| d.error)
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ApiError::Rejected { status: status.as_u16(), message });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn unwrap_data<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
        let envelope = Self::read_envelope::<T>(resp).await?;
        if !envelope.success {
            return Err(ApiError::Unsuccessful);
        }
        envelope.data.ok_or(ApiError::MissingData)
    }

    async fn expect_success(resp: Response) -> ApiResult<()> {
        let envelope = Self::read_envelope::<serde_json::Value>(resp).await?;
        if envelope.success {
            Ok(())
        } else {
            Err(ApiError::Unsuccessful)
        }
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        debug!("GET {}", path);
        let resp = self.client.get(self.endpoint(path)).send().await?;
        Self::unwrap_data(resp).await
    }

    async fn get_unit(&self, path: &str) -> ApiResult<()> {
        debug!("GET {}", path);
        let resp = self.client.get(self.endpoint(path)).send().await?;
        Self::expect_success(resp).await
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<Response> {
        debug!("POST {}", path);
        Ok(self.client.post(self.endpoint(path)).json(body).send().await?)
    }
}

#[async_trait]
impl PanelApi for PanelClient {
    /// 应用版本、免责声明状态与账户直播状态
    async fn application_info(&self) -> ApiResult<AppInfo> {
        self.get_data("application/info").await
    }

    async fn accept_disclaimer(&self) -> ApiResult<()> {
        // 已同意过时后端返回空响应体，只要状态码正常即可
        debug!("GET application/first_access");
        let resp = self.client.get(self.endpoint("application/first_access")).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Rejected { status: status.as_u16(), message: resp.text().await.unwrap_or_default() })
        }
    }

    async fn reject_disclaimer(&self) -> ApiResult<()> {
        self.client.get(self.endpoint("application/disagree")).send().await?;
        Ok(())
    }

    async fn exit_application(&self) -> ApiResult<()> {
        self.client.get(self.endpoint("application/exit")).send().await?;
        Ok(())
    }

    /// 检查当前登录状态
    async fn check_login(&self) -> ApiResult<bool> {
        let resp = self.client.get(self.endpoint("auth/check_login")).send().await?;
        Ok(Self::read_envelope::<serde_json::Value>(resp).await?.success)
    }

    async fn credentials(&self) -> ApiResult<Credentials> {
        self.get_data("auth/credentials").await
    }

    /// 获取登录二维码
    async fn login_qr_code(&self) -> ApiResult<WebQrInfo> {
        self.get_data("auth/getcode").await
    }

    async fn qr_image(&self, link: &str) -> ApiResult<String> {
        let url = format!("{}?link={}", self.endpoint("auth/getqr"), utf8_percent_encode(link, NON_ALPHANUMERIC));
        let resp = self.client.get(url).send().await?;
        Self::unwrap_data(resp).await
    }

    /// 轮询二维码是否扫描完成
    async fn poll_qr_login(&self, qrcode_key: &str) -> ApiResult<QrPollResult> {
        let resp = self
            .client
            .get(self.endpoint("auth/poll"))
            .query(&[("qrcode_key", qrcode_key)])
            .send()
            .await?;
        Self::unwrap_data(resp).await
    }

    async fn logout(&self) -> ApiResult<()> {
        self.get_unit("auth/logout").await
    }

    async fn area_list(&self) -> ApiResult<Vec<AreaParent>> {
        self.get_data("room/areas").await
    }

    /// 获取直播间信息
    async fn room_info(&self) -> ApiResult<RoomInfo> {
        self.get_data("room/info").await
    }

    /// 更新直播间信息：标题、标签、分区各自独立提交
    async fn update_room(&self, update: &RoomUpdate) -> ApiResult<()> {
        let resp = self.post_json("room/info", update).await?;
        Self::expect_success(resp).await
    }

    /// 开始直播，返回推流地址与密钥
    async fn start_live(&self, area_id: i64) -> ApiResult<StreamCredentials> {
        let resp = self.post_json("live/start", &StartLiveRequest { area: area_id }).await?;
        let data: StartLiveData = Self::unwrap_data(resp).await?;
        Ok(data.rtmp)
    }

    /// 停止直播
    async fn stop_live(&self) -> ApiResult<()> {
        debug!("POST live/stop");
        let resp = self.client.post(self.endpoint("live/stop")).send().await?;
        Self::expect_success(resp).await
    }
}
