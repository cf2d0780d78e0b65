//! 扫码登录：二维码生成、180 秒倒计时与 2 Hz 状态轮询。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use domain::{Credentials, QrPollResult, QrPollStatus};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::view::{Page, QrImage, Tone, ViewUpdate};
use crate::PanelController;

const QR_RETRY_HINT: &str = "二维码生成失败，请刷新重试";

impl PanelController {
    /// 获取新的二维码并重新开始轮询与倒计时
    pub async fn generate_qr_code(&self) {
        if self.qr_login_closed() {
            debug!("登录已确认，跳过二维码刷新");
            return;
        }
        self.show_status("正在生成二维码...", Tone::Info);

        let qr = match self.inner.api.login_qr_code().await {
            Ok(qr) => qr,
            Err(e) => {
                error!("生成二维码失败: {}", e);
                // 旧的 key 已随二维码一起作废
                self.inner.poll.stop();
                self.state().qr = None;
                self.emit(ViewUpdate::QrPlaceholder(QR_RETRY_HINT.to_string()));
                return;
            }
        };

        self.display_qr_code(&qr.url).await;
        if self.qr_login_closed() {
            return;
        }
        let key = qr.qrcode_key.clone();
        self.state().qr = Some(qr);
        self.start_qr_polling(key);
        self.start_countdown();
    }

    /// 扫码已确认或已在主页面时不再需要二维码
    fn qr_login_closed(&self) -> bool {
        let state = self.state();
        state.logging_in || state.page == Some(Page::Main)
    }

    async fn display_qr_code(&self, url: &str) {
        let png = match self.inner.api.qr_image(url).await {
            Ok(encoded) => match STANDARD.decode(encoded.trim()) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("二维码图片解码失败: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("获取二维码图片失败，将在本地绘制: {}", e);
                None
            }
        };
        self.emit(ViewUpdate::Qr(QrImage { url: url.to_string(), png }));
        self.emit(ViewUpdate::QrStatus("请使用B站手机客户端扫码登录".to_string()));
    }

    /// 重置倒计时；旧的倒计时会先被取消
    pub fn start_countdown(&self) {
        let total = self.timings().qr_lifetime_secs;
        self.state().countdown = total;
        self.emit(ViewUpdate::Countdown(total));

        let tick = Self::ms(self.timings().countdown_tick_ms);
        let this = self.clone();
        self.inner.countdown.start(move |tag| async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            loop {
                ticker.tick().await;
                let remaining = {
                    let mut state = this.state();
                    state.countdown = state.countdown.saturating_sub(1);
                    state.countdown
                };
                this.emit(ViewUpdate::Countdown(remaining));
                if remaining == 0 {
                    if this.inner.countdown.release(tag) {
                        info!("二维码已过期，重新生成");
                        this.spawn_qr_refresh();
                    }
                    return;
                }
            }
        });
    }

    fn spawn_qr_refresh(&self) {
        let this = self.clone();
        tokio::spawn(async move { this.generate_qr_code().await });
    }

    fn start_qr_polling(&self, qrcode_key: String) {
        let period = Self::ms(self.timings().poll_interval_ms);
        let this = self.clone();
        self.inner.poll.start(move |tag| async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match this.inner.api.poll_qr_login(&qrcode_key).await {
                    Ok(result) => {
                        if this.handle_qr_status(tag, result).await {
                            return;
                        }
                    }
                    Err(e) => error!("轮询失败: {}", e),
                }
            }
        });
    }

    /// 返回 true 表示轮询应结束
    async fn handle_qr_status(&self, tag: u64, result: QrPollResult) -> bool {
        match result.status() {
            QrPollStatus::Success => {
                self.handle_login_success(tag, result.data.unwrap_or_default()).await;
                true
            }
            QrPollStatus::AwaitingScan => {
                self.emit(ViewUpdate::QrStatus("等待扫码中...".to_string()));
                false
            }
            QrPollStatus::ScannedUnconfirmed => {
                self.emit(ViewUpdate::QrStatus("已扫码，请在手机上确认登录".to_string()));
                false
            }
            QrPollStatus::Other(code) => {
                let message = result.message.unwrap_or_default();
                warn!("扫码状态 {}: {}", code, message);
                self.emit(ViewUpdate::QrStatus(format!("状态：{}", message)));
                false
            }
        }
    }

    async fn handle_login_success(&self, tag: u64, creds: Credentials) {
        // 已被新的二维码取代时不做任何处理
        if !self.inner.poll.release(tag) {
            return;
        }
        self.inner.countdown.stop();
        info!("扫码登录成功，直播间号 {}", creds.room_id);
        self.show_status("登录成功！正在跳转...", Tone::Success);

        {
            let mut state = self.state();
            state.logging_in = true;
            state.qr = None;
            state.session = creds.clone();
        }
        if let Err(e) = self.inner.store.save_credentials(&creds) {
            warn!("保存凭据失败: {}", e);
        }

        tokio::time::sleep(Self::ms(self.timings().login_redirect_ms)).await;
        self.show_main_page();
        self.apply_session(creds);
    }
}
