#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use api_client::{ApiError, ApiResult, BootstrapMode, LocalStore, PanelApi, Timings};
use async_trait::async_trait;
use controller::{ControllerOptions, PanelController, PanelView, Tone, ViewUpdate};
use domain::{
    AccountMeta, AppInfo, ApplicationMeta, AreaChild, AreaParent, Credentials, QrPollResult, RoomArea, RoomInfo,
    RoomUpdate, StreamCredentials, WebQrInfo,
};
use tempfile::TempDir;

#[derive(Debug, Clone)]
pub enum PollStep {
    Code(i64, &'static str),
    Fail,
}

#[derive(Debug, Clone)]
pub enum LiveReply {
    Ok,
    Rejected(&'static str),
    Broken,
}

impl LiveReply {
    fn into_result<T>(self, ok: T) -> ApiResult<T> {
        match self {
            LiveReply::Ok => Ok(ok),
            LiveReply::Rejected(message) => Err(ApiError::Rejected { status: 500, message: message.to_string() }),
            LiveReply::Broken => Err(ApiError::Unsuccessful),
        }
    }
}

pub struct FakeApi {
    pub calls: Mutex<Vec<String>>,
    pub app_info: Mutex<Option<AppInfo>>,
    pub logged_in: AtomicBool,
    pub credentials: Mutex<Credentials>,
    pub qr_fails: AtomicBool,
    pub qr_codes: AtomicUsize,
    pub polled_keys: Mutex<Vec<String>>,
    pub poll_script: Mutex<VecDeque<PollStep>>,
    pub areas: Mutex<Vec<AreaParent>>,
    pub room: Mutex<Option<RoomInfo>>,
    pub updates: Mutex<Vec<RoomUpdate>>,
    pub update_fails: AtomicBool,
    pub started_with: Mutex<Vec<i64>>,
    pub start_reply: Mutex<LiveReply>,
    pub stop_reply: Mutex<LiveReply>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            app_info: Mutex::new(Some(AppInfo {
                application: ApplicationMeta { version: "v2.0.0".into(), build: "dev".into(), first_access: Some(true) },
                account: AccountMeta { is_live: false, room_id: "233".into() },
            })),
            logged_in: AtomicBool::new(false),
            credentials: Mutex::new(logged_in_credentials()),
            qr_fails: AtomicBool::new(false),
            qr_codes: AtomicUsize::new(0),
            polled_keys: Mutex::new(Vec::new()),
            poll_script: Mutex::new(VecDeque::new()),
            areas: Mutex::new(taxonomy()),
            room: Mutex::new(Some(RoomInfo {
                title: "深夜杂谈".into(),
                tags: vec!["杂谈".into(), "".into(), "聊天".into()],
                live_status: 0,
                area: RoomArea { parent_id: Some(2), id: Some(87) },
            })),
            updates: Mutex::new(Vec::new()),
            update_fails: AtomicBool::new(false),
            started_with: Mutex::new(Vec::new()),
            start_reply: Mutex::new(LiveReply::Ok),
            stop_reply: Mutex::new(LiveReply::Ok),
        }
    }
}

impl FakeApi {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    pub fn called(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn script_polls(&self, steps: impl IntoIterator<Item = PollStep>) {
        self.poll_script.lock().unwrap().extend(steps);
    }
}

#[async_trait]
impl PanelApi for FakeApi {
    async fn application_info(&self) -> ApiResult<AppInfo> {
        self.record("application_info");
        self.app_info.lock().unwrap().clone().ok_or(ApiError::Unsuccessful)
    }

    async fn accept_disclaimer(&self) -> ApiResult<()> {
        self.record("accept_disclaimer");
        Ok(())
    }

    async fn reject_disclaimer(&self) -> ApiResult<()> {
        self.record("reject_disclaimer");
        Ok(())
    }

    async fn exit_application(&self) -> ApiResult<()> {
        self.record("exit_application");
        Ok(())
    }

    async fn check_login(&self) -> ApiResult<bool> {
        self.record("check_login");
        Ok(self.logged_in.load(Ordering::SeqCst))
    }

    async fn credentials(&self) -> ApiResult<Credentials> {
        self.record("credentials");
        Ok(self.credentials.lock().unwrap().clone())
    }

    async fn login_qr_code(&self) -> ApiResult<WebQrInfo> {
        self.record("login_qr_code");
        if self.qr_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Unsuccessful);
        }
        let n = self.qr_codes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(WebQrInfo { url: format!("https://passport.example/qr?k={}", n), qrcode_key: format!("key-{}", n) })
    }

    async fn qr_image(&self, _link: &str) -> ApiResult<String> {
        // "cG5n" 是 "png" 的 base64
        Ok("cG5n".to_string())
    }

    async fn poll_qr_login(&self, qrcode_key: &str) -> ApiResult<QrPollResult> {
        self.polled_keys.lock().unwrap().push(qrcode_key.to_string());
        let step = self.poll_script.lock().unwrap().pop_front();
        match step {
            Some(PollStep::Fail) => Err(ApiError::Unsuccessful),
            Some(PollStep::Code(0, _)) => Ok(QrPollResult {
                code: 0,
                message: Some(String::new()),
                data: Some(logged_in_credentials()),
            }),
            Some(PollStep::Code(code, message)) => {
                Ok(QrPollResult { code, message: Some(message.to_string()), data: None })
            }
            None => Ok(QrPollResult { code: 86101, message: Some("未扫码".into()), data: None }),
        }
    }

    async fn logout(&self) -> ApiResult<()> {
        self.record("logout");
        Ok(())
    }

    async fn area_list(&self) -> ApiResult<Vec<AreaParent>> {
        self.record("area_list");
        Ok(self.areas.lock().unwrap().clone())
    }

    async fn room_info(&self) -> ApiResult<RoomInfo> {
        self.record("room_info");
        self.room.lock().unwrap().clone().ok_or(ApiError::Unsuccessful)
    }

    async fn update_room(&self, update: &RoomUpdate) -> ApiResult<()> {
        self.record("update_room");
        if self.update_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Unsuccessful);
        }
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }

    async fn start_live(&self, area_id: i64) -> ApiResult<StreamCredentials> {
        self.record("start_live");
        self.started_with.lock().unwrap().push(area_id);
        let reply = self.start_reply.lock().unwrap().clone();
        reply.into_result(StreamCredentials {
            addr: "rtmp://live-push.example/live-bvc/".into(),
            code: "?streamname=live_233_abc&key=k".into(),
        })
    }

    async fn stop_live(&self) -> ApiResult<()> {
        self.record("stop_live");
        let reply = self.stop_reply.lock().unwrap().clone();
        reply.into_result(())
    }
}

#[derive(Default)]
pub struct RecordingView {
    pub updates: Mutex<Vec<ViewUpdate>>,
    pub clipboard: Mutex<Vec<String>>,
    pub clipboard_fails: AtomicBool,
}

impl PanelView for RecordingView {
    fn apply(&self, update: ViewUpdate) {
        self.updates.lock().unwrap().push(update);
    }

    fn write_clipboard(&self, text: &str) -> anyhow::Result<()> {
        if self.clipboard_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("clipboard unavailable"));
        }
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

impl RecordingView {
    pub fn all(&self) -> Vec<ViewUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.updates.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&ViewUpdate) -> bool) -> usize {
        self.all().iter().filter(|u| pred(u)).count()
    }

    pub fn has(&self, update: &ViewUpdate) -> bool {
        self.all().contains(update)
    }

    pub fn statuses(&self) -> Vec<(String, Tone)> {
        self.all()
            .into_iter()
            .filter_map(|u| match u {
                ViewUpdate::Status { message, tone } => Some((message, tone)),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<(String, Tone)> {
        self.statuses().pop()
    }

    pub fn toasts(&self) -> Vec<(String, Tone)> {
        self.all()
            .into_iter()
            .filter_map(|u| match u {
                ViewUpdate::Toast { message, tone } => Some((message, tone)),
                _ => None,
            })
            .collect()
    }

    pub fn qr_statuses(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|u| match u {
                ViewUpdate::QrStatus(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// 加载遮罩显示与隐藏的次数相同，且最后处于隐藏状态
    pub fn loading_balanced(&self) -> bool {
        let shown = self.count(|u| *u == ViewUpdate::Loading(true));
        let hidden = self.count(|u| *u == ViewUpdate::Loading(false));
        let last = self.all().into_iter().rev().find_map(|u| match u {
            ViewUpdate::Loading(v) => Some(v),
            _ => None,
        });
        shown == hidden && last != Some(true)
    }
}

pub fn logged_in_credentials() -> Credentials {
    Credentials { room_id: "233".into(), cookies: "SESSDATA=abc; bili_jct=def".into() }
}

pub fn taxonomy() -> Vec<AreaParent> {
    vec![
        AreaParent {
            id: 2,
            name: "网游".into(),
            children: vec![
                AreaChild { id: 86, name: "英雄联盟".into() },
                AreaChild { id: 87, name: "守望先锋".into() },
                AreaChild { id: 88, name: "绝地求生".into() },
            ],
        },
        AreaParent { id: 6, name: "生活".into(), children: vec![AreaChild { id: 21, name: "户外".into() }] },
        AreaParent { id: 5, name: "空分区".into(), children: vec![] },
    ]
}

pub struct Harness {
    pub controller: PanelController,
    pub api: Arc<FakeApi>,
    pub view: Arc<RecordingView>,
    pub store: LocalStore,
    pub dir: TempDir,
}

pub fn harness_with(api: FakeApi, mode: BootstrapMode, timings: Timings) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(api);
    let view = Arc::new(RecordingView::default());
    let store = LocalStore::at(dir.path().join("session.json"));
    let options = ControllerOptions { mode, timings, export_dir: dir.path().join("exports") };
    let controller = PanelController::new(api.clone(), view.clone(), store.clone(), options);
    Harness { controller, api, view, store, dir }
}

pub fn harness(api: FakeApi) -> Harness {
    harness_with(api, BootstrapMode::Backend, Timings::default())
}

/// 已登录并选好分区的面板
pub async fn logged_in_harness() -> Harness {
    let h = harness(FakeApi::default());
    h.controller.load_areas().await;
    h.controller.set_room_id("233");
    h.controller.set_cookies("SESSDATA=abc; bili_jct=def");
    h
}
