//! 开播/停播、推流凭据导出与复制。

use std::fs;
use std::path::PathBuf;

use api_client::ApiError;
use chrono::{Local, Utc};
use domain::{report_contents, report_file_name, validate_inputs, InputError, StreamCredentials};
use tracing::{error, info};

use crate::view::{LiveButton, StreamField, Tone, ViewUpdate};
use crate::PanelController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiveAction {
    Start,
    Stop,
}

impl LiveAction {
    fn verb(self) -> &'static str {
        match self {
            LiveAction::Start => "开播",
            LiveAction::Stop => "停播",
        }
    }
}

impl PanelController {
    /// 根据当前直播状态开播或停播
    pub async fn toggle_live(&self) -> bool {
        let is_live = self.state().is_live;
        if is_live {
            self.stop_live().await
        } else {
            self.start_live().await
        }
    }

    pub async fn start_live(&self) -> bool {
        let (room_id, cookies, area) = {
            let state = self.state();
            (state.session.room_id.clone(), state.session.cookies.clone(), state.draft.child_area)
        };
        if let Err(e) = validate_inputs(&room_id, &cookies, None) {
            return self.reject_input(e);
        }

        let _loading = self.loading();
        let Some(area) = area else {
            return self.reject_input(InputError::MissingLiveArea);
        };
        match self.inner.api.start_live(area).await {
            Ok(stream) => {
                self.handle_live_start(stream);
                true
            }
            Err(e) => {
                self.report_live_failure(LiveAction::Start, &e);
                false
            }
        }
    }

    pub async fn stop_live(&self) -> bool {
        let (room_id, cookies) = {
            let state = self.state();
            (state.session.room_id.clone(), state.session.cookies.clone())
        };
        if let Err(e) = validate_inputs(&room_id, &cookies, None) {
            return self.reject_input(e);
        }

        let _loading = self.loading();
        match self.inner.api.stop_live().await {
            Ok(()) => {
                self.handle_live_stop();
                true
            }
            Err(e) => {
                self.report_live_failure(LiveAction::Stop, &e);
                false
            }
        }
    }

    fn handle_live_start(&self, stream: StreamCredentials) {
        info!("开播成功，推流地址 {}", stream.addr);
        {
            let mut state = self.state();
            state.is_live = true;
            state.stream = stream.clone();
        }
        self.emit(ViewUpdate::LiveButton(LiveButton::Stop));
        self.emit(ViewUpdate::Stream(stream));
        self.show_status("开播成功！推流信息已显示。", Tone::Success);
    }

    fn handle_live_stop(&self) {
        info!("停播成功");
        self.state().is_live = false;
        self.emit(ViewUpdate::LiveButton(LiveButton::Start));
        self.show_status("停播成功！", Tone::Success);
    }

    fn report_live_failure(&self, action: LiveAction, err: &ApiError) {
        error!("{}失败: {}", action.verb(), err);
        match err.backend_message() {
            Some(message) => {
                self.show_status(message, Tone::Error);
                self.show_toast(format!("{}失败", action.verb()), Tone::Error);
            }
            None => self.show_status(format!("{}失败！", action.verb()), Tone::Error),
        }
    }

    /// 把推流凭据写入导出目录，返回文件路径
    pub fn export_stream_credentials(&self) -> Option<PathBuf> {
        let (room_id, stream) = {
            let state = self.state();
            (state.session.room_id.clone(), state.stream.clone())
        };
        if !stream.is_complete() {
            self.show_toast("推流信息为空，请先开播", Tone::Warning);
            return None;
        }

        let dir = &self.inner.options.export_dir;
        let path = dir.join(report_file_name(&room_id, Utc::now()));
        let contents = report_contents(&room_id, &stream, Local::now());
        let written = fs::create_dir_all(dir).and_then(|_| fs::write(&path, contents));
        match written {
            Ok(()) => {
                info!("推流凭据已保存到 {}", path.display());
                self.show_toast("推流凭据已保存到本地", Tone::Success);
                Some(path)
            }
            Err(e) => {
                error!("保存推流凭据失败: {}", e);
                self.show_toast("推流凭据保存失败", Tone::Error);
                None
            }
        }
    }

    pub fn copy_stream_field(&self, field: StreamField) -> bool {
        let text = {
            let state = self.state();
            match field {
                StreamField::Addr => state.stream.addr.clone(),
                StreamField::Code => state.stream.code.clone(),
            }
        };
        if text.is_empty() {
            self.show_status("内容为空，无法复制！", Tone::Error);
            return false;
        }
        match self.inner.view.write_clipboard(&text) {
            Ok(()) => {
                self.show_toast(format!("{}已复制到剪贴板", field.label()), Tone::Success);
                true
            }
            Err(e) => {
                error!("复制失败: {}", e);
                self.show_toast("复制失败，请手动复制", Tone::Error);
                false
            }
        }
    }
}
