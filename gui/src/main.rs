#![windows_subsystem = "windows"] // 在Windows上隐藏控制台窗口
use std::fs;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use api_client::{LocalStore, PanelClient, PanelConfig};
use controller::{ControllerOptions, Page, PanelController, StreamField, Tone};
use domain::Choices;
use eframe::{egui, Frame};
use qrcode::{Color, QrCode};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod view;

use view::{lock, GuiView, ViewModel};

const DISCLAIMER: &str = "本工具仅供学习交流使用，通过本工具进行的一切直播操作均由使用者自行负责。\n\
继续使用即表示您已阅读并同意上述条款。";

/// 界面上产生的操作，在释放模型锁之后统一分发
enum Command {
    AcceptDisclaimer,
    RejectDisclaimer,
    RefreshQr,
    SetRoomId(String),
    SetCookies(String),
    SetTitle(String),
    SetTags(String),
    GetRoomData,
    UpdateTitle,
    UpdateTags,
    UpdateArea,
    SelectParent(Option<i64>),
    SelectChild(Option<i64>),
    ToggleLive,
    Export,
    Copy(StreamField),
    Logout,
    Exit,
}

struct BiliApp {
    controller: PanelController,
    rt: Runtime,
    model: Arc<Mutex<ViewModel>>,
    qr_texture: Option<egui::TextureHandle>,
    qr_generation: u64,
    toast_ttl: Duration,
}

impl BiliApp {
    /// 生成带静区且放大后的二维码纹理
    fn load_qr_texture(url: &str, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        let code = QrCode::new(url.as_bytes()).ok()?;
        let module_count = code.width();
        let margin_modules = 4; // 留白
        let scale = 6; // 单模块像素数，控制大小与清晰度
        let img_side = (module_count + margin_modules * 2) * scale;
        let mut pixels = vec![255u8; img_side * img_side * 4];

        for y in 0..module_count {
            for x in 0..module_count {
                if code[(x, y)] == Color::Dark {
                    let start_x = (x + margin_modules) * scale;
                    let start_y = (y + margin_modules) * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let idx = ((start_y + dy) * img_side + (start_x + dx)) * 4;
                            pixels[idx..idx + 4].copy_from_slice(&[0, 0, 0, 255]);
                        }
                    }
                }
            }
        }

        let img = egui::ColorImage::from_rgba_unmultiplied([img_side, img_side], &pixels);
        Some(ctx.load_texture("qr", img, Default::default()))
    }

    fn bytes_to_texture(bytes: &[u8], ctx: &egui::Context) -> Option<egui::TextureHandle> {
        let img = image::load_from_memory(bytes).ok()?;
        let size = [img.width() as usize, img.height() as usize];
        let pixels = img.into_rgba8().into_raw();
        let img = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
        Some(ctx.load_texture("qr", img, Default::default()))
    }

    /// 二维码换代后重建纹理；后端图片解不出来时本地绘制
    fn sync_qr_texture(&mut self, model: &ViewModel, ctx: &egui::Context) {
        if model.qr_generation == self.qr_generation {
            return;
        }
        self.qr_generation = model.qr_generation;
        self.qr_texture = model.qr.as_ref().and_then(|qr| {
            qr.png
                .as_deref()
                .and_then(|png| Self::bytes_to_texture(png, ctx))
                .or_else(|| Self::load_qr_texture(&qr.url, ctx))
        });
    }

    fn spawn<F, Fut>(&self, f: F)
    where
        F: FnOnce(PanelController) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.rt.spawn(f(self.controller.clone()));
    }

    fn run(&self, command: Command) {
        let c = &self.controller;
        match command {
            Command::AcceptDisclaimer => self.spawn(|c| async move { c.accept_disclaimer().await }),
            Command::RejectDisclaimer => self.spawn(|c| async move { c.reject_disclaimer().await }),
            Command::RefreshQr => self.spawn(|c| async move { c.generate_qr_code().await }),
            Command::SetRoomId(v) => c.set_room_id(v),
            Command::SetCookies(v) => c.set_cookies(v),
            Command::SetTitle(v) => c.set_title(v),
            Command::SetTags(v) => c.set_tags_input(v),
            Command::GetRoomData => self.spawn(|c| async move {
                c.get_room_data().await;
            }),
            Command::UpdateTitle => self.spawn(|c| async move {
                c.update_room_title().await;
            }),
            Command::UpdateTags => self.spawn(|c| async move {
                c.update_room_tags().await;
            }),
            Command::UpdateArea => self.spawn(|c| async move {
                c.update_room_area().await;
            }),
            Command::SelectParent(id) => c.select_parent_area(id),
            Command::SelectChild(id) => c.select_child_area(id),
            Command::ToggleLive => self.spawn(|c| async move {
                c.toggle_live().await;
            }),
            Command::Export => {
                c.export_stream_credentials();
            }
            Command::Copy(field) => {
                c.copy_stream_field(field);
            }
            Command::Logout => self.spawn(|c| async move {
                c.logout().await;
            }),
            Command::Exit => self.spawn(|c| async move { c.exit_application().await }),
        }
    }
}

fn tone_color(tone: Tone) -> egui::Color32 {
    match tone {
        Tone::Info => egui::Color32::from_rgb(120, 180, 255),
        Tone::Success => egui::Color32::GREEN,
        Tone::Warning => egui::Color32::YELLOW,
        Tone::Error => egui::Color32::RED,
    }
}

/// 父/子分区下拉框，占位项对应未选择
fn area_combo(ui: &mut egui::Ui, id: &str, choices: &Choices, selected: Option<i64>) -> Option<Option<i64>> {
    let mut picked = None;
    egui::ComboBox::from_id_source(id)
        .width(220.0)
        .selected_text(choices.label_of(selected))
        .show_ui(ui, |ui| {
            if ui.selectable_label(selected.is_none(), choices.placeholder).clicked() {
                picked = Some(None);
            }
            for option in &choices.options {
                if ui.selectable_label(selected == Some(option.id), &option.label).clicked() {
                    picked = Some(Some(option.id));
                }
            }
        });
    picked
}

fn login_page(ui: &mut egui::Ui, m: &ViewModel, qr: Option<&egui::TextureHandle>, out: &mut Vec<Command>) {
    ui.vertical_centered(|ui| {
        ui.heading("请扫码登录");
        ui.add_space(20.0);

        match (qr, &m.qr_placeholder) {
            (Some(tex), _) => {
                ui.image((tex.id(), tex.size_vec2()));
            }
            (None, Some(text)) => {
                ui.colored_label(egui::Color32::RED, text);
            }
            (None, None) => {
                ui.spinner();
            }
        }
        ui.add_space(10.0);
        ui.label(&m.qr_status);
        ui.label(format!("二维码有效期剩余 {} 秒", m.countdown));
        ui.add_space(10.0);
        if ui.add_sized([200.0, 30.0], egui::Button::new("刷新二维码")).clicked() {
            out.push(Command::RefreshQr);
        }
    });
}

fn main_page(ui: &mut egui::Ui, m: &mut ViewModel, out: &mut Vec<Command>) {
    let busy = m.loading > 0;

    ui.group(|ui| {
        ui.heading("账号信息");
        ui.add_space(5.0);
        egui::Grid::new("session").num_columns(2).show(ui, |ui| {
            ui.label("直播间号:");
            if ui.text_edit_singleline(&mut m.room_id).changed() {
                out.push(Command::SetRoomId(m.room_id.clone()));
            }
            ui.end_row();
            ui.label("Cookies:");
            let cookies = egui::TextEdit::singleline(&mut m.cookies).password(true).desired_width(f32::INFINITY);
            if ui.add(cookies).changed() {
                out.push(Command::SetCookies(m.cookies.clone()));
            }
            ui.end_row();
        });
        ui.horizontal(|ui| {
            if ui.button("获取直播间信息").clicked() {
                out.push(Command::GetRoomData);
            }
            if ui.button("退出登录").clicked() {
                out.push(Command::Logout);
            }
        });
    });
    ui.add_space(10.0);

    ui.add_enabled_ui(!busy, |ui| {
        ui.group(|ui| {
            ui.heading("直播间信息");
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.label("标题: ");
                if ui.add(egui::TextEdit::singleline(&mut m.title).desired_width(360.0)).changed() {
                    out.push(Command::SetTitle(m.title.clone()));
                }
                if ui.button("更新标题").clicked() {
                    out.push(Command::UpdateTitle);
                }
            });
            ui.horizontal(|ui| {
                ui.label("标签: ");
                let tags = egui::TextEdit::singleline(&mut m.tags).hint_text("用逗号分隔").desired_width(360.0);
                if ui.add(tags).changed() {
                    out.push(Command::SetTags(m.tags.clone()));
                }
                if ui.button("更新标签").clicked() {
                    out.push(Command::UpdateTags);
                }
            });
            ui.horizontal(|ui| {
                if let Some(id) = area_combo(ui, "parent_area", &m.parents, m.parent) {
                    out.push(Command::SelectParent(id));
                }
                if let Some(id) = area_combo(ui, "child_area", &m.children, m.child) {
                    out.push(Command::SelectChild(id));
                }
                if ui.button("更新分区").clicked() {
                    out.push(Command::UpdateArea);
                }
            });
        });
    });
    ui.add_space(10.0);

    if !m.live_visible {
        return;
    }
    ui.group(|ui| {
        ui.heading("直播控制");
        ui.add_space(5.0);
        ui.add_enabled_ui(!busy, |ui| {
            if ui.add_sized([200.0, 30.0], egui::Button::new(m.live_button.label())).clicked() {
                out.push(Command::ToggleLive);
            }
        });
        ui.add_space(5.0);
        for (field, value) in [(StreamField::Addr, &m.stream.addr), (StreamField::Code, &m.stream.code)] {
            ui.label(format!("{}:", field.label()));
            ui.horizontal(|ui| {
                let mut shown = value.as_str();
                ui.add(egui::TextEdit::singleline(&mut shown).desired_width(420.0));
                if ui.button("复制").clicked() {
                    out.push(Command::Copy(field));
                }
            });
        }
        if ui.button("导出推流信息").clicked() {
            out.push(Command::Export);
        }
    });
}

fn disclaimer_window(ctx: &egui::Context, out: &mut Vec<Command>) {
    egui::Window::new("免责声明")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(DISCLAIMER);
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("同意").clicked() {
                    out.push(Command::AcceptDisclaimer);
                }
                if ui.button("拒绝").clicked() {
                    out.push(Command::RejectDisclaimer);
                }
            });
        });
}

fn toasts(ctx: &egui::Context, m: &ViewModel) {
    if m.toasts.is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_TOP, [-16.0, 16.0])
        .show(ctx, |ui| {
            for toast in &m.toasts {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.colored_label(tone_color(toast.tone), &toast.message);
                });
            }
        });
}

impl eframe::App for BiliApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let model = self.model.clone();
        let mut m = lock(&model);
        let mut commands = Vec::new();

        if let Some(text) = m.pending_clipboard.take() {
            ctx.output_mut(|o| o.copied_text = text);
        }
        if m.close {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        let ttl = self.toast_ttl;
        m.toasts.retain(|t| t.shown_at.elapsed() < ttl);
        if !m.toasts.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
        self.sync_qr_texture(&m, ctx);

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if m.loading > 0 {
                    ui.spinner();
                }
                if let Some((message, tone)) = &m.status {
                    ui.colored_label(tone_color(*tone), message);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("退出应用").clicked() {
                        commands.push(Command::Exit);
                    }
                    if !m.version.is_empty() {
                        ui.label(format!("后端版本 {}", m.version));
                    }
                    ui.label(format!("面板 v{}", env!("CARGO_PKG_VERSION")));
                });
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::default().inner_margin(egui::Margin::ZERO))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let frame = egui::Frame::default().inner_margin(egui::Margin::same(16.0));
                    frame.show(ui, |ui| {
                        ui.heading("B站直播工具");
                        ui.add_space(10.0);
                        let page = m.page;
                        match page {
                            Some(Page::Login) => login_page(ui, &m, self.qr_texture.as_ref(), &mut commands),
                            Some(Page::Main) => main_page(ui, &mut m, &mut commands),
                            None => {
                                ui.label("正在连接后端...");
                            }
                        }
                    });
                });
            });

        if m.disclaimer {
            disclaimer_window(ctx, &mut commands);
        }
        toasts(ctx, &m);

        drop(m);
        for command in commands {
            self.run(command);
        }
    }
}

/// 中文字体从配置中读取，读不到就用 egui 自带字体
fn install_fonts(ctx: &egui::Context, config: &PanelConfig) {
    let Some(path) = &config.font_path else {
        return;
    };
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("读取字体 {} 失败: {}", path.display(), e);
            return;
        }
    };
    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert("cjk".to_owned(), egui::FontData::from_owned(bytes));
    fonts.families.entry(egui::FontFamily::Proportional).or_default().insert(0, "cjk".to_owned());
    fonts.families.entry(egui::FontFamily::Monospace).or_default().push("cjk".to_owned());
    ctx.set_fonts(fonts);
}

fn install_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.text_styles = [
        (egui::TextStyle::Heading, egui::FontId::proportional(22.0)),
        (egui::TextStyle::Body, egui::FontId::proportional(16.0)),
        (egui::TextStyle::Monospace, egui::FontId::monospace(14.0)),
        (egui::TextStyle::Button, egui::FontId::proportional(15.0)),
        (egui::TextStyle::Small, egui::FontId::proportional(12.0)),
    ]
    .into();

    let mut visuals = egui::Visuals::dark();
    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(30, 30, 30);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(50, 50, 50);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(70, 70, 70);
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(90, 90, 90);
    visuals.window_fill = egui::Color32::from_rgb(20, 20, 20);
    style.visuals = visuals;
    ctx.set_style(style);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PanelConfig::load()?;
    info!("后端地址: {}", config.base_url);
    let api = Arc::new(PanelClient::new(&config.base_url)?);
    let store = LocalStore::default_path().map(LocalStore::at).unwrap_or_else(|| LocalStore::at("session.json"));
    let rt = Runtime::new()?;

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport.inner_size = Some(egui::vec2(800.0, 640.0));
    native_options.follow_system_theme = false;
    native_options.default_theme = eframe::Theme::Dark;

    let result = eframe::run_native(
        "Bili Live Panel",
        native_options,
        Box::new(move |cc| {
            install_fonts(&cc.egui_ctx, &config);
            install_style(&cc.egui_ctx);

            let model = Arc::new(Mutex::new(ViewModel::default()));
            let view = Arc::new(GuiView::new(model.clone(), cc.egui_ctx.clone()));
            let controller = PanelController::new(api, view, store, ControllerOptions::from_config(&config));

            let boot = controller.clone();
            rt.spawn(async move { boot.bootstrap().await });

            Box::new(BiliApp {
                controller,
                rt,
                model,
                qr_texture: None,
                qr_generation: 0,
                toast_ttl: Duration::from_millis(config.timings.toast_ms),
            })
        }),
    );

    result.map_err(Into::into)
}
