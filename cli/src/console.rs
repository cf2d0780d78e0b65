//! 终端上的界面适配：把更新逐条打印出来。

use anyhow::Result;
use controller::{Page, PanelView, QrImage, Tone, ViewUpdate};
use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;
use tokio::sync::watch;
use tracing::debug;

pub struct ConsoleView {
    page: watch::Sender<Option<Page>>,
}

impl ConsoleView {
    pub fn new() -> (Self, watch::Receiver<Option<Page>>) {
        let (page, rx) = watch::channel(None);
        (Self { page }, rx)
    }
}

fn tag(tone: Tone) -> &'static str {
    match tone {
        Tone::Info => "信息",
        Tone::Success => "成功",
        Tone::Warning => "注意",
        Tone::Error => "错误",
    }
}

fn print_qr(qr: &QrImage) {
    match QrCode::new(qr.url.as_bytes()) {
        Ok(code) => {
            let art = code
                .render::<Dense1x2>()
                .dark_color(Dense1x2::Light)
                .light_color(Dense1x2::Dark)
                .quiet_zone(true)
                .build();
            println!("{}", art);
        }
        Err(e) => debug!("终端绘制二维码失败: {}", e),
    }
    println!("二维码链接: {}", qr.url);
}

impl PanelView for ConsoleView {
    fn apply(&self, update: ViewUpdate) {
        match update {
            ViewUpdate::Toast { message, tone } | ViewUpdate::Status { message, tone } => {
                println!("[{}] {}", tag(tone), message);
            }
            ViewUpdate::Disclaimer(true) => {
                println!("首次使用需要同意免责声明，请执行 `disclaimer accept` 或 `disclaimer reject`");
            }
            ViewUpdate::Page(page) => {
                self.page.send_replace(Some(page));
            }
            ViewUpdate::Qr(qr) => print_qr(&qr),
            ViewUpdate::QrPlaceholder(text) | ViewUpdate::QrStatus(text) => println!("{}", text),
            ViewUpdate::Countdown(secs) if secs % 30 == 0 => println!("二维码有效期剩余 {} 秒", secs),
            ViewUpdate::Session(creds) if !creds.room_id.is_empty() => println!("直播间号: {}", creds.room_id),
            ViewUpdate::Stream(stream) if stream.is_complete() => {
                println!("推流地址: {}\n推流密钥: {}", stream.addr, stream.code);
            }
            ViewUpdate::RoomForm { title, tags } => println!("标题: {}\n标签: {}", title, tags),
            ViewUpdate::Version(version) => println!("后端版本: {}", version),
            other => debug!("{:?}", other),
        }
    }

    fn write_clipboard(&self, text: &str) -> Result<()> {
        arboard::Clipboard::new()?.set_text(text)?;
        Ok(())
    }
}
