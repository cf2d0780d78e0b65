use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use api_client::{LocalStore, PanelApi, PanelClient, PanelConfig};
use clap::{Parser, Subcommand, ValueEnum};
use controller::{ControllerOptions, Page, PanelController, StreamField};
use domain::{child_choices, parent_choices, LoginState};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod console;

use console::ConsoleView;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// 面板后端地址，覆盖配置文件
    #[arg(long, env = "BILI_PANEL_URL", global = true)]
    base_url: Option<String>,
    /// 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 检查登录状态
    CheckLogin,
    /// 扫码登录，直到登录成功
    Login,
    /// 列出直播分区
    Areas,
    /// 查看直播间信息
    Room,
    /// 修改直播间标题
    SetTitle { title: String },
    /// 修改直播间标签，逗号分隔
    SetTags { tags: String },
    /// 修改直播间分区
    SetArea { parent: i64, child: i64 },
    /// 启动直播
    Start {
        /// 子分区 id
        #[arg(long)]
        area: i64,
        /// 开播后导出推流凭据
        #[arg(long)]
        export: bool,
        /// 开播后复制到剪贴板
        #[arg(long, value_enum)]
        copy: Option<CopyField>,
    },
    /// 停止直播
    Stop,
    /// 退出登录
    Logout,
    /// 同意或拒绝免责声明
    Disclaimer {
        #[command(subcommand)]
        action: DisclaimerAction,
    },
}

#[derive(Subcommand)]
enum DisclaimerAction {
    Accept,
    Reject,
}

#[derive(Clone, Copy, ValueEnum)]
enum CopyField {
    Addr,
    Code,
}

impl From<CopyField> for StreamField {
    fn from(field: CopyField) -> Self {
        match field {
            CopyField::Addr => StreamField::Addr,
            CopyField::Code => StreamField::Code,
        }
    }
}

struct App {
    api: Arc<PanelClient>,
    controller: PanelController,
    page: watch::Receiver<Option<Page>>,
}

impl App {
    /// 需要登录的命令先拿到会话凭据
    async fn require_session(&self) -> Result<()> {
        if !self.controller.is_logged_in().await {
            bail!("尚未登录，请先执行 login");
        }
        self.controller.check_login_status().await;
        Ok(())
    }

    /// 按子分区 id 找到父分区并完成级联选择
    async fn select_area(&self, parent: Option<i64>, child: i64) -> Result<()> {
        self.controller.load_areas().await;
        let parent = match parent {
            Some(parent) => parent,
            None => self
                .controller
                .snapshot()
                .areas
                .iter()
                .find(|p| p.children.iter().any(|c| c.id == child))
                .map(|p| p.id)
                .with_context(|| format!("未找到子分区 {}", child))?,
        };
        self.controller.select_parent_area(Some(parent));
        self.controller.select_child_area(Some(child));
        Ok(())
    }

    /// 等到进入主页面，Ctrl-C 时放弃
    async fn wait_for_login(&mut self) -> Result<()> {
        tokio::select! {
            res = self.page.wait_for(|p| *p == Some(Page::Main)) => {
                res.context("界面已关闭")?;
                Ok(())
            }
            _ = tokio::signal::ctrl_c() => {
                self.controller.shutdown();
                bail!("已取消登录");
            }
        }
    }

    async fn run(&mut self, command: Commands) -> Result<bool> {
        let c = self.controller.clone();
        let ok = match command {
            Commands::CheckLogin => {
                let state = LoginState::from(self.api.check_login().await?);
                println!("当前登录状态: {:?}", state);
                true
            }
            Commands::Login => {
                c.bootstrap().await;
                if c.snapshot().disclaimer_pending {
                    return Ok(false);
                }
                self.wait_for_login().await?;
                true
            }
            Commands::Areas => {
                c.load_areas().await;
                let areas = c.snapshot().areas;
                for parent in parent_choices(&areas).options {
                    println!("{}", parent.label);
                    for child in child_choices(&areas, Some(parent.id)).options {
                        println!("  {}", child.label);
                    }
                }
                true
            }
            Commands::Room => {
                self.require_session().await?;
                c.load_areas().await;
                c.get_room_data().await
            }
            Commands::SetTitle { title } => {
                self.require_session().await?;
                c.set_title(title);
                c.update_room_title().await
            }
            Commands::SetTags { tags } => {
                self.require_session().await?;
                c.set_tags_input(tags);
                c.update_room_tags().await
            }
            Commands::SetArea { parent, child } => {
                self.require_session().await?;
                self.select_area(Some(parent), child).await?;
                c.update_room_area().await
            }
            Commands::Start { area, export, copy } => {
                self.require_session().await?;
                self.select_area(None, area).await?;
                let started = c.start_live().await;
                if started && export {
                    if let Some(path) = c.export_stream_credentials() {
                        println!("已写入 {}", path.display());
                    }
                }
                if let (true, Some(field)) = (started, copy) {
                    c.copy_stream_field(field.into());
                }
                started
            }
            Commands::Stop => {
                self.require_session().await?;
                c.stop_live().await
            }
            Commands::Logout => {
                let ok = c.logout().await;
                c.shutdown();
                ok
            }
            Commands::Disclaimer { action: DisclaimerAction::Accept } => {
                c.accept_disclaimer().await;
                if c.snapshot().page == Some(Page::Login) {
                    self.wait_for_login().await?;
                }
                true
            }
            Commands::Disclaimer { action: DisclaimerAction::Reject } => {
                c.reject_disclaimer().await;
                true
            }
        };
        c.shutdown();
        Ok(ok)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PanelConfig::load_from(path)?,
        None => PanelConfig::load()?,
    };
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    let api = Arc::new(PanelClient::new(&config.base_url)?);
    info!("后端地址: {}", api.base_url());
    let store = LocalStore::default_path().map(LocalStore::at).unwrap_or_else(|| LocalStore::at("session.json"));
    let (view, page) = ConsoleView::new();
    let controller =
        PanelController::new(api.clone(), Arc::new(view), store, ControllerOptions::from_config(&config));

    let mut app = App { api, controller, page };
    if !app.run(cli.command).await? {
        bail!("操作未完成");
    }
    Ok(())
}
