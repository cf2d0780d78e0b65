mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use api_client::{BootstrapMode, PanelConfig, StoredSession, Timings};
use common::{harness, harness_with, logged_in_credentials, FakeApi, PollStep};
use controller::{ControllerOptions, LiveButton, Page, QrImage, Tone, ViewUpdate};
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn logged_out_session_shows_qr_and_starts_both_timers() {
    let h = harness(FakeApi::default());

    assert!(!h.controller.check_login_status().await);

    assert!(h.view.has(&ViewUpdate::Page(Page::Login)));
    assert!(h.view.has(&ViewUpdate::Qr(QrImage {
        url: "https://passport.example/qr?k=1".into(),
        png: Some(b"png".to_vec()),
    })));
    assert!(h.view.has(&ViewUpdate::Countdown(180)));
    assert_eq!(h.view.qr_statuses(), vec!["请使用B站手机客户端扫码登录".to_string()]);
    assert!(h.controller.countdown_active());
    assert!(h.controller.polling_active());
    h.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn successful_scan_stops_timers_once_and_fills_session() {
    let h = harness(FakeApi::default());
    h.api.script_polls([
        PollStep::Code(86101, "未扫码"),
        PollStep::Code(86090, "已扫码"),
        PollStep::Code(0, ""),
    ]);

    h.controller.generate_qr_code().await;
    sleep(Duration::from_millis(1600)).await;

    assert!(!h.controller.polling_active());
    assert!(!h.controller.countdown_active());
    assert_eq!(h.controller.snapshot().session, logged_in_credentials());
    assert_eq!(
        h.view.qr_statuses()[1..],
        ["等待扫码中...".to_string(), "已扫码，请在手机上确认登录".to_string()]
    );
    assert_eq!(h.view.last_status(), Some(("登录成功！正在跳转...".to_string(), Tone::Success)));
    assert!(!h.view.has(&ViewUpdate::Page(Page::Main)));

    sleep(Duration::from_millis(1500)).await;
    assert!(h.view.has(&ViewUpdate::Page(Page::Main)));
    assert!(h.view.has(&ViewUpdate::Session(logged_in_credentials())));
    assert!(h.view.has(&ViewUpdate::LiveControlVisible(true)));
    assert_eq!(h.store.load().credentials(), logged_in_credentials());

    let polls = h.api.polled_keys.lock().unwrap().len();
    let countdowns = h.view.count(|u| matches!(u, ViewUpdate::Countdown(_)));
    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.api.polled_keys.lock().unwrap().len(), polls);
    assert_eq!(h.view.count(|u| matches!(u, ViewUpdate::Countdown(_))), countdowns);
    assert_eq!(h.view.count(|u| matches!(u, ViewUpdate::Status { message, .. } if message == "登录成功！正在跳转...")), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_code_only_shows_the_server_message() {
    let h = harness(FakeApi::default());
    h.api.script_polls([PollStep::Code(86038, "二维码已失效")]);

    h.controller.generate_qr_code().await;
    sleep(Duration::from_millis(1100)).await;

    assert_eq!(h.view.qr_statuses()[1], "状态：二维码已失效");
    assert!(h.controller.polling_active());
    assert!(h.controller.countdown_active());
    assert!(h.controller.snapshot().session.cookies.is_empty());
    h.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn poll_failures_keep_the_loop_running() {
    let h = harness(FakeApi::default());
    h.api.script_polls([PollStep::Fail, PollStep::Fail]);

    h.controller.generate_qr_code().await;
    sleep(Duration::from_millis(1600)).await;

    assert_eq!(h.api.polled_keys.lock().unwrap().len(), 3);
    assert!(h.controller.polling_active());
    assert!(!h.view.has(&ViewUpdate::Page(Page::Main)));
    h.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn restarting_the_countdown_never_double_decrements() {
    let h = harness(FakeApi::default());

    h.controller.start_countdown();
    sleep(Duration::from_millis(400)).await;
    h.controller.start_countdown();
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(h.controller.snapshot().countdown, 179);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.controller.snapshot().countdown, 178);
    assert!(h.controller.countdown_active());
    h.controller.shutdown();
    assert!(!h.controller.countdown_active());
}

#[tokio::test(start_paused = true)]
async fn expired_qr_is_replaced_automatically() {
    let timings = Timings { qr_lifetime_secs: 3, ..Timings::default() };
    let h = harness_with(FakeApi::default(), BootstrapMode::Backend, timings);

    h.controller.generate_qr_code().await;
    sleep(Duration::from_millis(3200)).await;

    assert_eq!(h.api.qr_codes.load(Ordering::SeqCst), 2);
    assert!(h.view.has(&ViewUpdate::Countdown(0)));
    assert_eq!(h.controller.snapshot().countdown, 3);
    assert!(h.controller.countdown_active());

    sleep(Duration::from_millis(600)).await;
    assert_eq!(h.api.polled_keys.lock().unwrap().last().map(String::as_str), Some("key-2"));
    h.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn failed_qr_request_shows_placeholder() {
    let api = FakeApi::default();
    api.qr_fails.store(true, Ordering::SeqCst);
    let h = harness(api);

    h.controller.generate_qr_code().await;

    assert!(h.view.has(&ViewUpdate::QrPlaceholder("二维码生成失败，请刷新重试".into())));
    assert!(!h.controller.polling_active());
    assert!(!h.controller.countdown_active());
}

#[tokio::test(start_paused = true)]
async fn existing_backend_session_opens_main_page() {
    let api = FakeApi::default();
    api.logged_in.store(true, Ordering::SeqCst);
    let h = harness(api);

    assert!(h.controller.check_login_status().await);

    assert!(h.view.has(&ViewUpdate::Page(Page::Main)));
    assert!(h.view.has(&ViewUpdate::LiveControlVisible(true)));
    assert!(h.view.has(&ViewUpdate::Session(logged_in_credentials())));
    assert_eq!(h.api.called("login_qr_code"), 0);
    assert!(!h.controller.polling_active());
}

#[tokio::test(start_paused = true)]
async fn local_mode_uses_cached_credentials() {
    let h = harness_with(FakeApi::default(), BootstrapMode::Local, Timings::default());
    h.store
        .save(&StoredSession { disclaimer_accepted: true, cookies: "SESSDATA=abc; bili_jct=def".into(), room_id: "233".into() })
        .unwrap();

    h.controller.bootstrap().await;

    assert_eq!(h.api.called("check_login"), 0);
    assert!(h.view.has(&ViewUpdate::Page(Page::Main)));
    assert_eq!(h.controller.snapshot().session, logged_in_credentials());
}

#[tokio::test(start_paused = true)]
async fn local_mode_asks_for_disclaimer_and_persists_acceptance() {
    let api = FakeApi::default();
    api.logged_in.store(true, Ordering::SeqCst);
    let h = harness_with(api, BootstrapMode::Local, Timings::default());

    h.controller.bootstrap().await;
    assert!(h.view.has(&ViewUpdate::Disclaimer(true)));
    assert!(h.controller.snapshot().disclaimer_pending);

    h.controller.accept_disclaimer().await;
    assert!(h.store.load().disclaimer_accepted);
    assert_eq!(h.api.called("accept_disclaimer"), 0);
    assert!(h.view.has(&ViewUpdate::Page(Page::Login)));
    h.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn pending_disclaimer_blocks_login_check() {
    let api = FakeApi::default();
    api.app_info.lock().unwrap().as_mut().unwrap().application.first_access = Some(false);
    api.logged_in.store(true, Ordering::SeqCst);
    let h = harness(api);

    h.controller.bootstrap().await;
    assert!(h.view.has(&ViewUpdate::Disclaimer(true)));
    assert_eq!(h.api.called("check_login"), 0);
    assert_eq!(h.api.called("area_list"), 1);

    h.controller.accept_disclaimer().await;
    assert_eq!(h.api.called("accept_disclaimer"), 1);
    assert!(h.view.has(&ViewUpdate::Disclaimer(false)));
    assert!(h.view.has(&ViewUpdate::Page(Page::Main)));
}

#[tokio::test(start_paused = true)]
async fn rejecting_the_disclaimer_closes_the_panel() {
    let api = FakeApi::default();
    api.app_info.lock().unwrap().as_mut().unwrap().application.first_access = Some(false);
    let h = harness(api);

    h.controller.bootstrap().await;
    h.controller.reject_disclaimer().await;

    assert_eq!(h.api.called("reject_disclaimer"), 1);
    assert!(h.view.toasts().contains(&("用户拒绝免责声明，程序即将退出".to_string(), Tone::Error)));
    assert_eq!(h.view.all().last(), Some(&ViewUpdate::Close));
    assert_eq!(h.api.called("check_login"), 0);
}

#[tokio::test(start_paused = true)]
async fn bootstrap_reflects_live_status_and_version() {
    let api = FakeApi::default();
    api.logged_in.store(true, Ordering::SeqCst);
    api.app_info.lock().unwrap().as_mut().unwrap().account.is_live = true;
    let h = harness(api);

    h.controller.bootstrap().await;

    let state = h.controller.snapshot();
    assert!(state.is_live);
    assert_eq!(state.version, "v2.0.0");
    assert!(h.view.has(&ViewUpdate::LiveButton(LiveButton::Stop)));
    assert!(h.view.has(&ViewUpdate::Version("v2.0.0".into())));
}

#[tokio::test(start_paused = true)]
async fn logout_clears_session_and_returns_to_qr_login() {
    let api = FakeApi::default();
    api.logged_in.store(true, Ordering::SeqCst);
    let h = harness(api);
    h.controller.check_login_status().await;
    h.store.save_credentials(&logged_in_credentials()).unwrap();

    assert!(h.controller.logout().await);

    let state = h.controller.snapshot();
    assert!(state.session.cookies.is_empty());
    assert!(!state.is_live);
    assert!(!h.store.load().credentials().is_complete());
    assert!(h.view.has(&ViewUpdate::LiveControlVisible(false)));
    assert_eq!(h.view.all().iter().rev().find(|u| matches!(u, ViewUpdate::Page(_))), Some(&ViewUpdate::Page(Page::Login)));
    assert!(h.controller.polling_active());
    h.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn exit_stops_timers_and_closes() {
    let h = harness(FakeApi::default());
    h.controller.generate_qr_code().await;

    h.controller.exit_application().await;

    assert!(!h.controller.polling_active());
    assert!(!h.controller.countdown_active());
    assert_eq!(h.api.called("exit_application"), 1);
    assert_eq!(h.view.all().last(), Some(&ViewUpdate::Close));
}

#[tokio::test(start_paused = true)]
async fn refresh_during_redirect_does_not_restart_timers() {
    let h = harness(FakeApi::default());
    h.api.script_polls([PollStep::Code(0, "")]);

    h.controller.generate_qr_code().await;
    sleep(Duration::from_millis(1100)).await;
    assert!(h.controller.snapshot().logging_in);

    h.controller.generate_qr_code().await;
    assert_eq!(h.api.qr_codes.load(Ordering::SeqCst), 1);
    assert!(!h.controller.polling_active());
    assert!(!h.controller.countdown_active());

    sleep(Duration::from_millis(1000)).await;
    assert!(h.view.has(&ViewUpdate::Page(Page::Main)));
    assert!(!h.controller.snapshot().logging_in);

    let polls = h.api.polled_keys.lock().unwrap().len();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.api.polled_keys.lock().unwrap().len(), polls);
    assert!(!h.controller.polling_active());
    assert!(!h.controller.countdown_active());
    assert_eq!(h.view.count(|u| matches!(u, ViewUpdate::Page(Page::Main))), 1);
}

#[tokio::test(start_paused = true)]
async fn entering_main_page_stops_running_qr_timers() {
    let api = FakeApi::default();
    api.logged_in.store(true, Ordering::SeqCst);
    let h = harness(api);
    h.controller.generate_qr_code().await;
    assert!(h.controller.polling_active());

    assert!(h.controller.check_login_status().await);

    assert!(!h.controller.polling_active());
    assert!(!h.controller.countdown_active());
    h.controller.generate_qr_code().await;
    assert_eq!(h.api.qr_codes.load(Ordering::SeqCst), 1);
}

#[test]
fn zero_timer_periods_are_clamped_for_the_controller() {
    let config = PanelConfig {
        timings: Timings { poll_interval_ms: 0, countdown_tick_ms: 0, ..Timings::default() },
        ..PanelConfig::default()
    };
    let options = ControllerOptions::from_config(&config);
    assert_eq!(options.timings.poll_interval_ms, 1);
    assert_eq!(options.timings.countdown_tick_ms, 1);
}

#[tokio::test(start_paused = true)]
async fn session_query_follows_bootstrap_mode_without_navigation() {
    let h = harness_with(FakeApi::default(), BootstrapMode::Local, Timings::default());
    assert!(!h.controller.is_logged_in().await);

    h.store.save_credentials(&logged_in_credentials()).unwrap();
    assert!(h.controller.is_logged_in().await);
    assert_eq!(h.api.called("check_login"), 0);
    assert!(h.view.all().is_empty());
    assert!(!h.controller.polling_active());
}
