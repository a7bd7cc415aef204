//! End-to-end orchestrator tests against a stub page driver.
//!
//! The stub honors the full driver capability surface and hands every
//! context a unique visit cookie, so the tests can prove that concurrent
//! sessions persist cookies to their own profiles without interference.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use stealthbrowse::driver::{
    BrowserContext, BrowserHandle, ContextOptions, DriverError, LaunchOptions, Page, PageDriver,
};
use stealthbrowse::profiles::{Cookie, ProfileStore, Viewport};
use stealthbrowse::session::{OrchestratorConfig, SessionError, SessionOrchestrator, SessionStatus};

#[derive(Default)]
struct StubDriver {
    fail_goto: bool,
    context_counter: AtomicU32,
}

impl StubDriver {
    fn failing_goto() -> Self {
        Self { fail_goto: true, ..Self::default() }
    }
}

struct StubBrowser {
    fail_goto: bool,
    context_id: u32,
}

struct StubContext {
    fail_goto: bool,
    context_id: u32,
    jar: Vec<Cookie>,
    viewport: Viewport,
}

struct StubPage {
    fail_goto: bool,
    viewport: Viewport,
}

fn cookie(name: &str, value: &str) -> Cookie {
    Cookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: "example.com".to_string(),
        path: "/".to_string(),
        expires: None,
        secure: false,
        http_only: false,
    }
}

#[async_trait]
impl PageDriver for StubDriver {
    async fn launch(&self, _options: LaunchOptions) -> Result<Box<dyn BrowserHandle>, DriverError> {
        Ok(Box::new(StubBrowser {
            fail_goto: self.fail_goto,
            context_id: self.context_counter.fetch_add(1, Ordering::Relaxed),
        }))
    }
}

#[async_trait]
impl BrowserHandle for StubBrowser {
    async fn new_context(
        &mut self,
        options: ContextOptions,
    ) -> Result<Box<dyn BrowserContext>, DriverError> {
        Ok(Box::new(StubContext {
            fail_goto: self.fail_goto,
            context_id: self.context_id,
            jar: Vec::new(),
            viewport: options.viewport,
        }))
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[async_trait]
impl BrowserContext for StubContext {
    async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DriverError> {
        self.jar.extend_from_slice(cookies);
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Vec<Cookie>, DriverError> {
        let mut jar = self.jar.clone();
        jar.push(cookie("visit", &self.context_id.to_string()));
        Ok(jar)
    }

    async fn new_page(&mut self) -> Result<Box<dyn Page>, DriverError> {
        Ok(Box::new(StubPage {
            fail_goto: self.fail_goto,
            viewport: self.viewport,
        }))
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[async_trait]
impl Page for StubPage {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        if self.fail_goto {
            return Err(DriverError::new("goto", format!("cannot reach {}", url)));
        }
        Ok(())
    }

    async fn screenshot(&mut self, _path: &Path) -> Result<(), DriverError> {
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    async fn mouse_click(&mut self, _x: i32, _y: i32, _delay_ms: u64) -> Result<(), DriverError> {
        Ok(())
    }

    async fn mouse_move(&mut self, _x: i32, _y: i32) -> Result<(), DriverError> {
        Ok(())
    }

    async fn mouse_wheel(&mut self, _dx: i32, _dy: i32) -> Result<(), DriverError> {
        Ok(())
    }

    async fn keyboard_type(&mut self, _ch: char, _delay_ms: u64) -> Result<(), DriverError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

struct Fixture {
    _profile_dir: tempfile::TempDir,
    _screenshot_dir: tempfile::TempDir,
    profiles: Arc<ProfileStore>,
    orchestrator: Arc<SessionOrchestrator>,
}

fn fixture(driver: StubDriver) -> Fixture {
    let profile_dir = tempfile::tempdir().unwrap();
    let screenshot_dir = tempfile::tempdir().unwrap();
    let profiles = Arc::new(ProfileStore::new(profile_dir.path()).unwrap());

    let orchestrator = Arc::new(SessionOrchestrator::new(
        Arc::new(driver),
        profiles.clone(),
        OrchestratorConfig {
            headless: true,
            screenshot_dir: screenshot_dir.path().to_path_buf(),
        },
    ));

    Fixture {
        _profile_dir: profile_dir,
        _screenshot_dir: screenshot_dir,
        profiles,
        orchestrator,
    }
}

#[tokio::test(start_paused = true)]
async fn session_runs_to_completion_and_persists_cookies() {
    let fx = fixture(StubDriver::default());

    fx.orchestrator
        .launch(1, "https://example.com", None, 1.0, 2.0, None)
        .await
        .unwrap();

    assert_eq!(fx.orchestrator.active_count().await, 0);

    let profile = fx.profiles.get("profile_1").unwrap();
    assert_eq!(profile.cookies.len(), 1);
    assert_eq!(profile.cookies[0].name, "visit");
}

#[tokio::test(start_paused = true)]
async fn stored_cookies_are_injected_on_the_next_run() {
    let fx = fixture(StubDriver::default());
    fx.profiles.get("profile_1").unwrap();
    fx.profiles
        .update_cookies("profile_1", vec![cookie("seed", "s1")])
        .unwrap();

    fx.orchestrator
        .launch(1, "https://example.com", None, 0.0, 0.0, None)
        .await
        .unwrap();

    // The flushed jar contains the injected seed plus the new visit.
    let profile = fx.profiles.get("profile_1").unwrap();
    let names: Vec<&str> = profile.cookies.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"seed"));
    assert!(names.contains(&"visit"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_sessions_keep_their_profiles_apart() {
    let fx = fixture(StubDriver::default());
    let count = 5u32;

    // Seed each profile with its own marker cookie first.
    for id in 1..=count {
        let profile_id = format!("profile_{}", id);
        fx.profiles.get(&profile_id).unwrap();
        fx.profiles
            .update_cookies(&profile_id, vec![cookie("seed", &format!("s{}", id))])
            .unwrap();
    }

    let mut tasks = Vec::new();
    for id in 1..=count {
        let orchestrator = fx.orchestrator.clone();
        tasks.push(tokio::spawn(async move {
            orchestrator
                .launch(id, "https://example.com", None, 1.0, 5.0, None)
                .await
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(fx.orchestrator.active_count().await, 0);

    // Every profile kept exactly its own seed, plus one distinct visit.
    let mut visit_values = Vec::new();
    for id in 1..=count {
        let profile = fx.profiles.get(&format!("profile_{}", id)).unwrap();
        let seed = profile.cookies.iter().find(|c| c.name == "seed").unwrap();
        assert_eq!(seed.value, format!("s{}", id));

        let visit = profile.cookies.iter().find(|c| c.name == "visit").unwrap();
        visit_values.push(visit.value.clone());
    }
    visit_values.sort();
    visit_values.dedup();
    assert_eq!(visit_values.len(), count as usize);
}

#[tokio::test(start_paused = true)]
async fn navigation_failure_fails_only_that_session() {
    let fx = fixture(StubDriver::failing_goto());

    let err = fx
        .orchestrator
        .launch(1, "https://example.com", None, 1.0, 2.0, None)
        .await
        .unwrap_err();

    assert_eq!(err.instance_id, 1);
    match err.source {
        SessionError::Driver(driver_err) => assert_eq!(driver_err.call, "goto"),
        other => panic!("unexpected error {:?}", other),
    }

    // The failed session flushed nothing.
    assert!(fx.profiles.get("profile_1").unwrap().cookies.is_empty());

    fx.orchestrator.close_all().await;
    assert_eq!(fx.orchestrator.active_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn close_all_cancels_a_holding_session() {
    let fx = fixture(StubDriver::default());

    let orchestrator = fx.orchestrator.clone();
    let task = tokio::spawn(async move {
        orchestrator
            .launch(1, "https://example.com", None, 3600.0, 3600.0, None)
            .await
    });

    // Wait for the session to reach its hold phase.
    while fx.orchestrator.session_status(1).await != Some(SessionStatus::Running) {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let session = fx.orchestrator.session(1).await.unwrap();
    fx.orchestrator.close_all().await;

    assert_eq!(fx.orchestrator.active_count().await, 0);
    assert_eq!(session.status(), SessionStatus::Closed);

    // The cancelled launch returns promptly and successfully.
    task.await.unwrap().unwrap();

    // Cancellation still counts as a clean close: cookies were flushed.
    let profile = fx.profiles.get("profile_1").unwrap();
    assert!(profile.cookies.iter().any(|c| c.name == "visit"));
}

#[tokio::test(start_paused = true)]
async fn duplicate_instance_ids_are_rejected_while_active() {
    let fx = fixture(StubDriver::default());

    let orchestrator = fx.orchestrator.clone();
    let task = tokio::spawn(async move {
        orchestrator
            .launch(1, "https://example.com", None, 3600.0, 3600.0, None)
            .await
    });

    while fx.orchestrator.session_status(1).await != Some(SessionStatus::Running) {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let err = fx
        .orchestrator
        .launch(1, "https://example.com", None, 1.0, 2.0, None)
        .await
        .unwrap_err();
    assert!(matches!(err.source, SessionError::AlreadyActive(1)));

    fx.orchestrator.close_all().await;
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn close_all_with_no_sessions_is_a_noop() {
    let fx = fixture(StubDriver::default());
    fx.orchestrator.close_all().await;
    assert_eq!(fx.orchestrator.active_count().await, 0);
}
