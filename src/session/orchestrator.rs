//! Session orchestration
//!
//! Owns the pool of active browser sessions. Each `launch` call runs one
//! full session lifecycle — profile acquisition, stealth browser launch,
//! cookie restore, navigation, behavior warm-up, randomized hold, then
//! teardown with cookie persistence. Failures are isolated per instance;
//! `close_all` cancels everything that is still running.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, info, warn};

use crate::driver::{
    BrowserContext, BrowserHandle, ContextOptions, LaunchOptions, Page, PageDriver,
};
use crate::profiles::ProfileStore;
use crate::proxy::ProxyConfig;
use crate::session::behavior::HumanBehavior;
use crate::session::errors::{LaunchError, SessionError};
use crate::session::fingerprint::{rotate_user_agent, stealth_launch_args};

/// Per-instance progress reporting for the CLI/GUI, alongside tracing.
pub type LogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Lifecycle state of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Launching,
    Running,
    ClosingDown,
    Closed,
    Failed,
}

/// The driver handles a session owns exclusively. Taken out one by one at
/// teardown, which makes closing idempotent under races.
#[derive(Default)]
struct DriverHandles {
    browser: Option<Box<dyn BrowserHandle>>,
    context: Option<Box<dyn BrowserContext>>,
    page: Option<Box<dyn Page>>,
}

/// One active browser session tied to one profile
pub struct Session {
    pub instance_id: u32,
    pub profile_id: String,
    proxy: Option<ProxyConfig>,
    status: parking_lot::RwLock<SessionStatus>,
    cancel: Notify,
    handles: Mutex<DriverHandles>,
}

impl Session {
    fn new(instance_id: u32, proxy: Option<ProxyConfig>) -> Self {
        Self {
            instance_id,
            profile_id: format!("profile_{}", instance_id),
            proxy,
            status: parking_lot::RwLock::new(SessionStatus::Launching),
            cancel: Notify::new(),
            handles: Mutex::new(DriverHandles::default()),
        }
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.read()
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    fn set_status(&self, status: SessionStatus) {
        *self.status.write() = status;
    }
}

/// Orchestrator-wide settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Launch browsers headless
    pub headless: bool,
    /// Where per-instance verification screenshots are written
    pub screenshot_dir: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            headless: true,
            screenshot_dir: PathBuf::from("."),
        }
    }
}

/// Pool of concurrently running browser sessions
pub struct SessionOrchestrator {
    driver: Arc<dyn PageDriver>,
    profiles: Arc<ProfileStore>,
    config: OrchestratorConfig,
    sessions: RwLock<HashMap<u32, Arc<Session>>>,
}

impl SessionOrchestrator {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        profiles: Arc<ProfileStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let _ = std::fs::create_dir_all(&config.screenshot_dir);
        Self {
            driver,
            profiles,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Run one full session lifecycle for `instance_id`.
    ///
    /// The call spans the whole session: it returns after teardown, or
    /// with a [`LaunchError`] once the failed session has been torn down
    /// best-effort. Invoke once per desired concurrent instance, each in
    /// its own task. Cancellation via [`close_all`](Self::close_all) is
    /// coarse-grained: driver primitives always run to completion, so a
    /// stuck driver call can block its session indefinitely.
    pub async fn launch(
        &self,
        instance_id: u32,
        url: &str,
        proxy: Option<ProxyConfig>,
        min_time: f64,
        max_time: f64,
        log: Option<LogCallback>,
    ) -> Result<(), LaunchError> {
        let session = Arc::new(Session::new(instance_id, proxy));

        {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(&instance_id) {
                return Err(LaunchError::new(
                    instance_id,
                    SessionError::AlreadyActive(instance_id),
                ));
            }
            sessions.insert(instance_id, session.clone());
        }

        let result = self
            .run_session(&session, url, min_time, max_time, log.as_ref())
            .await;

        match result {
            Ok(()) => {
                session.set_status(SessionStatus::ClosingDown);
                self.teardown(&session, true).await;
                session.set_status(SessionStatus::Closed);
            }
            Err(_) => {
                // Failed sessions release every resource but keep their
                // cookie jar out of the profile store.
                session.set_status(SessionStatus::Failed);
                self.teardown(&session, false).await;
            }
        }

        self.sessions.write().await.remove(&instance_id);

        result.map_err(|source| LaunchError { instance_id, source })
    }

    async fn run_session(
        &self,
        session: &Arc<Session>,
        url: &str,
        min_time: f64,
        max_time: f64,
        log: Option<&LogCallback>,
    ) -> Result<(), SessionError> {
        let instance_id = session.instance_id;
        let profile = self.profiles.get(&session.profile_id)?;

        // Setup and warm-up run under the handles lock: every handle is
        // parked in the session the moment it exists, so teardown can
        // always reach whatever was created, even after a partial setup.
        {
            let mut handles = session.handles.lock().await;

            let browser = self
                .driver
                .launch(LaunchOptions {
                    headless: self.config.headless,
                    args: stealth_launch_args(),
                    proxy: session.proxy.clone(),
                })
                .await?;
            handles.browser = Some(browser);

            let user_agent = profile
                .settings
                .user_agent
                .clone()
                .unwrap_or_else(|| rotate_user_agent().to_string());

            let context = handles
                .browser
                .as_mut()
                .ok_or(SessionError::Closed)?
                .new_context(ContextOptions {
                    user_agent: Some(user_agent),
                    viewport: profile.settings.viewport,
                    locale: profile.settings.language.clone(),
                    timezone_id: profile.settings.timezone.clone(),
                    geolocation: profile.settings.geolocation,
                })
                .await?;
            handles.context = Some(context);

            let context = handles.context.as_mut().ok_or(SessionError::Closed)?;
            if !profile.cookies.is_empty() {
                context.add_cookies(&profile.cookies).await?;
                debug!(
                    "Instance {}: restored {} cookies",
                    instance_id,
                    profile.cookies.len()
                );
            }

            let page = context.new_page().await?;
            handles.page = Some(page);

            session.set_status(SessionStatus::Running);

            let page = handles.page.as_mut().ok_or(SessionError::Closed)?;
            page.goto(url).await?;
            report(log, instance_id, &format!("Navigated to {}", url));

            let screenshot_path = self
                .config
                .screenshot_dir
                .join(format!("instance_{}_screenshot.png", instance_id));
            page.screenshot(&screenshot_path).await?;
            report(
                log,
                instance_id,
                &format!("Screenshot saved to {}", screenshot_path.display()),
            );

            HumanBehavior::warm_up(page.as_mut()).await?;
        }

        // Hold the session open, raced against bulk cancellation.
        let hold_secs = rand::thread_rng().gen_range(min_time..=max_time);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs_f64(hold_secs)) => {
                report(
                    log,
                    instance_id,
                    &format!("Closed after {:.1} seconds", hold_secs),
                );
            }
            _ = session.cancel.notified() => {
                report(log, instance_id, "Cancelled");
            }
        }

        Ok(())
    }

    /// Release a session's resources, best-effort: every close is
    /// attempted even when earlier ones fail, and teardown errors are
    /// logged, never propagated.
    async fn teardown(&self, session: &Session, flush_cookies: bool) {
        let instance_id = session.instance_id;
        let mut handles = session.handles.lock().await;

        if flush_cookies {
            if let Some(context) = handles.context.as_mut() {
                match context.cookies().await {
                    Ok(cookies) => {
                        if let Err(e) = self.profiles.update_cookies(&session.profile_id, cookies)
                        {
                            warn!("Instance {}: failed to persist cookies: {}", instance_id, e);
                        }
                    }
                    Err(e) => {
                        warn!("Instance {}: failed to read cookies: {}", instance_id, e)
                    }
                }
            }
        }

        if let Some(mut page) = handles.page.take() {
            if let Err(e) = page.close().await {
                warn!("Instance {}: failed to close page: {}", instance_id, e);
            }
        }
        if let Some(mut context) = handles.context.take() {
            if let Err(e) = context.close().await {
                warn!("Instance {}: failed to close context: {}", instance_id, e);
            }
        }
        if let Some(mut browser) = handles.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Instance {}: failed to close browser: {}", instance_id, e);
            }
        }
    }

    /// Tear down every active session. Safe to call while launches are
    /// still running; the active set is empty on return.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, session)| session).collect()
        };

        if drained.is_empty() {
            return;
        }
        info!("Closing {} active sessions", drained.len());

        // Wake every holding session first so none keeps sleeping while
        // the others are being closed. notify_one stores a permit, so
        // sessions that have not reached their hold phase yet still see
        // the cancellation.
        for session in &drained {
            session.cancel.notify_one();
        }

        for session in drained {
            session.set_status(SessionStatus::ClosingDown);
            self.teardown(&session, true).await;
            session.set_status(SessionStatus::Closed);
            info!("Instance {} closed", session.instance_id);
        }
    }

    /// Number of currently active sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Look up an active session.
    pub async fn session(&self, instance_id: u32) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&instance_id).cloned()
    }

    /// Status of an active session, if any.
    pub async fn session_status(&self, instance_id: u32) -> Option<SessionStatus> {
        self.session(instance_id).await.map(|s| s.status())
    }
}

fn report(log: Option<&LogCallback>, instance_id: u32, message: &str) {
    info!("Instance {}: {}", instance_id, message);
    if let Some(callback) = log {
        callback(&format!("Instance {}: {}", instance_id, message));
    }
}
