//! Page driver capability
//!
//! The browser engine is an external collaborator: everything the core
//! needs from it is expressed here as object-safe async traits, shaped
//! after the launch → context → page hierarchy real engines expose. A
//! session owns its handles exclusively; they are never shared.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::profiles::{Cookie, Geolocation, Viewport};
use crate::proxy::ProxyConfig;

/// A failed page-driver call, naming the call that produced it.
#[derive(Error, Debug, Clone)]
#[error("page driver call `{call}` failed: {message}")]
pub struct DriverError {
    pub call: &'static str,
    pub message: String,
}

impl DriverError {
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self { call, message: message.into() }
    }
}

/// Options for launching a browser process
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Extra command-line switches (anti-automation flags live here)
    pub args: Vec<String>,
    pub proxy: Option<ProxyConfig>,
}

/// Options for creating an isolated browsing context
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub user_agent: Option<String>,
    pub viewport: Viewport,
    pub locale: String,
    pub timezone_id: String,
    pub geolocation: Option<Geolocation>,
}

/// Entry point into a browser engine.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn BrowserHandle>, DriverError>;
}

/// A running browser process.
#[async_trait]
pub trait BrowserHandle: Send {
    async fn new_context(
        &mut self,
        options: ContextOptions,
    ) -> Result<Box<dyn BrowserContext>, DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}

/// An isolated browsing context (cookie jar, fingerprint overrides).
#[async_trait]
pub trait BrowserContext: Send {
    async fn add_cookies(&mut self, cookies: &[Cookie]) -> Result<(), DriverError>;

    async fn cookies(&mut self) -> Result<Vec<Cookie>, DriverError>;

    async fn new_page(&mut self) -> Result<Box<dyn Page>, DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}

/// A single page with input primitives.
#[async_trait]
pub trait Page: Send {
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError>;

    /// Current viewport dimensions.
    fn viewport(&self) -> Viewport;

    async fn mouse_click(&mut self, x: i32, y: i32, delay_ms: u64) -> Result<(), DriverError>;

    async fn mouse_move(&mut self, x: i32, y: i32) -> Result<(), DriverError>;

    async fn mouse_wheel(&mut self, delta_x: i32, delta_y: i32) -> Result<(), DriverError>;

    async fn keyboard_type(&mut self, ch: char, delay_ms: u64) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Driver used when no real engine is wired in: every call succeeds
/// without touching a browser. Lets the orchestration pipeline run as a
/// dry run (the CLI falls back to it; tests use richer stubs).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDriver;

struct NoopBrowser;
struct NoopContext {
    viewport: Viewport,
}
struct NoopPage {
    viewport: Viewport,
}

#[async_trait]
impl PageDriver for NoopDriver {
    async fn launch(&self, options: LaunchOptions) -> Result<Box<dyn BrowserHandle>, DriverError> {
        tracing::debug!(
            "NoopDriver launch (headless: {}, {} args)",
            options.headless,
            options.args.len()
        );
        Ok(Box::new(NoopBrowser))
    }
}

#[async_trait]
impl BrowserHandle for NoopBrowser {
    async fn new_context(
        &mut self,
        options: ContextOptions,
    ) -> Result<Box<dyn BrowserContext>, DriverError> {
        Ok(Box::new(NoopContext { viewport: options.viewport }))
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[async_trait]
impl BrowserContext for NoopContext {
    async fn add_cookies(&mut self, _cookies: &[Cookie]) -> Result<(), DriverError> {
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Vec<Cookie>, DriverError> {
        Ok(Vec::new())
    }

    async fn new_page(&mut self) -> Result<Box<dyn Page>, DriverError> {
        Ok(Box::new(NoopPage { viewport: self.viewport }))
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[async_trait]
impl Page for NoopPage {
    async fn goto(&mut self, _url: &str) -> Result<(), DriverError> {
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

    async fn mouse_wheel(&mut self, _delta_x: i32, _delta_y: i32) -> Result<(), DriverError> {
        Ok(())
    }

    async fn keyboard_type(&mut self, _ch: char, _delay_ms: u64) -> Result<(), DriverError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}
