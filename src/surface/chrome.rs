// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Chrome adapter for the automation surface
//!
//! Drives a real headed Chrome over CDP. The target SPA does not render in
//! headless mode, so the browser is launched with a window; the automation
//! tell (`navigator.webdriver`, the AutomationControlled blink feature) is
//! suppressed to keep the session indistinguishable from the captured one.
//!
//! All knowledge of the remote UI lives here: the Spectrum Web Component
//! selectors for the three controls, the file-chooser interception and the
//! download staging. The workflow engine never sees a selector.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, SetDownloadBehaviorBehavior,
    SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, EventFileChooserOpened,
    SetInterceptFileChooserDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::{AutomationSurface, Control};
use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use crate::session::SessionSnapshot;

/// Interval between presence polls inside a bounded wait
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Selector for the queued-file delete control
const REMOVE_QUEUED_SELECTOR: &str = r#"sp-action-button[aria-label="Delete"]"#;
/// Selector for the download control
const DOWNLOAD_SELECTOR: &str = r#"button[aria-label="Download"]"#;
/// Label text identifying the upload control among sp-buttons
const CHOOSE_FILES_LABEL: &str = "Choose files";

/// Real browser implementation of [`AutomationSurface`]
pub struct ChromeSurface {
    config: WorkflowConfig,
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromeSurface {
    /// Create a surface for the given workflow config
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
            handler_task: None,
        }
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::browser("no open page"))
    }

    /// Presence predicate for a control, evaluated in page context
    fn presence_script(control: Control) -> String {
        match control {
            Control::ChooseFiles => format!(
                "!![...document.querySelectorAll('sp-button')]\
                 .find(b => (b.textContent || '').includes({label:?}))",
                label = CHOOSE_FILES_LABEL
            ),
            Control::RemoveQueued => {
                format!("!!document.querySelector('{}')", REMOVE_QUEUED_SELECTOR)
            }
            Control::Download => format!("!!document.querySelector('{}')", DOWNLOAD_SELECTOR),
        }
    }

    /// Locate the element for a control
    async fn find_control(&self, control: Control) -> Result<Element> {
        let page = self.page()?;
        match control {
            Control::ChooseFiles => {
                let buttons = page
                    .find_elements("sp-button")
                    .await
                    .map_err(|e| Error::browser(e.to_string()))?;
                for button in buttons {
                    if let Ok(Some(text)) = button.inner_text().await {
                        if text.contains(CHOOSE_FILES_LABEL) {
                            return Ok(button);
                        }
                    }
                }
                Err(Error::browser("upload control not found on page"))
            }
            Control::RemoveQueued => page
                .find_element(REMOVE_QUEUED_SELECTOR)
                .await
                .map_err(|e| Error::browser(e.to_string())),
            Control::Download => page
                .find_element(DOWNLOAD_SELECTOR)
                .await
                .map_err(|e| Error::browser(e.to_string())),
        }
    }

    /// Init script installed before any document runs: hide the webdriver
    /// flag and seed captured localStorage for matching origins
    fn init_script(snapshot: &SessionSnapshot) -> Result<String> {
        let mut seeds = serde_json::Map::new();
        for origin in &snapshot.origins {
            let items: serde_json::Map<String, serde_json::Value> = origin
                .local_storage
                .iter()
                .map(|item| (item.name.clone(), item.value.clone().into()))
                .collect();
            seeds.insert(origin.origin.clone(), items.into());
        }
        let seeds_json = serde_json::to_string(&serde_json::Value::Object(seeds))?;

        Ok(format!(
            "Object.defineProperty(navigator, 'webdriver', {{ get: () => false }});\n\
             (() => {{\n\
               const seeds = {seeds_json};\n\
               const mine = seeds[location.origin];\n\
               if (mine) {{\n\
                 for (const [k, v] of Object.entries(mine)) {{\n\
                   try {{ localStorage.setItem(k, v); }} catch (e) {{}}\n\
                 }}\n\
               }}\n\
             }})();"
        ))
    }

    /// Translate snapshot cookies to CDP cookie params
    fn cookie_params(snapshot: &SessionSnapshot) -> Result<Vec<CookieParam>> {
        let mut params = Vec::with_capacity(snapshot.cookies.len());
        for cookie in &snapshot.cookies {
            let mut builder = CookieParam::builder()
                .name(&cookie.name)
                .value(&cookie.value)
                .domain(&cookie.domain)
                .path(&cookie.path)
                .secure(cookie.secure)
                .http_only(cookie.http_only);
            if cookie.expires > 0.0 {
                builder = builder.expires(TimeSinceEpoch::new(cookie.expires));
            }
            if let Some(ref same_site) = cookie.same_site {
                builder = builder.same_site(match same_site.as_str() {
                    "Strict" => CookieSameSite::Strict,
                    "None" => CookieSameSite::None,
                    _ => CookieSameSite::Lax,
                });
            }
            params.push(builder.build().map_err(Error::browser)?);
        }
        Ok(params)
    }

    /// Staging directory Chrome downloads into before the rename to dest
    fn staging_dir() -> PathBuf {
        std::env::temp_dir().join(format!("clearcast-dl-{}", std::process::id()))
    }

    async fn is_present_script(&self, script: &str) -> Result<bool> {
        let page = self.page()?;
        page.evaluate(script)
            .await
            .map_err(|e| Error::browser(e.to_string()))?
            .into_value::<bool>()
            .map_err(|e| Error::browser(e.to_string()))
    }

    /// A presence probe that fails mid-navigation (the execution context is
    /// destroyed while the page redirects) means "not present yet", never an
    /// error: the bounded wait owns the deadline, the engine owns the
    /// classification
    fn presence_or_pending(result: Result<bool>) -> bool {
        match result {
            Ok(present) => present,
            Err(e) => {
                tracing::trace!("presence probe failed, treating as pending: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl AutomationSurface for ChromeSurface {
    async fn open(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let browser_config = BrowserConfig::builder()
            .with_head()
            .window_size(self.config.viewport_width, self.config.viewport_height)
            .arg("--disable-blink-features=AutomationControlled")
            .build()
            .map_err(Error::browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Error::browser(format!("failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::browser(format!("failed to open page: {}", e)))?;

        page.set_user_agent(self.config.user_agent.as_str())
            .await
            .map_err(|e| Error::browser(e.to_string()))?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            Self::init_script(snapshot)?,
        ))
        .await
        .map_err(|e| Error::browser(e.to_string()))?;

        let cookies = Self::cookie_params(snapshot)?;
        if !cookies.is_empty() {
            page.set_cookies(cookies)
                .await
                .map_err(|e| Error::browser(format!("failed to restore cookies: {}", e)))?;
        }

        tracing::debug!(
            cookies = snapshot.cookies.len(),
            origins = snapshot.origins.len(),
            "browser session opened with restored snapshot"
        );

        self.browser = Some(browser);
        self.page = Some(page);
        self.handler_task = Some(handler_task);
        Ok(())
    }

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let parsed = url::Url::parse(url)?;
        tracing::debug!(url = %parsed, "navigating");
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::navigation(url, e.to_string())),
            Err(_) => Err(Error::timeout(
                format!("navigate to {}", url),
                timeout.as_millis() as u64,
            )),
        }
    }

    async fn wait_for(&mut self, control: Control, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let script = Self::presence_script(control);
        loop {
            if Self::presence_or_pending(self.is_present_script(&script).await) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
        }
    }

    async fn is_present(&mut self, control: Control) -> Result<bool> {
        let script = Self::presence_script(control);
        self.is_present_script(&script).await
    }

    async fn current_url(&mut self) -> Result<String> {
        let page = self.page()?;
        page.url()
            .await
            .map_err(|e| Error::browser(e.to_string()))?
            .ok_or_else(|| Error::browser("page has no URL"))
    }

    async fn page_text(&mut self) -> Result<String> {
        let page = self.page()?;
        page.evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| Error::browser(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| Error::browser(e.to_string()))
    }

    async fn click(&mut self, control: Control) -> Result<()> {
        let element = self.find_control(control).await?;
        element
            .click()
            .await
            .map_err(|e| Error::browser(e.to_string()))?;
        Ok(())
    }

    async fn upload_via_chooser(
        &mut self,
        trigger: Control,
        file: &Path,
        timeout: Duration,
    ) -> Result<()> {
        let page = self.page()?.clone();

        page.execute(SetInterceptFileChooserDialogParams::new(true))
            .await
            .map_err(|e| Error::browser(e.to_string()))?;

        // Listener armed strictly before the click that opens the chooser
        let mut chooser_events = page
            .event_listener::<EventFileChooserOpened>()
            .await
            .map_err(|e| Error::browser(e.to_string()))?;

        let trigger_element = self.find_control(trigger).await?;
        trigger_element
            .click()
            .await
            .map_err(|e| Error::browser(e.to_string()))?;

        let event = tokio::time::timeout(timeout, chooser_events.next())
            .await
            .map_err(|_| Error::timeout("file chooser", timeout.as_millis() as u64))?
            .ok_or_else(|| Error::browser("file chooser event stream closed"))?;

        let backend_node_id = event
            .backend_node_id
            .clone()
            .ok_or_else(|| Error::browser("file chooser event carried no input node"))?;

        page.execute(
            SetFileInputFilesParams::builder()
                .file(file.display().to_string())
                .backend_node_id(backend_node_id)
                .build()
                .map_err(Error::browser)?,
        )
        .await
        .map_err(|e| Error::browser(format!("failed to attach file: {}", e)))?;

        page.execute(SetInterceptFileChooserDialogParams::new(false))
            .await
            .map_err(|e| Error::browser(e.to_string()))?;

        Ok(())
    }

    async fn download_via_click(
        &mut self,
        trigger: Control,
        dest: &Path,
        timeout: Duration,
    ) -> Result<()> {
        let page = self.page()?.clone();

        let staging = Self::staging_dir();
        tokio::fs::create_dir_all(&staging).await?;

        // Chrome names the staged file after the download GUID
        page.execute(
            SetDownloadBehaviorParams::builder()
                .behavior(SetDownloadBehaviorBehavior::AllowAndName)
                .download_path(staging.display().to_string())
                .events_enabled(true)
                .build()
                .map_err(Error::browser)?,
        )
        .await
        .map_err(|e| Error::browser(e.to_string()))?;

        // Listener armed strictly before the click that starts the download
        let mut progress_events = page
            .event_listener::<EventDownloadProgress>()
            .await
            .map_err(|e| Error::browser(e.to_string()))?;

        let trigger_element = self.find_control(trigger).await?;
        trigger_element
            .click()
            .await
            .map_err(|e| Error::browser(e.to_string()))?;

        let deadline = Instant::now() + timeout;
        let guid = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::timeout("download", timeout.as_millis() as u64));
            }
            let event = tokio::time::timeout(remaining, progress_events.next())
                .await
                .map_err(|_| Error::timeout("download", timeout.as_millis() as u64))?
                .ok_or_else(|| Error::browser("download event stream closed"))?;

            match event.state.clone() {
                DownloadProgressState::Completed => break event.guid.clone(),
                DownloadProgressState::Canceled => {
                    return Err(Error::browser("download was canceled by the browser"));
                }
                DownloadProgressState::InProgress => {
                    tracing::trace!(
                        received = event.received_bytes,
                        total = event.total_bytes,
                        "download in progress"
                    );
                }
            }
        };

        let staged = staging.join(&guid);
        if tokio::fs::rename(&staged, dest).await.is_err() {
            // Rename fails across filesystems; fall back to copy
            tokio::fs::copy(&staged, dest).await?;
            let _ = tokio::fs::remove_file(&staged).await;
        }
        Ok(())
    }

    async fn capture_screenshot(&mut self, path: &Path) -> Result<()> {
        let page = self.page()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        page.save_screenshot(params, path)
            .await
            .map_err(|e| Error::browser(format!("screenshot failed: {}", e)))?;
        Ok(())
    }

    async fn close(&mut self) {
        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}
