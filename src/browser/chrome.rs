//! Chromium page driven over the DevTools protocol
//!
//! Every request the page issues is paused by the Fetch domain and answered
//! by a background task: fulfilled from the fixture table when a fixture
//! matches, continued to the network otherwise.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FulfillRequestParams, HeaderEntry,
    RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    EvaluateParams, EventConsoleApiCalled, EventExceptionThrown, RemoteObject,
};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::common::config::Viewport;
use crate::common::{Error, Result};
use crate::fixture::FixtureTable;

use super::locator::{Locator, ResolverOp, ResolverReply};
use super::{BrowserPage, Probe};

/// Everything needed to start a browser for one scenario
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub no_sandbox: bool,
    pub args: Vec<String>,
    pub viewport: Viewport,
    pub launch_timeout: Duration,
    /// Evaluated in every new document before the page's own scripts
    pub init_scripts: Vec<String>,
    /// Log browser console messages and uncaught page errors
    pub capture_console: bool,
}

/// A Chromium process with one page
pub struct ChromePage {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl ChromePage {
    /// Launch Chromium, open a page and install request interception
    pub async fn launch(options: &LaunchOptions, table: Arc<FixtureTable>) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport.width, options.viewport.height);
        if !options.headless {
            builder = builder.with_head();
        }
        if options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &options.args {
            builder = builder.arg(arg.clone());
        }
        let config = builder.build().map_err(Error::Launch)?;

        let (browser, mut handler) =
            match tokio::time::timeout(options.launch_timeout, Browser::launch(config)).await {
                Ok(Ok(launched)) => launched,
                Ok(Err(e)) => return Err(Error::Launch(e.to_string())),
                Err(_) => {
                    return Err(Error::Launch(format!(
                        "browser did not start within {}s",
                        options.launch_timeout.as_secs()
                    )))
                }
            };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser connection event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                handler.abort();
                return Err(Error::Launch(format!("could not open a page: {}", e)));
            }
        };

        let mut chrome = Self {
            browser: Some(browser),
            page,
            handler,
            tasks: Vec::new(),
        };
        if let Err(e) = chrome.install(options, table).await {
            let _ = chrome.close().await;
            return Err(e);
        }

        tracing::info!(
            headless = options.headless,
            width = options.viewport.width,
            height = options.viewport.height,
            "Browser launched"
        );
        Ok(chrome)
    }

    async fn install(&mut self, options: &LaunchOptions, table: Arc<FixtureTable>) -> Result<()> {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(options.viewport.width))
            .height(i64::from(options.viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(Error::Browser)?;
        self.page.execute(metrics).await.map_err(Error::browser)?;

        for script in &options.init_scripts {
            self.page
                .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
                    script.clone(),
                ))
                .await
                .map_err(Error::browser)?;
        }

        if options.capture_console {
            self.capture_console().await?;
        }

        // Subscribe before enabling so no paused request is missed
        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(Error::browser)?;
        self.page
            .execute(
                EnableParams::builder()
                    .pattern(RequestPattern::builder().url_pattern("*").build())
                    .build(),
            )
            .await
            .map_err(Error::browser)?;

        let page = self.page.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                if let Err(e) = answer_request(&page, &table, &event).await {
                    tracing::warn!(
                        url = %event.request.url,
                        error = %e,
                        "Failed to answer intercepted request"
                    );
                }
            }
        }));

        Ok(())
    }

    async fn capture_console(&mut self) -> Result<()> {
        let mut console = self
            .page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(Error::browser)?;
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = console.next().await {
                let text: Vec<String> = event.args.iter().map(remote_object_text).collect();
                tracing::info!(
                    target: "uiscenario::console",
                    kind = ?event.r#type,
                    "{}",
                    text.join(" ")
                );
            }
        }));

        let mut exceptions = self
            .page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(Error::browser)?;
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                tracing::warn!(target: "uiscenario::console", "Page error: {}", message);
            }
        }));

        Ok(())
    }

    async fn eval_value(&self, script: &str) -> Result<Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(Error::Browser)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(Error::browser)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn resolve(
        &self,
        locator: &Locator,
        op: ResolverOp,
        arg: Option<&str>,
    ) -> Result<ResolverReply> {
        let value = self.eval_value(&locator.script(op, arg)).await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Browser(format!("Unexpected resolver reply for {}: {}", locator, e)))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.browser.is_some() {
            Ok(())
        } else {
            Err(Error::SessionClosed)
        }
    }
}

/// Fulfill a paused request from the table or let it continue
async fn answer_request(
    page: &Page,
    table: &FixtureTable,
    event: &EventRequestPaused,
) -> Result<()> {
    let method = event.request.method.as_str();
    let url = event.request.url.as_str();
    let resolution = table.resolve(method, url);

    match resolution.response() {
        Some(response) => {
            tracing::debug!(
                method,
                url,
                version = ?resolution.version(),
                status = response.status,
                "Fulfilling request from fixture"
            );
            let headers: Vec<HeaderEntry> = response
                .header_list()
                .into_iter()
                .map(|(name, value)| HeaderEntry::new(name, value))
                .collect();
            let params = FulfillRequestParams::builder()
                .request_id(event.request_id.clone())
                .response_code(i64::from(response.status))
                .response_headers(headers)
                .body(response.body_base64()?)
                .build()
                .map_err(Error::Browser)?;
            page.execute(params).await.map_err(Error::browser)?;
        }
        None => {
            tracing::debug!(method, url, version = ?resolution.version(), "Continuing request");
            page.execute(ContinueRequestParams::new(event.request_id.clone()))
                .await
                .map_err(Error::browser)?;
        }
    }
    Ok(())
}

fn remote_object_text(object: &RemoteObject) -> String {
    match &object.value {
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
        None => object.description.clone().unwrap_or_default(),
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::navigation(url, e)),
            Err(_) => Err(Error::navigation(
                url,
                format!("no load event within {}ms", timeout.as_millis()),
            )),
        }
    }

    async fn reload(&mut self, timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        let url = self.current_url().await?;
        match tokio::time::timeout(timeout, self.page.reload()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(Error::navigation(&url, e)),
            Err(_) => Err(Error::navigation(
                &url,
                format!("reload did not finish within {}ms", timeout.as_millis()),
            )),
        }
    }

    async fn probe(&mut self, locator: &Locator) -> Result<Probe> {
        self.ensure_open()?;
        let reply = self.resolve(locator, ResolverOp::Probe, None).await?;
        Ok(Probe {
            count: reply.count,
            visible: reply.visible,
        })
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        self.ensure_open()?;
        let reply = self.resolve(locator, ResolverOp::Point, None).await?;
        let (x, y) = match (reply.count, reply.x, reply.y) {
            (1, Some(x), Some(y)) => (x, y),
            (count, _, _) => {
                return Err(Error::ElementNotFound {
                    locator: locator.to_string(),
                    count,
                })
            }
        };
        tracing::debug!(%locator, x, y, "Click");
        self.page
            .click(Point { x, y })
            .await
            .map_err(Error::browser)?;
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<()> {
        self.ensure_open()?;
        let reply = self.resolve(locator, ResolverOp::Fill, Some(value)).await?;
        if reply.count != 1 {
            return Err(Error::ElementNotFound {
                locator: locator.to_string(),
                count: reply.count,
            });
        }
        if let Some(reason) = reply.error {
            return Err(Error::Browser(format!("Cannot fill {}: {}", locator, reason)));
        }
        Ok(())
    }

    async fn click_at(&mut self, x: f64, y: f64) -> Result<()> {
        self.ensure_open()?;
        self.page
            .click(Point { x, y })
            .await
            .map_err(Error::browser)?;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        self.ensure_open()?;
        self.eval_value(script).await
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(Error::browser)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(Error::browser)
    }

    async fn current_url(&mut self) -> Result<String> {
        self.ensure_open()?;
        Ok(self
            .page
            .url()
            .await
            .map_err(Error::browser)?
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::debug!(error = %e, "Failed to reap browser process");
        }
        self.handler.abort();
        tracing::info!("Browser closed");
        closed.map(|_| ()).map_err(Error::browser)
    }
}
