//! Browser launch settings and the CDP-backed driver.
//!
//! With the `browser` feature, [`ChromiumDriver`] controls a real Chromium
//! over the Chrome DevTools Protocol via chromiumoxide. Without it only the
//! configuration type is available and tests run against
//! [`crate::MockDriver`].

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1000,
            viewport_height: 660,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{BrowserDriver, ElementHandle, SelectorEngine};
    use crate::locator::{handle_css, resolve_handle_js, Selector};
    use crate::result::{E2eError, E2eResult};
    use async_trait::async_trait;
    use base64::Engine;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::element::Element;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;

    fn cdp_err(e: impl std::fmt::Display) -> E2eError {
        E2eError::driver(e.to_string())
    }

    /// Driver backed by a real Chromium over CDP
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: CdpBrowser,
        page: CdpPage,
        handler: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        pub async fn launch(config: &BrowserConfig) -> E2eResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage");

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| E2eError::BrowserLaunch { message })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| E2eError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        tracing::debug!("CDP handler loop ended");
                        break;
                    }
                }
            });

            let page = browser.new_page("about:blank").await.map_err(cdp_err)?;
            tracing::info!(
                headless = config.headless,
                width = config.viewport_width,
                height = config.viewport_height,
                "chromium launched"
            );

            Ok(Self {
                browser,
                page,
                handler,
            })
        }

        async fn eval<T: DeserializeOwned>(&self, js: String) -> E2eResult<Option<T>> {
            let result = self.page.evaluate(js).await.map_err(cdp_err)?;
            match result.value() {
                None | Some(serde_json::Value::Null) => Ok(None),
                Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            }
        }

        async fn element(&self, handle: &ElementHandle) -> E2eResult<Element> {
            self.page
                .find_element(handle_css(&handle.id))
                .await
                .map_err(|e| E2eError::interaction(format!("element {} is detached: {e}", handle.id)))
        }
    }

    #[async_trait]
    impl SelectorEngine for ChromiumDriver {
        async fn query(&mut self, selector: &Selector) -> E2eResult<Option<ElementHandle>> {
            self.eval(selector.to_locate_js()).await
        }

        async fn count(&mut self, selector: &Selector) -> E2eResult<usize> {
            Ok(self.eval(selector.to_count_js()).await?.unwrap_or(0))
        }

        async fn resolve(&mut self, handle: &ElementHandle) -> E2eResult<Option<ElementHandle>> {
            self.eval(resolve_handle_js(&handle.id)).await
        }
    }

    #[async_trait]
    impl BrowserDriver for ChromiumDriver {
        async fn navigate(&mut self, url: &str) -> E2eResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| E2eError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn click(&mut self, handle: &ElementHandle) -> E2eResult<()> {
            let element = self.element(handle).await?;
            element
                .click()
                .await
                .map_err(|e| E2eError::interaction(format!("click on <{}> failed: {e}", handle.tag)))?;
            Ok(())
        }

        async fn type_text(&mut self, handle: &ElementHandle, text: &str) -> E2eResult<()> {
            let element = self.element(handle).await?;
            element
                .click()
                .await
                .map_err(|e| E2eError::interaction(format!("focus on <{}> failed: {e}", handle.tag)))?;
            element
                .type_str(text)
                .await
                .map_err(|e| E2eError::interaction(format!("typing into <{}> failed: {e}", handle.tag)))?;
            Ok(())
        }

        async fn screenshot(&mut self) -> E2eResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let screenshot = self.page.execute(params).await.map_err(cdp_err)?;

            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(cdp_err)
        }

        async fn current_url(&mut self) -> E2eResult<String> {
            Ok(self
                .page
                .url()
                .await
                .map_err(cdp_err)?
                .unwrap_or_default())
        }

        async fn close(&mut self) -> E2eResult<()> {
            let closed = self.browser.close().await.map_err(cdp_err);
            self.handler.abort();
            closed.map(|_| ())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let config = BrowserConfig::default();
        assert_eq!((config.viewport_width, config.viewport_height), (1000, 660));
        assert!(config.headless);
        assert!(config.sandbox);
    }

    #[test]
    fn test_builders() {
        let config = BrowserConfig::default()
            .with_headless(false)
            .with_viewport(1280, 720)
            .with_chromium_path("/usr/bin/chromium")
            .with_no_sandbox();
        assert!(!config.headless);
        assert_eq!(config.viewport_width, 1280);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        assert!(!config.sandbox);
    }

    #[test]
    fn test_yaml_defaults() {
        let config: BrowserConfig = serde_yaml_ng::from_str("sandbox: false\n").unwrap();
        assert!(!config.sandbox);
        assert!(config.headless);
        assert_eq!(config.viewport_height, 660);
    }
}
