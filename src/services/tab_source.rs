//! 后台标签页 - 业务能力层
//!
//! 编排层只通过 [`TabSource`] / [`ScanTab`] 使用标签页，测试中可以替换成
//! 不依赖浏览器的实现。

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::target::CreateTargetParams;
use chromiumoxide::{Browser, Page};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{ScanError, ScanResult};
use crate::infrastructure::JsExecutor;

/// 一个已打开的页面
#[async_trait]
pub trait ScanTab: Send + Sync {
    /// 打开时请求的地址
    fn url(&self) -> &str;

    /// `document.readyState`
    async fn ready_state(&self) -> ScanResult<String>;

    /// 在页面中执行脚本
    async fn evaluate(&self, script: &str) -> ScanResult<JsonValue>;

    /// 释放标签页
    async fn close(&self) -> ScanResult<()>;
}

/// 打开后台标签页的能力
#[async_trait]
pub trait TabSource: Send + Sync {
    type Tab: ScanTab + 'static;

    async fn open(&self, url: &str) -> ScanResult<Self::Tab>;
}

/// 基于 chromiumoxide 的标签页来源
pub struct ChromeTabSource {
    browser: Arc<Browser>,
}

impl ChromeTabSource {
    pub fn new(browser: Arc<Browser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl TabSource for ChromeTabSource {
    type Tab = ChromeTab;

    async fn open(&self, url: &str) -> ScanResult<ChromeTab> {
        // 后台打开，不抢占用户当前的标签
        let params = CreateTargetParams::builder()
            .url(url)
            .background(true)
            .build()
            .map_err(|reason| ScanError::TabOpenFailed {
                url: url.to_string(),
                reason,
            })?;

        let page = self
            .browser
            .new_page(params)
            .await
            .map_err(|e| ScanError::TabOpenFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        debug!("已打开后台标签: {}", url);

        Ok(ChromeTab::attach(page, url))
    }
}

/// chromiumoxide 页面
pub struct ChromeTab {
    url: String,
    executor: JsExecutor,
}

impl ChromeTab {
    /// 包装一个已存在的页面（例如用户当前的订单页）
    pub fn attach(page: Page, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            executor: JsExecutor::new(page),
        }
    }
}

#[async_trait]
impl ScanTab for ChromeTab {
    fn url(&self) -> &str {
        &self.url
    }

    async fn ready_state(&self) -> ScanResult<String> {
        self.executor.ready_state().await
    }

    async fn evaluate(&self, script: &str) -> ScanResult<JsonValue> {
        self.executor.eval(script).await
    }

    async fn close(&self) -> ScanResult<()> {
        self.executor.close().await?;
        debug!("已关闭后台标签: {}", self.url);
        Ok(())
    }
}
