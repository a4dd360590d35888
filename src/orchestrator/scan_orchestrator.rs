//! 多页扫描编排器 - 编排层
//!
//! ## 职责
//!
//! 从 `currentPage + 1` 开始逐页访问订单列表，直到 `maxPages` 或者遇到停止条件：
//!
//! 1. **覆盖检查**：已知订单总数且起始偏移已超过总数时提前结束
//! 2. **进度推送**：每页开始前、完成后各推送一次 `SCAN_UPDATE`
//! 3. **后台加载**：在后台标签打开分页地址，等待 `readyState == "complete"`（有超时）
//! 4. **提取合并**：调用 `PageExtractor`，合并到 `ScanState`
//! 5. **空页停止**：某页没有订单即视为到达末尾
//! 6. **资源释放**：无论成功、失败还是被取代，标签都会在进入下一页前关闭
//!
//! 循环严格串行，`ScanState` 只属于这一次调用。

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{ScanError, ScanResult};
use crate::models::{PageResult, ScanRequest, ScanState};
use crate::protocol::{OutboundEvent, ScanComplete, ScanUpdate};
use crate::services::{EventSink, PageExtractor, ScanTab, TabSource};

/// 编排参数
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// 每页订单数，决定 `startIndex` 的步长
    pub page_size: u32,
    pub load_timeout: Duration,
    pub poll_interval: Duration,
    /// 两页之间的节流间隔
    pub page_delay: Duration,
    /// 单页失败时重试一次
    pub retry_failed_page: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ScanSettings {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size.max(1),
            load_timeout: Duration::from_millis(config.load_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            page_delay: Duration::from_millis(config.page_delay_ms),
            retry_failed_page: config.retry_failed_page,
        }
    }
}

/// 扫描结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 扫完了 maxPages
    MaxPagesReached,
    /// 偏移已覆盖预期的订单总数
    CoverageReached,
    /// 某页没有订单
    EmptyPage,
    /// 单页出错
    PageFailed,
    /// 请求本身不合法，没有访问任何页面
    SetupFailed,
    /// 被新的扫描取代
    Superseded,
}

/// 一次扫描的最终结果
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub state: ScanState,
    /// 最后到达的页码（空页也计入）
    pub total_pages: u32,
    pub stop: StopReason,
    pub error: Option<String>,
}

impl ScanOutcome {
    fn finished(state: ScanState, total_pages: u32, stop: StopReason) -> Self {
        Self {
            state,
            total_pages,
            stop,
            error: None,
        }
    }

    fn failed(state: ScanState, total_pages: u32, stop: StopReason, err: &ScanError) -> Self {
        Self {
            state,
            total_pages,
            stop,
            error: Some(err.to_string()),
        }
    }

    pub fn to_event(&self) -> OutboundEvent {
        OutboundEvent::ScanComplete(ScanComplete::from_state(
            &self.state,
            self.total_pages,
            self.error.clone(),
        ))
    }
}

/// 第 `page_num` 页第一条订单的偏移
pub fn page_offset(page_num: u32, page_size: u32) -> u64 {
    u64::from(page_num.saturating_sub(1)) * u64::from(page_size)
}

/// 构造分页地址：`baseUrl?timeFilter=...&startIndex=...`
pub fn page_url(base: &Url, time_filter: &str, page_num: u32, page_size: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("timeFilter", time_filter)
        .append_pair("startIndex", &page_offset(page_num, page_size).to_string());
    url
}

fn parse_base_url(raw: &str) -> ScanResult<Url> {
    let url = Url::parse(raw).map_err(|source| ScanError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ScanError::InvalidUrl {
            url: raw.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        });
    }
    Ok(url)
}

/// 多页扫描编排器
pub struct ScanOrchestrator<S, E> {
    tabs: S,
    extractor: E,
    settings: ScanSettings,
}

impl<S, E> ScanOrchestrator<S, E>
where
    S: TabSource,
    E: PageExtractor,
{
    pub fn new(tabs: S, extractor: E, settings: ScanSettings) -> Self {
        Self {
            tabs,
            extractor,
            settings,
        }
    }

    /// 执行一次完整扫描
    ///
    /// 过程中推送零个或多个 `SCAN_UPDATE`，结束时恰好推送一个 `SCAN_COMPLETE`。
    /// 错误不会向外抛出，而是折叠进最终结果的 `error` 字段。
    pub async fn run_scan(
        &self,
        request: ScanRequest,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> ScanOutcome {
        let outcome = self.drive(&request, sink, cancel).await;
        log_outcome(&outcome);
        sink.deliver(outcome.to_event()).await;
        outcome
    }

    async fn drive(
        &self,
        request: &ScanRequest,
        sink: &EventSink,
        cancel: &CancellationToken,
    ) -> ScanOutcome {
        let mut state = ScanState::from_request(request);

        let base = match request
            .validate()
            .and_then(|_| parse_base_url(&request.base_url))
        {
            Ok(base) => base,
            Err(e) => {
                error!("❌ 扫描请求无效: {}", e);
                return ScanOutcome::failed(state, request.current_page, StopReason::SetupFailed, &e);
            }
        };

        info!(
            "🚀 开始多页扫描: 第 {} 页之后，最多到第 {} 页 (timeFilter={})",
            request.current_page, request.max_pages, request.time_filter
        );

        let page_size = self.settings.page_size;

        // 页码不超过 maxPages，不会溢出
        for page_num in (request.current_page..request.max_pages).map(|p| p + 1) {
            if cancel.is_cancelled() {
                let total_pages = state.page_num;
                return ScanOutcome::failed(state, total_pages, StopReason::Superseded, &ScanError::Superseded);
            }

            if let Some(expected) = request.expected_total_orders {
                if page_offset(page_num, page_size) >= expected {
                    info!("✓ 已覆盖全部 {} 个订单，不再访问第 {} 页", expected, page_num);
                    let total_pages = state.page_num;
                    return ScanOutcome::finished(state, total_pages, StopReason::CoverageReached);
                }
            }

            sink.deliver(OutboundEvent::ScanUpdate(ScanUpdate::from_state(
                &state,
                format!("Navigating to page {}...", page_num),
                page_num,
            )))
            .await;

            let url = page_url(&base, &request.time_filter, page_num, page_size);
            match self.scan_page_with_retry(url.as_str(), page_num, cancel).await {
                Ok(page) => {
                    state.absorb(page_num, &page);
                    info!(
                        "✓ 第 {} 页: {} 个订单 ${:.2}，累计 {} 个 ${:.2}",
                        page_num, page.count, page.total, state.total_order_count, state.total_amount
                    );
                    sink.deliver(OutboundEvent::ScanUpdate(ScanUpdate::from_state(
                        &state,
                        format!("Page {} complete", page_num),
                        page_num,
                    )))
                    .await;

                    if page.is_empty() {
                        info!("第 {} 页没有订单，视为已到末尾", page_num);
                        return ScanOutcome::finished(state, page_num, StopReason::EmptyPage);
                    }
                }
                Err(ScanError::Superseded) => {
                    let total_pages = state.page_num;
                    return ScanOutcome::failed(state, total_pages, StopReason::Superseded, &ScanError::Superseded);
                }
                Err(e) => {
                    error!("❌ 第 {} 页失败: {}", page_num, e);
                    sink.deliver(OutboundEvent::ScanUpdate(ScanUpdate::from_state(
                        &state,
                        format!("Error: {}", e),
                        page_num,
                    )))
                    .await;
                    let total_pages = state.page_num;
                    return ScanOutcome::failed(state, total_pages, StopReason::PageFailed, &e);
                }
            }

            if page_num < request.max_pages {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let total_pages = state.page_num;
                        return ScanOutcome::failed(state, total_pages, StopReason::Superseded, &ScanError::Superseded);
                    }
                    _ = sleep(self.settings.page_delay) => {}
                }
            }
        }

        let total_pages = state.page_num;
        ScanOutcome::finished(state, total_pages, StopReason::MaxPagesReached)
    }

    async fn scan_page_with_retry(
        &self,
        url: &str,
        page_num: u32,
        cancel: &CancellationToken,
    ) -> ScanResult<PageResult> {
        match self.scan_page(url, page_num, cancel).await {
            Err(e) if self.settings.retry_failed_page && e.is_page_error() => {
                warn!("⚠️ 第 {} 页失败 ({})，重试一次", page_num, e);
                self.scan_page(url, page_num, cancel).await
            }
            other => other,
        }
    }

    /// 打开、等待、提取、关闭
    async fn scan_page(
        &self,
        url: &str,
        page_num: u32,
        cancel: &CancellationToken,
    ) -> ScanResult<PageResult> {
        debug!("打开第 {} 页: {}", page_num, url);
        let tab = self.tabs.open(url).await?;

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ScanError::Superseded),
            r = self.load_and_extract(&tab) => r,
        };

        if let Err(e) = tab.close().await {
            warn!("⚠️ 关闭第 {} 页标签失败: {}", page_num, e);
        }
        result
    }

    async fn load_and_extract(&self, tab: &S::Tab) -> ScanResult<PageResult> {
        self.wait_for_load(tab).await?;
        self.extractor.extract(tab).await
    }

    /// 轮询 readyState，直到 complete 或超时
    async fn wait_for_load(&self, tab: &S::Tab) -> ScanResult<()> {
        let poll = async {
            loop {
                match tab.ready_state().await {
                    Ok(state) if state == "complete" => return,
                    Ok(state) => debug!("{} readyState = {}", tab.url(), state),
                    // 导航切换文档时执行上下文可能暂时不可用
                    Err(e) => debug!("{} readyState 读取失败: {}", tab.url(), e),
                }
                sleep(self.settings.poll_interval).await;
            }
        };

        tokio::time::timeout(self.settings.load_timeout, poll)
            .await
            .map_err(|_| ScanError::LoadTimeout {
                url: tab.url().to_string(),
                timeout_ms: self.settings.load_timeout.as_millis() as u64,
            })
    }
}

fn log_outcome(outcome: &ScanOutcome) {
    info!("{}", "=".repeat(60));
    info!(
        "📊 扫描结束 ({:?}): {} 个订单, ${:.2}, 共 {} 页",
        outcome.stop, outcome.state.total_order_count, outcome.state.total_amount, outcome.total_pages
    );
    if let Some(err) = &outcome.error {
        warn!("⚠️ 结束原因: {}", err);
    }
    info!("{}", "=".repeat(60));
}
