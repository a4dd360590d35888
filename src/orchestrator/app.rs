//! 应用入口 - 编排层
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、连接（或启动）浏览器、定位订单页
//! 2. **第一页**：在用户当前的订单页上直接提取，作为扫描的种子
//! 3. **后台扫描**：通过 `ScanService` 发出 `START_SCAN`
//! 4. **面板输出**：消费进度事件，刷新面板并写入日志
//! 5. **结果报告**：把最终的 `SCAN_COMPLETE` 写成 JSON

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chromiumoxide::{Browser, Page};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser;
use crate::config::Config;
use crate::models::{PageResult, ScanRequest};
use crate::orchestrator::scan_orchestrator::{ScanOrchestrator, ScanSettings};
use crate::orchestrator::scan_service::ScanService;
use crate::protocol::{InboundMessage, OutboundEvent, Reply, ScanComplete};
use crate::report::Panel;
use crate::services::{ChromeTab, ChromeTabSource, DomOrderExtractor, EventSink, PageExtractor};
use crate::utils::logging;

/// 事件通道容量
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// 应用主结构
pub struct App {
    config: Config,
    browser: Arc<Browser>,
    orders_page: Page,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let (browser, page) = if config.headless {
            browser::launch_headless_browser(&config.orders_url, config.chrome_executable.as_deref())
                .await?
        } else {
            let fragment = orders_path(&config.orders_url);
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                &config.orders_url,
                fragment.as_deref(),
            )
            .await?
        };

        Ok(Self {
            config,
            browser: Arc::new(browser),
            orders_page: page,
        })
    }

    /// 扫描当前订单页及后续分页，返回最终结果
    pub async fn run(&self) -> Result<ScanComplete> {
        let current_url = self
            .orders_page
            .url()
            .await?
            .unwrap_or_else(|| self.config.orders_url.clone());
        info!("📄 当前订单页: {}", current_url);

        let extractor = DomOrderExtractor::new();
        let first_tab = ChromeTab::attach(self.orders_page.clone(), current_url.clone());
        let first_page = extractor
            .extract(&first_tab)
            .await
            .context("第一页订单提取失败")?;
        info!(
            "✓ 第 1 页: {} 个订单, ${:.2}",
            first_page.count, first_page.total
        );

        let request = build_request(&current_url, &first_page, self.config.max_pages)?;

        let orchestrator = ScanOrchestrator::new(
            ChromeTabSource::new(Arc::clone(&self.browser)),
            extractor,
            ScanSettings::from(&self.config),
        );
        let service = ScanService::new(orchestrator);
        let (sink, mut events) = EventSink::channel(EVENT_CHANNEL_CAPACITY, self.config.delivery_timeout());

        if let Reply::Pong { timestamp, .. } = service.ping() {
            debug!("后台扫描服务在线 (ts={})", timestamp);
        }

        let mut panel = Panel::new(self.config.show_chart);
        panel.begin(&request);
        self.show(&panel);

        match service.handle(InboundMessage::StartScan(request), Some(sink)) {
            Reply::Ack { accepted: true } => {}
            other => bail!("扫描请求未被受理: {:?}", other),
        }

        while let Some(event) = events.recv().await {
            panel.apply(&event);
            self.show(&panel);

            if let OutboundEvent::ScanComplete(done) = event {
                self.write_report(&done).await?;
                return Ok(done);
            }
        }

        // 结果不完整，不再展示
        panel.clear();
        self.show(&panel);
        bail!("扫描任务意外结束，没有收到 SCAN_COMPLETE")
    }

    fn show(&self, panel: &Panel) {
        let text = panel.render();
        for line in text.lines() {
            info!("{}", line);
        }
        if let Err(e) = logging::append_log(&self.config.output_log_file, &text) {
            warn!("⚠️ 写入日志文件失败: {}", e);
        }
    }

    async fn write_report(&self, done: &ScanComplete) -> Result<()> {
        let Some(path) = &self.config.report_file else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&OutboundEvent::ScanComplete(done.clone()))?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("无法写入报告: {}", path))?;
        info!("\n报告已保存至: {}", path);
        Ok(())
    }
}

/// 由当前页地址和第一页结果构造扫描请求
///
/// `baseUrl` 为 origin + path；`timeFilter` 取自查询参数，缺省为 `all`。
pub fn build_request(current_url: &str, first_page: &PageResult, max_pages: u32) -> Result<ScanRequest> {
    let url = Url::parse(current_url).with_context(|| format!("无法解析订单页地址: {}", current_url))?;

    let time_filter = url
        .query_pairs()
        .find(|(k, _)| k == "timeFilter")
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| "all".to_string());

    let mut base = url;
    base.set_query(None);
    base.set_fragment(None);

    Ok(ScanRequest {
        total_amount: first_page.total,
        total_order_count: first_page.count,
        monthly_data: first_page.monthly_data.clone(),
        current_page: 1,
        expected_total_orders: None,
        max_pages: max_pages.max(1),
        base_url: base.to_string(),
        time_filter,
    })
}

/// 订单页路径，用于在已打开的标签中查找
fn orders_path(orders_url: &str) -> Option<String> {
    Url::parse(orders_url).ok().map(|u| u.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthBucket;

    #[test]
    fn test_build_request_from_current_url() {
        let first = PageResult {
            total: 50.0,
            count: 2,
            monthly_data: [("Jan 2024".to_string(), MonthBucket::new(50.0, 2))]
                .into_iter()
                .collect(),
        };
        let request = build_request(
            "https://www.example.com/your-orders/orders?timeFilter=year-2024&ref_=nav#top",
            &first,
            20,
        )
        .unwrap();

        assert_eq!(request.base_url, "https://www.example.com/your-orders/orders");
        assert_eq!(request.time_filter, "year-2024");
        assert_eq!(request.current_page, 1);
        assert_eq!(request.total_order_count, 2);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_build_request_defaults_time_filter() {
        let request =
            build_request("https://www.example.com/orders", &PageResult::default(), 0).unwrap();
        assert_eq!(request.time_filter, "all");
        assert_eq!(request.max_pages, 1);
    }

    #[test]
    fn test_orders_path() {
        assert_eq!(
            orders_path("https://www.amazon.com/your-orders/orders").as_deref(),
            Some("/your-orders/orders")
        );
        assert_eq!(orders_path("::"), None);
    }
}
