use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 配置文件的默认路径
pub const DEFAULT_CONFIG_FILE: &str = "order_tally.toml";

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自行启动无头浏览器（否则连接已打开的浏览器）
    pub headless: bool,
    /// 无头模式下使用的浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 订单历史页面
    pub orders_url: String,
    /// 最多扫描的页数
    pub max_pages: u32,
    /// 每页订单数（分页步长）
    pub page_size: u32,
    /// 单页加载超时（毫秒）
    pub load_timeout_ms: u64,
    /// 轮询 readyState 的间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 两页之间的间隔（毫秒）
    pub page_delay_ms: u64,
    /// 进度事件投递超时（毫秒）
    pub delivery_timeout_ms: u64,
    /// 单页失败时是否重试一次
    pub retry_failed_page: bool,
    /// 是否绘制月度柱状图
    pub show_chart: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 扫描结果 JSON 报告
    pub report_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            orders_url: "https://www.amazon.com/your-orders/orders".to_string(),
            max_pages: 20,
            page_size: 10,
            load_timeout_ms: 30_000,
            poll_interval_ms: 250,
            page_delay_ms: 1_000,
            delivery_timeout_ms: 1_000,
            retry_failed_page: false,
            show_chart: true,
            verbose_logging: false,
            output_log_file: "scan_log.txt".to_string(),
            report_file: Some("scan_report.json".to_string()),
        }
    }
}

impl Config {
    /// 加载配置：配置文件存在则先读取，再用环境变量覆盖
    pub fn load() -> Result<Self> {
        let path = std::env::var("ORDER_TALLY_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(Path::new(&path))?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    /// 仅从环境变量读取（缺省项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(self.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            orders_url: std::env::var("ORDERS_URL").unwrap_or(self.orders_url),
            max_pages: env_parse("MAX_PAGES").unwrap_or(self.max_pages),
            page_size: env_parse("PAGE_SIZE").unwrap_or(self.page_size),
            load_timeout_ms: env_parse("LOAD_TIMEOUT_MS").unwrap_or(self.load_timeout_ms),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS").unwrap_or(self.poll_interval_ms),
            page_delay_ms: env_parse("PAGE_DELAY_MS").unwrap_or(self.page_delay_ms),
            delivery_timeout_ms: env_parse("DELIVERY_TIMEOUT_MS").unwrap_or(self.delivery_timeout_ms),
            retry_failed_page: env_parse("RETRY_FAILED_PAGE").unwrap_or(self.retry_failed_page),
            show_chart: env_parse("SHOW_CHART").unwrap_or(self.show_chart),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            report_file: std::env::var("REPORT_FILE").ok().or(self.report_file),
        }
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
