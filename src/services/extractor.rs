//! 页面提取策略 - 业务能力层
//!
//! 编排层只依赖 [`PageExtractor`]，网站结构变化时只需要替换策略。

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ScanError, ScanResult};
use crate::models::PageResult;
use crate::services::order_parser::{OrderBlock, OrderParser};
use crate::services::tab_source::ScanTab;
use crate::utils::logging::truncate_text;

/// 注入页面的订单容器收集脚本
pub const COLLECT_ORDERS_JS: &str = include_str!("../../assets/collect_orders.js");

/// 从一个已加载完成的页面中提取订单汇总
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, tab: &dyn ScanTab) -> ScanResult<PageResult>;
}

/// 默认策略：脚本收集订单容器文字，Rust 侧解析
pub struct DomOrderExtractor {
    parser: OrderParser,
    script: String,
}

impl DomOrderExtractor {
    pub fn new() -> Self {
        Self::with_script(COLLECT_ORDERS_JS)
    }

    /// 使用自定义收集脚本（脚本需返回 `[{text, totalText}]`）
    pub fn with_script(script: impl Into<String>) -> Self {
        Self {
            parser: OrderParser::new(),
            script: script.into(),
        }
    }
}

impl Default for DomOrderExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageExtractor for DomOrderExtractor {
    async fn extract(&self, tab: &dyn ScanTab) -> ScanResult<PageResult> {
        let raw = tab.evaluate(&self.script).await?;
        let blocks: Vec<OrderBlock> = serde_json::from_value(raw).map_err(|e| {
            ScanError::Extraction(format!("collector returned unexpected data: {}", e))
        })?;
        debug!("{} 收集到 {} 个订单容器", tab.url(), blocks.len());
        if let Some(first) = blocks.first() {
            debug!("首个容器: {}", truncate_text(&first.text, 80));
        }

        let (result, _stats) = self.parser.parse(&blocks);
        Ok(result)
    }
}
