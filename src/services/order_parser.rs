//! 订单文本解析 - 业务能力层
//!
//! 页面脚本只负责把订单容器的文字收集回来，金额、日期和"是否真的是订单"
//! 的判断都在这里完成。

use std::collections::HashSet;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::models::{MonthKey, PageResult};

const MONEY_PATTERN: &str = r"\$(\d{1,3}(?:,\d{3})+\.\d{2}|\d+\.\d{2})";
const DATE_PATTERN: &str =
    r"(?i)\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+(\d{1,2}),?\s+(20\d{2})\b";
const ORDER_MARKERS: [&str; 3] = ["Order placed", "Order #", "Ordered"];

/// 页面脚本收集到的一个订单容器
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBlock {
    /// 容器的全部文字
    pub text: String,
    /// 专门的"总计"元素的文字（如果找到了）
    #[serde(default)]
    pub total_text: Option<String>,
}

/// 跳过原因计数
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SkipCounts {
    pub no_money: usize,
    pub duplicate_amount: usize,
    pub too_small: usize,
    pub no_order_text: usize,
    pub no_month: usize,
}

/// 单页解析统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseStats {
    pub blocks: usize,
    pub with_money: usize,
    pub with_order_text: usize,
    pub with_month: usize,
    pub accepted: usize,
    pub skipped: SkipCounts,
}

pub struct OrderParser {
    money: Regex,
    date: Regex,
}

impl OrderParser {
    pub fn new() -> Self {
        Self {
            money: Regex::new(MONEY_PATTERN).expect("money pattern is valid"),
            date: Regex::new(DATE_PATTERN).expect("date pattern is valid"),
        }
    }

    /// 解析一页的订单容器
    ///
    /// 同一页内金额相同的容器只计一次（外层容器会重复包含内层的文字）。
    pub fn parse(&self, blocks: &[OrderBlock]) -> (PageResult, ParseStats) {
        let mut result = PageResult::default();
        let mut stats = ParseStats {
            blocks: blocks.len(),
            ..Default::default()
        };
        let mut seen_cents: HashSet<i64> = HashSet::new();

        for block in blocks {
            let Some(amount) = self.order_amount(block) else {
                stats.skipped.no_money += 1;
                continue;
            };
            stats.with_money += 1;

            if amount < 0.01 {
                stats.skipped.too_small += 1;
                continue;
            }
            let cents = (amount * 100.0).round() as i64;
            if seen_cents.contains(&cents) {
                stats.skipped.duplicate_amount += 1;
                continue;
            }

            let has_order_text = ORDER_MARKERS.iter().any(|m| block.text.contains(m));
            let month = self.order_month(&block.text);
            if has_order_text {
                stats.with_order_text += 1;
            } else {
                stats.skipped.no_order_text += 1;
            }
            if month.is_some() {
                stats.with_month += 1;
            } else {
                stats.skipped.no_month += 1;
            }

            let Some(month) = month.filter(|_| has_order_text) else {
                debug!("❌ 跳过 ${:.2}", amount);
                continue;
            };

            seen_cents.insert(cents);
            result.total += amount;
            result.count += 1;
            result.monthly_data.record(&month, amount);
            stats.accepted += 1;
            debug!("✅ 订单 ${:.2} → {}", amount, month);
        }

        debug!(
            "解析统计: 容器 {}, 含金额 {}, 含订单字样 {}, 含日期 {}, 通过 {}, 跳过 {:?}",
            stats.blocks,
            stats.with_money,
            stats.with_order_text,
            stats.with_month,
            stats.accepted,
            stats.skipped
        );

        (result, stats)
    }

    /// 总计元素里的金额优先，否则取容器文字中最大的金额
    fn order_amount(&self, block: &OrderBlock) -> Option<f64> {
        if let Some(amount) = block
            .total_text
            .as_deref()
            .and_then(|t| self.amounts(t).next())
        {
            return Some(amount);
        }
        self.amounts(&block.text).reduce(f64::max)
    }

    fn amounts<'a>(&'a self, text: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.money
            .captures_iter(text)
            .filter_map(|c| c[1].replace(',', "").parse::<f64>().ok())
    }

    fn order_month(&self, text: &str) -> Option<MonthKey> {
        let caps = self.date.captures(text)?;
        let year: i32 = caps[3].parse().ok()?;
        MonthKey::from_parts(&caps[1], year)
    }
}

impl Default for OrderParser {
    fn default() -> Self {
        Self::new()
    }
}
