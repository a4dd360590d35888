//! 请求方与后台扫描之间的消息格式
//!
//! 所有消息都是 `{"type": ..., "data": ...}` 形式的 JSON。

use serde::{Deserialize, Serialize};

use crate::models::{MonthlyMap, ScanRequest, ScanState};

/// 请求方 → 后台
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// 存活探测
    Ping,
    /// 开始多页扫描
    #[serde(alias = "START_TAB_SCAN")]
    StartScan(ScanRequest),
}

/// 后台对请求的即时应答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Ack { accepted: bool },
    Pong { ok: bool, timestamp: i64 },
}

/// 后台 → 请求方
///
/// 一次扫描先发出零个或多个 `SCAN_UPDATE`，最后恰好一个 `SCAN_COMPLETE`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundEvent {
    ScanUpdate(ScanUpdate),
    ScanComplete(ScanComplete),
}

impl OutboundEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, OutboundEvent::ScanComplete(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanUpdate {
    pub total_amount: f64,
    pub total_order_count: u64,
    pub monthly_data: MonthlyMap,
    pub status: String,
    pub current_page: u32,
}

impl ScanUpdate {
    pub fn from_state(state: &ScanState, status: impl Into<String>, current_page: u32) -> Self {
        Self {
            total_amount: state.total_amount,
            total_order_count: state.total_order_count,
            monthly_data: state.monthly_data.clone(),
            status: status.into(),
            current_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanComplete {
    pub total_amount: f64,
    pub total_order_count: u64,
    pub monthly_data: MonthlyMap,
    pub total_pages: u32,
    /// 扫描因错误终止时的原因；成功时省略
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanComplete {
    pub fn from_state(state: &ScanState, total_pages: u32, error: Option<String>) -> Self {
        Self {
            total_amount: state.total_amount,
            total_order_count: state.total_order_count,
            monthly_data: state.monthly_data.clone(),
            total_pages,
            error,
        }
    }
}
