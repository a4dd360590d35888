//! # Order Tally
//!
//! 统计订单历史页面的消费金额：提取每个订单的金额和日期，按月汇总，
//! 并在后台标签中逐页翻阅后续分页。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 Page，只暴露能力
//! - `JsExecutor` - 提供 eval() / readyState / close()
//!
//! ### ② 业务能力层（Services）
//! - `TabSource` / `ScanTab` - 打开、关闭后台标签
//! - `PageExtractor` - 可替换的单页提取策略（默认 `DomOrderExtractor`）
//! - `OrderParser` - 金额 / 日期 / 订单字样的判断
//! - `EventSink` - 带超时的进度事件投递
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/scan_orchestrator` - 串行的多页扫描循环
//! - `orchestrator/scan_service` - 消息处理与扫描会话的取代
//! - `orchestrator/app` - 命令行应用
//!
//! ### ④ 展示层（Report）
//! - `report/` - 面板与月度柱状图
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod protocol;
pub mod report;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{ScanError, ScanResult};
pub use infrastructure::JsExecutor;
pub use models::{MonthBucket, MonthKey, MonthlyMap, PageResult, ScanRequest, ScanState};
pub use orchestrator::{App, ScanOrchestrator, ScanOutcome, ScanService, ScanSettings, StopReason};
pub use protocol::{InboundMessage, OutboundEvent, Reply, ScanComplete, ScanUpdate};
