//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `scan_orchestrator` - 多页扫描循环
//! - 逐页打开后台标签、等待加载、提取、合并
//! - 推送进度事件，处理各种停止条件
//! - 保证每个标签在进入下一页前关闭
//!
//! ### `scan_service` - 后台扫描服务
//! - 处理 `PING` / `START_SCAN`，立即应答
//! - 在独立任务中运行扫描，新请求取代旧请求
//!
//! ### `app` - 命令行应用
//! - 连接浏览器，提取第一页，发起扫描，输出面板和报告
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! scan_service (会话 / 取消)
//!     ↓
//! scan_orchestrator (逐页循环)
//!     ↓
//! services (能力层：tab_source / extractor / event_sink)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod app;
pub mod scan_orchestrator;
pub mod scan_service;

pub use app::App;
pub use scan_orchestrator::{ScanOrchestrator, ScanOutcome, ScanSettings, StopReason};
pub use scan_service::{ScanHandle, ScanService};
