//! 扫描核心的错误类型
//!
//! 核心层（models / services / orchestrator）统一返回 [`ScanError`]；
//! 应用层（`App`、`main`）使用 `anyhow::Result` 包装上下文。
//!
//! 错误的 Display 文本会原样出现在 `SCAN_UPDATE` / `SCAN_COMPLETE` 的
//! 状态字段里，所以保持英文。

use thiserror::Error;

/// 扫描过程中的错误
#[derive(Debug, Error)]
pub enum ScanError {
    /// 请求参数不合法（页码、最大页数等）
    #[error("invalid scan request: {0}")]
    InvalidRequest(String),

    /// baseUrl 无法解析
    #[error("malformed base URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// 打开后台标签页失败
    #[error("failed to open {url}: {reason}")]
    TabOpenFailed { url: String, reason: String },

    /// 页面在限定时间内没有加载完成
    #[error("page {url} did not finish loading within {timeout_ms}ms")]
    LoadTimeout { url: String, timeout_ms: u64 },

    /// 提取脚本执行失败或返回了无法识别的数据
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// 浏览器协议错误
    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// JSON 解析失败
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// 被新的扫描请求取代
    #[error("superseded by a newer scan")]
    Superseded,
}

impl ScanError {
    /// 是否属于单页级别的错误（导航、加载、提取）
    ///
    /// 这类错误只会在开始访问某一页之后出现，可以选择重试一次。
    pub fn is_page_error(&self) -> bool {
        matches!(
            self,
            ScanError::TabOpenFailed { .. }
                | ScanError::LoadTimeout { .. }
                | ScanError::Extraction(_)
                | ScanError::Browser(_)
                | ScanError::Json(_)
        )
    }
}

/// 扫描核心结果类型
pub type ScanResult<T> = Result<T, ScanError>;
