//! JS 执行器 - 基础设施层
//!
//! 持有一个 page，只暴露"执行 JS"和页面生命周期相关的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::ScanResult;

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源
/// - 暴露 eval() 能力
/// - 不认识订单 / 扫描状态
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> ScanResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> ScanResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 当前 `document.readyState`
    pub async fn ready_state(&self) -> ScanResult<String> {
        self.eval_as("document.readyState").await
    }

    /// 关闭页面对应的标签
    ///
    /// Page 内部是 Arc，clone 后关闭即关闭同一个 target。
    pub async fn close(&self) -> ScanResult<()> {
        self.page.clone().close().await?;
        Ok(())
    }
}
