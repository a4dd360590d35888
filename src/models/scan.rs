use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};
use crate::models::monthly::MonthlyMap;

/// 发起扫描的请求
///
/// 由请求方（当前订单页）生成，发送后不再修改。金额和订单数是第一页
/// （或已扫描部分）的种子结果。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub total_amount: f64,
    pub total_order_count: u64,
    #[serde(default)]
    pub monthly_data: MonthlyMap,
    pub current_page: u32,
    #[serde(default)]
    pub expected_total_orders: Option<u64>,
    pub max_pages: u32,
    pub base_url: String,
    pub time_filter: String,
}

impl ScanRequest {
    /// 检查页码约束；URL 的校验在构造分页地址时完成
    pub fn validate(&self) -> ScanResult<()> {
        if self.current_page < 1 {
            return Err(ScanError::InvalidRequest(
                "currentPage must be at least 1".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ScanError::InvalidRequest("maxPages must be positive".into()));
        }
        if self.max_pages < self.current_page {
            return Err(ScanError::InvalidRequest(format!(
                "maxPages ({}) is smaller than currentPage ({})",
                self.max_pages, self.current_page
            )));
        }
        Ok(())
    }
}

/// 单页提取结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub total: f64,
    pub count: u64,
    #[serde(default)]
    pub monthly_data: MonthlyMap,
}

impl PageResult {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// 一次扫描的累计状态，只由编排循环持有和修改
#[derive(Debug, Clone, PartialEq)]
pub struct ScanState {
    pub total_amount: f64,
    pub total_order_count: u64,
    pub monthly_data: MonthlyMap,
    /// 最近一次成功扫描的页码
    pub page_num: u32,
}

impl ScanState {
    pub fn from_request(request: &ScanRequest) -> Self {
        Self {
            total_amount: request.total_amount,
            total_order_count: request.total_order_count,
            monthly_data: request.monthly_data.clone(),
            page_num: request.current_page,
        }
    }

    /// 并入一页的结果
    pub fn absorb(&mut self, page_num: u32, page: &PageResult) {
        self.total_amount += page.total;
        self.total_order_count += page.count;
        self.monthly_data.merge(&page.monthly_data);
        self.page_num = page_num;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::monthly::MonthBucket;

    fn request() -> ScanRequest {
        ScanRequest {
            total_amount: 50.0,
            total_order_count: 2,
            monthly_data: [("Jan 2024".to_string(), MonthBucket::new(50.0, 2))]
                .into_iter()
                .collect(),
            current_page: 1,
            expected_total_orders: None,
            max_pages: 3,
            base_url: "https://example/orders".into(),
            time_filter: "year-2024".into(),
        }
    }

    #[test]
    fn test_request_wire_format_is_camel_case() {
        let json = serde_json::json!({
            "totalAmount": 50.0,
            "totalOrderCount": 2,
            "monthlyData": {"Jan 2024": {"total": 50.0, "count": 2}},
            "currentPage": 1,
            "expectedTotalOrders": null,
            "maxPages": 3,
            "baseUrl": "https://example/orders",
            "timeFilter": "year-2024"
        });
        let parsed: ScanRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, request());
    }

    #[test]
    fn test_validate_page_bounds() {
        assert!(request().validate().is_ok());

        let mut same = request();
        same.max_pages = 1;
        assert!(same.validate().is_ok());

        let mut zero = request();
        zero.max_pages = 0;
        assert!(matches!(zero.validate(), Err(ScanError::InvalidRequest(_))));

        let mut behind = request();
        behind.current_page = 4;
        assert!(matches!(behind.validate(), Err(ScanError::InvalidRequest(_))));
    }

    #[test]
    fn test_state_absorbs_pages() {
        let mut state = ScanState::from_request(&request());
        let page = PageResult {
            total: 30.0,
            count: 1,
            monthly_data: [("Feb 2024".to_string(), MonthBucket::new(30.0, 1))]
                .into_iter()
                .collect(),
        };
        state.absorb(2, &page);

        assert_eq!(state.page_num, 2);
        assert_eq!(state.total_order_count, 3);
        assert!((state.total_amount - 80.0).abs() < 1e-9);
        assert_eq!(state.monthly_data.len(), 2);
    }
}
