//! 结果面板
//!
//! 消费 `SCAN_UPDATE` / `SCAN_COMPLETE`，保存最后一次的汇总并渲染成文本。
//! 出错时保留之前累计的结果，只把状态改成 `Error: ...`。

use crate::models::{MonthlyMap, ScanRequest};
use crate::protocol::OutboundEvent;
use crate::report::chart::{chart_stats, render_bar_chart};

const CHART_WIDTH: usize = 40;

#[derive(Debug, Clone)]
pub struct Panel {
    pub total_amount: f64,
    pub order_count: u64,
    pub status: String,
    pub period: String,
    pub monthly: MonthlyMap,
    pub show_chart: bool,
}

impl Panel {
    pub fn new(show_chart: bool) -> Self {
        Self {
            total_amount: 0.0,
            order_count: 0,
            status: "Ready".to_string(),
            period: "All Orders".to_string(),
            monthly: MonthlyMap::new(),
            show_chart,
        }
    }

    /// 用第一页的种子结果开始一次扫描
    pub fn begin(&mut self, request: &ScanRequest) {
        self.total_amount = request.total_amount;
        self.order_count = request.total_order_count;
        self.monthly = request.monthly_data.clone();
        self.period = period_label(&request.time_filter);
        self.status = "Starting multi-page scan...".to_string();
    }

    pub fn apply(&mut self, event: &OutboundEvent) {
        match event {
            OutboundEvent::ScanUpdate(update) => {
                self.total_amount = update.total_amount;
                self.order_count = update.total_order_count;
                self.monthly = update.monthly_data.clone();
                self.status = update.status.clone();
            }
            OutboundEvent::ScanComplete(done) => {
                self.total_amount = done.total_amount;
                self.order_count = done.total_order_count;
                self.monthly = done.monthly_data.clone();
                self.status = match &done.error {
                    Some(err) => format!("Error: {}", err),
                    None => "Scan complete!".to_string(),
                };
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self {
            status: "Ready to calculate".to_string(),
            ..Self::new(self.show_chart)
        };
    }

    pub fn average_order(&self) -> f64 {
        if self.order_count == 0 {
            0.0
        } else {
            self.total_amount / self.order_count as f64
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "Orders: {} | Total: ${:.2} | Avg: ${:.2} | Period: {}\nStatus: {}\n",
            self.order_count,
            self.total_amount,
            self.average_order(),
            self.period,
            self.status
        );

        if self.show_chart && !self.monthly.is_empty() {
            out.push_str(&render_bar_chart(&self.monthly, CHART_WIDTH));
            let stats = chart_stats(&self.monthly);
            if let Some((month, total)) = &stats.highest {
                out.push_str(&format!(
                    "{} months, avg ${:.2}/month, highest {} (${:.2})\n",
                    stats.months, stats.average_per_month, month, total
                ));
            }
        }
        out
    }
}

fn period_label(time_filter: &str) -> String {
    match time_filter {
        "" | "all" => "All Orders".to_string(),
        "last30" => "Last 30 days".to_string(),
        "months-3" => "Past 3 months".to_string(),
        other => match other.strip_prefix("year-") {
            Some(year) => year.to_string(),
            None => other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthBucket, ScanState};
    use crate::protocol::{ScanComplete, ScanUpdate};

    fn state(total: f64, count: u64) -> ScanState {
        ScanState {
            total_amount: total,
            total_order_count: count,
            monthly_data: [("Jan 2024".to_string(), MonthBucket::new(total, count))]
                .into_iter()
                .collect(),
            page_num: 2,
        }
    }

    #[test]
    fn test_error_keeps_last_good_totals() {
        let mut panel = Panel::new(false);
        panel.apply(&OutboundEvent::ScanUpdate(ScanUpdate::from_state(
            &state(50.0, 2),
            "Page 2 complete",
            2,
        )));
        panel.apply(&OutboundEvent::ScanComplete(ScanComplete::from_state(
            &state(50.0, 2),
            2,
            Some("page did not finish loading".into()),
        )));

        assert_eq!(panel.order_count, 2);
        assert!((panel.average_order() - 25.0).abs() < 1e-9);
        assert_eq!(panel.status, "Error: page did not finish loading");
    }

    #[test]
    fn test_render_with_chart() {
        let mut panel = Panel::new(true);
        panel.apply(&OutboundEvent::ScanComplete(ScanComplete::from_state(
            &state(80.0, 3),
            3,
            None,
        )));
        let text = panel.render();
        assert!(text.contains("Orders: 3 | Total: $80.00"));
        assert!(text.contains("Status: Scan complete!"));
        assert!(text.contains("Jan 2024 │"));
    }

    #[test]
    fn test_clear_resets() {
        let mut panel = Panel::new(true);
        panel.total_amount = 10.0;
        panel.clear();
        assert_eq!(panel.total_amount, 0.0);
        assert_eq!(panel.status, "Ready to calculate");
        assert!(panel.show_chart);
    }

    #[test]
    fn test_period_labels() {
        assert_eq!(period_label("all"), "All Orders");
        assert_eq!(period_label("year-2024"), "2024");
        assert_eq!(period_label("custom"), "custom");
    }
}
