//! 月度柱状图（终端文本）

use crate::models::MonthlyMap;

/// 图表统计
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStats {
    pub months: usize,
    pub total: f64,
    pub average_per_month: f64,
    pub highest: Option<(String, f64)>,
}

pub fn chart_stats(monthly: &MonthlyMap) -> ChartStats {
    let months = monthly.len();
    let total = monthly.total_amount();
    let highest = monthly
        .iter()
        .max_by(|a, b| a.1.total.total_cmp(&b.1.total))
        .map(|(k, v)| (k.clone(), v.total));

    ChartStats {
        months,
        total,
        average_per_month: if months == 0 { 0.0 } else { total / months as f64 },
        highest,
    }
}

/// 按时间顺序绘制横向柱状图，`width` 为最长柱的字符数
pub fn render_bar_chart(monthly: &MonthlyMap, width: usize) -> String {
    let entries = monthly.chronological();
    let max = entries.iter().map(|(_, b)| b.total).fold(0.0_f64, f64::max);
    if entries.is_empty() || max <= 0.0 {
        return String::new();
    }

    let label_width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, bucket) in entries {
        let mut len = ((bucket.total / max) * width as f64).round() as usize;
        if bucket.total > 0.0 {
            len = len.max(1);
        }
        out.push_str(&format!(
            "{:<lw$} │{:<w$} ${:.2} ({})\n",
            key,
            "█".repeat(len),
            bucket.total,
            bucket.count,
            lw = label_width,
            w = width
        ));
    }
    out
}
