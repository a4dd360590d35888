pub mod chart;
pub mod panel;

pub use chart::{chart_stats, render_bar_chart, ChartStats};
pub use panel::Panel;
