//! 月度汇总
//!
//! 键的格式固定为 `"<月份缩写> <四位年份>"`，例如 `"Jan 2024"`。

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Month;
use serde::{Deserialize, Serialize};

/// 单个月份的金额和订单数
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub total: f64,
    pub count: u64,
}

impl MonthBucket {
    pub fn new(total: f64, count: u64) -> Self {
        Self { total, count }
    }

    /// 按分量累加
    pub fn absorb(&mut self, other: &MonthBucket) {
        self.total += other.total;
        self.count += other.count;
    }
}

/// 月份键 → 汇总
///
/// 序列化为普通 JSON 对象。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyMap(BTreeMap<String, MonthBucket>);

impl MonthlyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MonthBucket> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MonthBucket)> {
        self.0.iter()
    }

    /// 记录一笔订单
    pub fn record(&mut self, key: &MonthKey, amount: f64) {
        self.0
            .entry(key.to_string())
            .or_default()
            .absorb(&MonthBucket::new(amount, 1));
    }

    /// 合并另一份汇总：新键直接插入，已有键按分量相加
    pub fn merge(&mut self, other: &MonthlyMap) {
        for (key, bucket) in other.iter() {
            self.0.entry(key.clone()).or_default().absorb(bucket);
        }
    }

    /// 按时间先后排序（无法解析的键排在最后，按字母序）
    pub fn chronological(&self) -> Vec<(&str, &MonthBucket)> {
        let mut entries: Vec<_> = self
            .0
            .iter()
            .map(|(k, v)| (k.parse::<MonthKey>().ok(), k.as_str(), v))
            .collect();
        entries.sort_by(|a, b| match (&a.0, &b.0) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.1.cmp(b.1),
        });
        entries.into_iter().map(|(_, k, v)| (k, v)).collect()
    }

    pub fn total_amount(&self) -> f64 {
        self.0.values().map(|b| b.total).sum()
    }

    pub fn total_count(&self) -> u64 {
        self.0.values().map(|b| b.count).sum()
    }
}

impl FromIterator<(String, MonthBucket)> for MonthlyMap {
    fn from_iter<I: IntoIterator<Item = (String, MonthBucket)>>(iter: I) -> Self {
        let mut map = MonthlyMap::new();
        for (key, bucket) in iter {
            map.0.entry(key).or_default().absorb(&bucket);
        }
        map
    }
}

/// 月份键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl MonthKey {
    /// 由页面上的月份文字（`Jan` / `January`，大小写不敏感）和年份构造
    pub fn from_parts(month_text: &str, year: i32) -> Option<Self> {
        let month = month_text.parse::<Month>().ok()?;
        Some(Self {
            year,
            month: month.number_from_month(),
        })
    }

    fn abbrev(&self) -> &'static str {
        const ABBREV: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        ABBREV[(self.month as usize).saturating_sub(1).min(11)]
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.abbrev(), self.year)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, year) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| format!("month key without year: {}", s))?;
        let year: i32 = year
            .trim()
            .parse()
            .map_err(|_| format!("bad year in month key: {}", s))?;
        Self::from_parts(month, year).ok_or_else(|| format!("bad month in month key: {}", s))
    }
}
