//! 进度事件投递 - 业务能力层
//!
//! 投递有超时上限，失败只记日志，不影响扫描循环。

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::warn;

use crate::protocol::OutboundEvent;

/// 发往请求方的事件通道
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<OutboundEvent>,
    timeout: Duration,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<OutboundEvent>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }

    /// 创建一对通道
    pub fn channel(capacity: usize, timeout: Duration) -> (Self, mpsc::Receiver<OutboundEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx, timeout), rx)
    }

    /// 投递事件，返回是否送达
    pub async fn deliver(&self, event: OutboundEvent) -> bool {
        match self.tx.send_timeout(event, self.timeout).await {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) => {
                warn!("⚠️ 进度事件投递超时 ({:?})，已丢弃", self.timeout);
                false
            }
            Err(SendTimeoutError::Closed(_)) => {
                warn!("⚠️ 请求方已不可达，进度事件已丢弃");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthlyMap, ScanState};
    use crate::protocol::ScanUpdate;

    fn update() -> OutboundEvent {
        let state = ScanState {
            total_amount: 1.0,
            total_order_count: 1,
            monthly_data: MonthlyMap::new(),
            page_num: 1,
        };
        OutboundEvent::ScanUpdate(ScanUpdate::from_state(&state, "Navigating to page 2...", 2))
    }

    #[tokio::test]
    async fn test_delivers_to_receiver() {
        let (sink, mut rx) = EventSink::channel(4, Duration::from_millis(50));
        assert!(sink.deliver(update()).await);
        assert_eq!(rx.recv().await, Some(update()));
    }

    #[tokio::test]
    async fn test_closed_receiver_is_swallowed() {
        let (sink, rx) = EventSink::channel(4, Duration::from_millis(50));
        drop(rx);
        assert!(!sink.deliver(update()).await);
    }

    #[tokio::test]
    async fn test_full_channel_times_out() {
        let (sink, _rx) = EventSink::channel(1, Duration::from_millis(20));
        assert!(sink.deliver(update()).await);
        assert!(!sink.deliver(update()).await);
    }
}
