//! 后台扫描服务 - 编排层
//!
//! 接收请求方的消息，立即应答，并在独立任务中运行扫描。每次扫描都有
//! 自己的会话号和取消令牌；新的 `START_SCAN` 会取消仍在进行的扫描。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::models::ScanRequest;
use crate::orchestrator::scan_orchestrator::{ScanOrchestrator, ScanOutcome};
use crate::protocol::{InboundMessage, Reply};
use crate::services::{EventSink, PageExtractor, TabSource};

struct ActiveScan {
    session_id: u64,
    cancel: CancellationToken,
}

/// 正在运行的扫描
pub struct ScanHandle {
    pub session_id: u64,
    join: JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    /// 等待扫描结束；任务 panic 时返回 None
    pub async fn wait(self) -> Option<ScanOutcome> {
        self.join.await.ok()
    }
}

pub struct ScanService<S, E> {
    orchestrator: Arc<ScanOrchestrator<S, E>>,
    active: Arc<Mutex<Option<ActiveScan>>>,
    next_session: AtomicU64,
}

impl<S, E> ScanService<S, E>
where
    S: TabSource + 'static,
    E: PageExtractor + 'static,
{
    pub fn new(orchestrator: ScanOrchestrator<S, E>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            active: Arc::new(Mutex::new(None)),
            next_session: AtomicU64::new(0),
        }
    }

    /// 存活检查
    pub fn ping(&self) -> Reply {
        Reply::Pong {
            ok: true,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// 处理一条请求消息并立即应答
    ///
    /// 只有 `START_SCAN` 需要回传通道；没有通道时拒绝受理。
    pub fn handle(&self, message: InboundMessage, sink: Option<EventSink>) -> Reply {
        match (message, sink) {
            (InboundMessage::Ping, _) => self.ping(),
            (InboundMessage::StartScan(request), Some(sink)) => {
                let handle = self.start(request, sink);
                info!("已受理扫描请求 #{}", handle.session_id);
                Reply::Ack { accepted: true }
            }
            (InboundMessage::StartScan(_), None) => {
                warn!("⚠️ 扫描请求没有回传通道，已拒绝");
                Reply::Ack { accepted: false }
            }
        }
    }

    /// 启动一次扫描，取代仍在进行的扫描
    pub fn start(&self, request: ScanRequest, sink: EventSink) -> ScanHandle {
        let session_id = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            let previous = active.replace(ActiveScan {
                session_id,
                cancel: cancel.clone(),
            });
            if let Some(previous) = previous {
                info!("扫描 #{} 被新的请求 #{} 取代", previous.session_id, session_id);
                previous.cancel.cancel();
            }
        }

        let orchestrator = Arc::clone(&self.orchestrator);
        let active = Arc::clone(&self.active);
        let join = tokio::spawn(
            async move {
                let outcome = orchestrator.run_scan(request, &sink, &cancel).await;

                let mut active = active.lock().unwrap_or_else(PoisonError::into_inner);
                if active.as_ref().map(|a| a.session_id) == Some(session_id) {
                    *active = None;
                }
                outcome
            }
            .instrument(info_span!("scan", session = session_id)),
        );

        ScanHandle { session_id, join }
    }

    /// 当前正在运行的扫描会话号
    pub fn active_session(&self) -> Option<u64> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| a.session_id)
    }
}
