use tokio::sync::mpsc;

use casefile_common::{ReportItem, SourceTag};

/// Producer half of the report queue. Cloneable: any number of producers
/// may submit concurrently. FIFO order holds per producer; there is no
/// cross-producer ordering guarantee.
#[derive(Clone)]
pub struct ReportSender {
    tx: mpsc::UnboundedSender<ReportItem>,
}

impl ReportSender {
    /// Enqueue a report. Non-blocking. Returns false once the consumer is
    /// gone, at which point the report is dropped.
    pub fn submit(&self, source: SourceTag, text: impl Into<String>) -> bool {
        self.tx.send(ReportItem::new(source, text)).is_ok()
    }
}

/// Consumer half. Owned by the single ingestion worker.
pub struct ReportReceiver {
    rx: mpsc::UnboundedReceiver<ReportItem>,
}

impl ReportReceiver {
    /// Wait for the next report. `None` once every sender is dropped and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<ReportItem> {
        self.rx.recv().await
    }

    /// Non-blocking poll, used by tests.
    pub fn try_recv(&mut self) -> Option<ReportItem> {
        self.rx.try_recv().ok()
    }
}

/// Create the report queue: one consumer end, cloneable producer end.
pub fn report_queue() -> (ReportSender, ReportReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReportSender { tx }, ReportReceiver { rx })
}
