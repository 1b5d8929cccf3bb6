pub mod config;
pub mod error;
pub mod sink;
pub mod stats;
pub mod writer;

pub use config::WriterConfig;
pub use error::WriterError;
pub use sink::{HttpLineSink, LineSink};
pub use stats::WriterStats;
pub use writer::BatchWriter;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use opspulse_core::TenantId;

    use super::*;

    struct RecordingSink {
        batches: Mutex<Vec<(TenantId, String)>>,
        fail_first_n: AtomicU32,
    }

    impl RecordingSink {
        fn new(fail_first_n: u32) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_first_n: AtomicU32::new(fail_first_n),
            }
        }
    }

    #[async_trait]
    impl LineSink for RecordingSink {
        async fn write_batch(&self, tenant_id: &TenantId, body: &str) -> Result<(), WriterError> {
            if self.fail_first_n.load(Ordering::SeqCst) > 0 {
                self.fail_first_n.fetch_sub(1, Ordering::SeqCst);
                return Err(WriterError::Sink("injected failure".into()));
            }
            self.batches
                .lock()
                .unwrap()
                .push((tenant_id.clone(), body.to_owned()));
            Ok(())
        }
    }

    fn fast_config() -> WriterConfig {
        WriterConfig {
            batch_size: 3,
            flush_interval: Duration::from_secs(3600),
            max_tries: 2,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn size_triggered_flush_joins_lines_with_newline() {
        let sink = Arc::new(RecordingSink::new(0));
        let writer = BatchWriter::new(fast_config(), sink.clone());
        let tenant = TenantId::new("t1");

        writer.add(&tenant, "line1".into()).await;
        writer.add(&tenant, "line2".into()).await;
        assert!(sink.batches.lock().unwrap().is_empty());
        writer.add(&tenant, "line3".into()).await;

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].1, "line1\nline2\nline3");
        assert_eq!(writer.stats().writes_ok, 1);
    }

    #[tokio::test]
    async fn flush_all_drains_under_threshold_buffers() {
        let sink = Arc::new(RecordingSink::new(0));
        let writer = BatchWriter::new(fast_config(), sink.clone());
        let tenant = TenantId::new("t1");

        writer.add(&tenant, "only-line".into()).await;
        assert!(sink.batches.lock().unwrap().is_empty());

        writer.flush_all().await;
        assert_eq!(sink.batches.lock().unwrap().len(), 1);

        writer.flush_all().await;
        assert_eq!(sink.batches.lock().unwrap().len(), 1, "empty buffer produces no extra write");
    }

    #[tokio::test]
    async fn retries_then_succeeds_within_max_tries() {
        let sink = Arc::new(RecordingSink::new(1));
        let writer = BatchWriter::new(fast_config(), sink.clone());
        let tenant = TenantId::new("t1");

        writer.add(&tenant, "a".into()).await;
        writer.flush_all().await;

        assert_eq!(sink.batches.lock().unwrap().len(), 1);
        let stats = writer.stats();
        assert_eq!(stats.writes_ok, 1);
        assert_eq!(stats.writes_err, 0);
    }

    #[tokio::test]
    async fn exhausting_retries_counts_writes_err_and_discards() {
        let sink = Arc::new(RecordingSink::new(u32::MAX));
        let writer = BatchWriter::new(fast_config(), sink.clone());
        let tenant = TenantId::new("t1");

        writer.add(&tenant, "a".into()).await;
        writer.flush_all().await;

        assert!(sink.batches.lock().unwrap().is_empty());
        assert_eq!(writer.stats().writes_err, 1);

        // Discarded, not retained for a later flush.
        writer.flush_all().await;
        assert_eq!(writer.stats().writes_err, 1);
    }

    #[tokio::test]
    async fn tenants_are_buffered_independently() {
        let sink = Arc::new(RecordingSink::new(0));
        let writer = BatchWriter::new(fast_config(), sink.clone());
        let t1 = TenantId::new("t1");
        let t2 = TenantId::new("t2");

        writer.add(&t1, "a".into()).await;
        writer.add(&t2, "b".into()).await;
        writer.flush_all().await;

        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().any(|(t, l)| t == &t1 && l == "a"));
        assert!(batches.iter().any(|(t, l)| t == &t2 && l == "b"));
    }

    #[tokio::test]
    async fn start_stop_flushes_on_shutdown() {
        let sink = Arc::new(RecordingSink::new(0));
        let writer = BatchWriter::new(fast_config(), sink.clone());
        let tenant = TenantId::new("t1");

        writer.start();
        writer.add(&tenant, "a".into()).await;
        writer.stop().await;

        assert_eq!(sink.batches.lock().unwrap().len(), 1);
    }
}
