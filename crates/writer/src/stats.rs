use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterStats {
    pub writes_ok: u64,
    pub writes_err: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    writes_ok: AtomicU64,
    writes_err: AtomicU64,
}

impl Counters {
    pub(crate) fn record_ok(&self) {
        self.writes_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_err(&self) {
        self.writes_err.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> WriterStats {
        WriterStats {
            writes_ok: self.writes_ok.load(Ordering::Relaxed),
            writes_err: self.writes_err.load(Ordering::Relaxed),
        }
    }
}
