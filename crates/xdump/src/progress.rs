//! Progress reporting sink. The core never prints directly; callers
//! inject a sink and decide how (or whether) to surface it.

/// Receives a monotonic `[0.0, 1.0]` fraction of run completion.
pub trait ProgressSink: Send + Sync {
    fn report(&self, fraction: f32);
}

/// Discards every report. The default when a caller doesn't care.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _fraction: f32) {}
}

impl<F: Fn(f32) + Send + Sync> ProgressSink for F {
    fn report(&self, fraction: f32) {
        self(fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn null_sink_accepts_any_report() {
        NullSink.report(0.5);
        NullSink.report(1.0);
    }

    #[test]
    fn closure_sink_forwards_reports() {
        let last_bits = Arc::new(AtomicU32::new(0));
        let captured = Arc::clone(&last_bits);
        let sink = move |fraction: f32| captured.store(fraction.to_bits(), Ordering::SeqCst);
        sink.report(0.75);
        assert_eq!(f32::from_bits(last_bits.load(Ordering::SeqCst)), 0.75);
    }
}
