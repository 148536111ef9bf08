use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts};

lazy_static! {
    static ref QUEUE_WAIT_TIME_MS: Histogram = Histogram::with_opts(
        HistogramOpts::new("queue_wait_time_ms", "Work queue wait time [milliseconds]")
            .namespace("taki_scheduler")
            .buckets(
                prometheus::exponential_buckets(1.0, 2.0, 20)
                    .expect("failed to build queue wait buckets")
            ),
    )
    .expect("failed to initialize metric: QUEUE_WAIT_TIME_MS");
    static ref TASK_RESERVATION_PROBE_COUNT: IntCounterVec = IntCounterVec::new(
        Opts::new("task_reservation_probe_count", "Task Reservation Probe Count")
            .namespace("taki_scheduler"),
        &["transport"]
    )
    .expect("failed to initialize metric: TASK_RESERVATION_PROBE_COUNT");
}

pub fn queue_wait_time_ms_metric() -> &'static Histogram {
    &QUEUE_WAIT_TIME_MS
}

pub fn task_reservation_probe_count_metric() -> &'static IntCounterVec {
    &TASK_RESERVATION_PROBE_COUNT
}
