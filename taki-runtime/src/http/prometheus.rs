use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Registry;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
    static ref REGISTER_ONCE: Once = Once::new();
}

fn register_metrics() {
    REGISTRY
        .register(Box::new(
            taki_scheduler::metric::queue_wait_time_ms_metric().clone(),
        ))
        .expect("failed to register metric");

    REGISTRY
        .register(Box::new(
            taki_scheduler::metric::task_reservation_probe_count_metric().clone(),
        ))
        .expect("failed to register metric");
}

pub async fn get_metrics() -> String {
    use prometheus::Encoder;

    REGISTER_ONCE.call_once(register_metrics);

    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("could not encode custom metrics: {}", e);
    }

    let mut res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("custom metrics could not be parsed with utf8: {}", e);
            String::default()
        }
    };

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("could not encode prometheus metrics: {}", e);
    }

    let res_default = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("prometheus metrics could not be parsed with utf8: {}", e);
            String::default()
        }
    };

    res.push_str(&res_default);

    res
}
