//! Simulates a small stream of requests and prints the retained events.
//!
//! ```text
//! cargo run --example demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use wide_events::{
    measure, BoxedError, Config, RequestInfo, RequestLifecycle, StdoutSink, Value,
};

fn main() {
    let mut config = Config::default().with_env_overrides();
    config.service.service_name = "demo-shop".to_owned();
    config.service.service_version = "1.0.0".to_owned();
    config.sampling.sample_rate = 0.1;
    config.sampling.always_sample_path_patterns = ["/admin"].into_iter().collect();
    wide_events_log::init(&config.log);

    let lifecycle = Arc::new(RequestLifecycle::new(config, StdoutSink));

    for i in 0..50u64 {
        let path = match i % 10 {
            0 => "/admin/flags",
            1..=7 => "/products",
            _ => "/checkout",
        };

        let result: Result<u16, BoxedError> =
            lifecycle.handle(RequestInfo::new("GET", path), None, |builder| {
                builder.add_business_context(vec![("iteration", Value::U64(i))]);
                let status = measure(builder, "db_ms", || {
                    std::thread::sleep(Duration::from_millis(1));
                    if path == "/checkout" && i % 9 == 0 {
                        503
                    } else {
                        200
                    }
                });
                Ok(status)
            });

        result.ok();
    }
}
