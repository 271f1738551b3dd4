use anyhow::Result;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "pickfinder_passes_total",
        "Number of stat/direction passes completed."
    );
    describe_counter!(
        "pickfinder_picks_total",
        "Number of picks returned by completed searches."
    );
    describe_counter!(
        "pickfinder_rejections_total",
        "Player/game pairs rejected, by gate."
    );
    describe_histogram!(
        "pickfinder_search_latency_ms",
        "Wall-clock duration of a full pick search in milliseconds."
    );
    describe_histogram!(
        "pickfinder_store_query_latency_ms",
        "Store query latency in milliseconds, including queueing on the SQLite thread."
    );
    describe_counter!(
        "pickfinder_store_query_errors_total",
        "Number of failed store queries."
    );
    describe_counter!("tracing_error_events", "Number of ERROR log events.");
}

pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?)
}
