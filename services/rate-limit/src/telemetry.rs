use anyhow::{Context, Result};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const RATE_LIMIT_OPERATIONS_EVENT_ORG: &str = "rate_limit_operations_event_org";

/// Installs the global Prometheus recorder; the handle renders `/metrics`.
pub fn setup_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install prometheus recorder")?;
    describe_metrics();
    Ok(handle)
}

pub fn describe_metrics() {
    describe_counter!(
        RATE_LIMIT_OPERATIONS_EVENT_ORG,
        "Refresh cycles in which an organization was over its monthly operations limit"
    );
}

/// Counted once per refresh cycle for every limited organization.
pub fn record_limited_organization(organization_id: &str, org_name: &str) {
    counter!(
        RATE_LIMIT_OPERATIONS_EVENT_ORG,
        "org_id" => organization_id.to_string(),
        "org_name" => org_name.to_string()
    )
    .increment(1);
}
