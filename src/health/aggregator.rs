//! Concurrent health aggregation.
//!
//! # Responsibilities
//! - Run every registered check concurrently through the request's resolver scope
//! - Bound each check by its timeout; a timeout degrades the report, never fails it
//! - Reduce per-check states to one overall state

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::time::Duration;
use tokio::time::{timeout, Instant};

use crate::health::check::{CheckError, CheckResult, HealthCheck};
use crate::health::state::{reduce, HealthState};
use crate::normalize::{ResponseValue, ToResponseValue};
use crate::observability::metrics;
use crate::resolver::{ResolverError, ResolverFailure, ResolverScope};

/// Result of one aggregation. Checks keep their registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    overall: HealthState,
    checks: Vec<CheckResult>,
    generated_at: DateTime<Utc>,
}

impl AggregateReport {
    fn new(checks: Vec<CheckResult>) -> Self {
        Self {
            overall: reduce(checks.iter().map(CheckResult::state)),
            checks,
            generated_at: Utc::now(),
        }
    }

    pub fn overall(&self) -> HealthState {
        self.overall
    }

    pub fn checks(&self) -> &[CheckResult] {
        &self.checks
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

impl ToResponseValue for AggregateReport {
    fn to_response_value(&self) -> ResponseValue {
        let checks: Vec<ResponseValue> = self
            .checks
            .iter()
            .map(ToResponseValue::to_response_value)
            .collect();

        ResponseValue::object()
            .with_field("status", self.overall.as_str())
            .with_field("checks", checks)
            .with_field("generated_at", self.generated_at)
    }
}

/// Ordered set of checks run together.
#[derive(Debug, Clone, Default)]
pub struct HealthAggregator {
    checks: Vec<HealthCheck>,
}

impl HealthAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, check: HealthCheck) -> Self {
        self.register(check);
        self
    }

    pub fn register(&mut self, check: HealthCheck) {
        self.checks.push(check);
    }

    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    /// Run all checks in `scope`. Checks without their own timeout use
    /// `default_timeout`.
    ///
    /// Only scope misuse is returned as an error; probe failures and timeouts
    /// become unhealthy results.
    pub async fn run(
        &self,
        scope: &ResolverScope,
        default_timeout: Duration,
    ) -> Result<AggregateReport, ResolverError> {
        let runs = self.checks.iter().map(|check| {
            let budget = check.timeout().unwrap_or(default_timeout);
            let check = check.clone();
            scope.resolve(check.resolver_id(), move || async move {
                Ok::<_, ResolverFailure>(execute(&check, budget).await)
            })
        });

        let checks = join_all(runs)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let report = AggregateReport::new(checks);
        metrics::record_report(report.overall());
        tracing::debug!(
            scope = %scope.id(),
            overall = %report.overall(),
            checks = report.checks().len(),
            "Health report generated"
        );

        Ok(report)
    }
}

async fn execute(check: &HealthCheck, budget: Duration) -> CheckResult {
    let start = Instant::now();
    let outcome = timeout(budget, check.probe().check()).await;
    let duration = start.elapsed().min(budget);

    let result = match outcome {
        Ok(Ok(report)) => CheckResult::from_report(check.name(), report, duration),
        Ok(Err(e)) => CheckResult::from_error(check.name(), CheckError::Failed(e.to_string()), duration),
        Err(_) => CheckResult::from_error(check.name(), CheckError::Timeout(budget), duration),
    };

    if result.state() != HealthState::Healthy {
        tracing::warn!(
            check = check.name(),
            state = %result.state(),
            detail = result.detail().unwrap_or(""),
            duration_ms = duration.as_secs_f64() * 1000.0,
            "Health check not healthy"
        );
    }
    metrics::record_check(check.name(), result.state(), duration);

    result
}
