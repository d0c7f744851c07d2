//! Policy store metrics.
//!
//! `policy_store_query_seconds{query}` times every repository query;
//! `policy_store_pool_connections{state}` tracks pool occupancy.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Publish pool occupancy as `busy` and `idle` connection gauges.
pub fn record_pool_metrics(pool: &PgPool) {
    let idle = pool.num_idle();
    let busy = (pool.size() as usize).saturating_sub(idle);

    for (state, count) in [("busy", busy), ("idle", idle)] {
        gauge!("policy_store_pool_connections", "state" => state).set(count as f64);
    }
}

/// Times one repository query.
///
/// Created before the query runs; `record` is called once the result is in,
/// whether it succeeded or not.
pub struct QueryTimer {
    query: String,
    started: Instant,
}

impl QueryTimer {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            started: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!("policy_store_query_seconds", "query" => self.query)
            .record(self.started.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_names() {
        let timer = QueryTimer::new("find_assigned_alert_rule_rows");
        assert_eq!(timer.query, "find_assigned_alert_rule_rows");

        let timer = QueryTimer::new(format!("find_assigned_{}_rows", "patch"));
        assert_eq!(timer.query, "find_assigned_patch_rows");
        timer.record();
    }
}
