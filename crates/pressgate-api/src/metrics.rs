use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, HistogramVec,
    IntCounterVec, Registry,
};

/// Pipeline metrics for monitoring
#[derive(Clone)]
pub struct PipelineMetrics {
    /// Counter for pipeline decisions, labeled by stage and outcome
    pub decisions_total: IntCounterVec,

    /// Histogram for full pipeline duration
    pub pipeline_duration_seconds: HistogramVec,
}

impl PipelineMetrics {
    /// Create a new PipelineMetrics instance and register all metrics with
    /// the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register with the registry
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let decisions_total = register_int_counter_vec_with_registry!(
            "pressgate_pipeline_decisions_total",
            "Total number of pipeline decisions",
            &["stage", "outcome"],
            registry
        )?;

        let pipeline_duration_seconds = register_histogram_vec_with_registry!(
            "pressgate_pipeline_duration_seconds",
            "Duration of the full authentication pipeline in seconds",
            &["outcome"],
            registry
        )?;

        Ok(Self { decisions_total, pipeline_duration_seconds })
    }

    /// Record an admitted request.
    pub fn record_allow(&self) {
        self.decisions_total.with_label_values(&["pipeline", "allow"]).inc();
    }

    /// Record a denial at a named stage.
    pub fn record_deny(&self, stage: &str) {
        self.decisions_total.with_label_values(&[stage, "deny"]).inc();
    }

    /// Record how long a pipeline run took, labeled by its outcome.
    pub fn observe_duration(&self, outcome: &str, elapsed: std::time::Duration) {
        self.pipeline_duration_seconds
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());
    }
}
