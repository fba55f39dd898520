use metrics::Histogram;
use metrics_derive::Metrics;

/// The metrics for the [`super::EngineClient`].
#[derive(Metrics, Clone)]
#[metrics(scope = "engine_api")]
pub struct EngineApiMetrics {
    /// The duration of `engine_forkchoiceUpdatedV1` calls.
    pub forkchoice_updated_duration: Histogram,
    /// The duration of `engine_newPayloadV1` calls.
    pub new_payload_duration: Histogram,
    /// The duration of `engine_getPayloadV1` calls.
    pub get_payload_duration: Histogram,
}
