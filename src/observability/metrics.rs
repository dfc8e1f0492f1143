use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_created_total: IntCounter,
    pub booking_transitions_total: IntCounterVec,
    pub search_latency_seconds: HistogramVec,
    pub vehicles_engaged: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_created_total = IntCounter::new(
            "bookings_created_total",
            "Total bookings created successfully",
        )
        .expect("valid bookings_created_total metric");

        let booking_transitions_total = IntCounterVec::new(
            Opts::new(
                "booking_transitions_total",
                "Booking status transitions by axis and outcome",
            ),
            &["axis", "outcome"],
        )
        .expect("valid booking_transitions_total metric");

        let search_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "search_latency_seconds",
                "Latency of vehicle search in seconds",
            ),
            &["outcome"],
        )
        .expect("valid search_latency_seconds metric");

        let vehicles_engaged = IntGauge::new(
            "vehicles_engaged",
            "Number of vehicles currently engaged on a booking",
        )
        .expect("valid vehicles_engaged metric");

        registry
            .register(Box::new(bookings_created_total.clone()))
            .expect("register bookings_created_total");
        registry
            .register(Box::new(booking_transitions_total.clone()))
            .expect("register booking_transitions_total");
        registry
            .register(Box::new(search_latency_seconds.clone()))
            .expect("register search_latency_seconds");
        registry
            .register(Box::new(vehicles_engaged.clone()))
            .expect("register vehicles_engaged");

        Self {
            registry,
            bookings_created_total,
            booking_transitions_total,
            search_latency_seconds,
            vehicles_engaged,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
