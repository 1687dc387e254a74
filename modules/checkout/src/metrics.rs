use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub payments_created_total: IntCounterVec,
    pub webhooks_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let payments_created_total = IntCounterVec::new(
            Opts::new("checkout_payments_created_total", "Create-payment attempts"),
            &["gateway", "result"], // result: success|<gateway error kind>|validation|conflict
        )?;

        let webhooks_total = IntCounterVec::new(
            Opts::new("checkout_webhooks_total", "Inbound gateway notifications"),
            &["gateway", "result"], // confirmed|pending|failed|unknown|invalid_signature|malformed|error
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration seconds"),
            &["path", "method", "status"],
        )?;

        registry.register(Box::new(payments_created_total.clone()))?;
        registry.register(Box::new(webhooks_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            payments_created_total,
            webhooks_total,
            http_request_duration_seconds,
        })
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&mf, &mut buf).map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}
