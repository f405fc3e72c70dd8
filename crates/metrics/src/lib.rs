use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("prometheus: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Counters for the price API, rendered in the prometheus text format.
#[derive(Clone)]
pub struct MetricsHandle {
    registry: Registry,
    reads: IntCounter,
    writes: IntCounter,
    rejected_writes: IntCounter,
    store_errors: IntCounter,
}

impl MetricsHandle {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let reads = register(&registry, "price_reads_total", "Successful price list reads")?;
        let writes = register(&registry, "price_writes_total", "Committed price list replacements")?;
        let rejected_writes = register(
            &registry,
            "price_writes_rejected_total",
            "Price list writes rejected as invalid",
        )?;
        let store_errors = register(
            &registry,
            "price_store_errors_total",
            "Store failures surfaced as internal errors",
        )?;
        Ok(Self {
            registry,
            reads,
            writes,
            rejected_writes,
            store_errors,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn reads(&self) -> &IntCounter {
        &self.reads
    }

    pub fn writes(&self) -> &IntCounter {
        &self.writes
    }

    pub fn rejected_writes(&self) -> &IntCounter {
        &self.rejected_writes
    }

    pub fn store_errors(&self) -> &IntCounter {
        &self.store_errors
    }

    /// Returns the content type and the encoded metric families.
    pub fn render(&self) -> Result<(String, Vec<u8>), MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

fn register(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, MetricsError> {
    let counter = IntCounter::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters_in_text_format() {
        let metrics = MetricsHandle::new().expect("registry");
        metrics.reads().inc();
        metrics.writes().inc_by(2);

        let (content_type, body) = metrics.render().expect("render");
        let text = String::from_utf8(body).expect("utf8");
        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("price_reads_total 1"));
        assert!(text.contains("price_writes_total 2"));
        assert!(text.contains("price_store_errors_total 0"));
    }
}
