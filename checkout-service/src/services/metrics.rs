//! Prometheus counters for checkout sessions and list item writes.
//!
//! Each `CheckoutMetrics` owns its registry, so every application instance
//! renders only what it recorded.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct CheckoutMetrics {
    registry: Registry,
    checkouts: IntCounterVec,
    list_items: IntCounterVec,
}

impl CheckoutMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Rapyd checkout requests: issued, declined or errored
        let checkouts = IntCounterVec::new(
            Opts::new(
                "rapyd_checkouts_total",
                "Rapyd checkout requests by outcome",
            ),
            &["outcome"],
        )?;

        let list_items = IntCounterVec::new(
            Opts::new(
                "sharepoint_list_items_total",
                "SharePoint list item writes by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;

        registry.register(Box::new(checkouts.clone()))?;
        registry.register(Box::new(list_items.clone()))?;

        Ok(Self {
            registry,
            checkouts,
            list_items,
        })
    }

    pub fn checkout_issued(&self) {
        self.checkouts.with_label_values(&["issued"]).inc();
    }

    pub fn checkout_declined(&self) {
        self.checkouts.with_label_values(&["declined"]).inc();
    }

    pub fn checkout_errored(&self) {
        self.checkouts.with_label_values(&["error"]).inc();
    }

    /// `operation` is `create` or `update`.
    pub fn list_item(&self, operation: &str, succeeded: bool) {
        let outcome = if succeeded { "succeeded" } else { "failed" };
        self.list_items
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Text exposition format for `GET /metrics`.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
