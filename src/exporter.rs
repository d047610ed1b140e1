//! Scrape pipeline and Prometheus collector.
//!
//! The exporter owns a dynamic registry of broker gauges. Metric names are
//! discovered on the first scrape that mentions them and never evicted, so
//! descriptors stay stable for the lifetime of the process. A failed fetch
//! keeps the last known values in place and only flips `emq_up` to 0.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use prometheus::core::{Collector, Desc};
use prometheus::{proto, Gauge, IntCounter, Opts};
use tracing::{debug, error, warn};

use crate::client::Fetch;
use crate::value::{parse_value, Leaf};

/// Namespace prefixed to every exported metric name.
pub const NAMESPACE: &str = "emq";

/// Dynamic set of broker gauges keyed by fully-qualified metric name.
#[derive(Default)]
pub struct MetricStore {
    gauges: HashMap<String, Gauge>,
}

impl MetricStore {
    /// Sets `fq_name` to `value`, creating the gauge on first sight. The help
    /// string is fixed at creation; later calls only update the value.
    pub fn upsert(&mut self, fq_name: &str, help: &str, value: f64) -> prometheus::Result<()> {
        if let Some(gauge) = self.gauges.get(fq_name) {
            gauge.set(value);
            return Ok(());
        }

        let gauge = Gauge::with_opts(Opts::new(fq_name, help))?;
        gauge.set(value);
        self.gauges.insert(fq_name.to_owned(), gauge);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Owned, name-sorted copy of the metric families for emission outside
    /// the lock.
    pub fn snapshot(&self) -> Vec<proto::MetricFamily> {
        let mut families: Vec<proto::MetricFamily> =
            self.gauges.values().flat_map(|g| g.collect()).collect();
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));
        families
    }
}

struct Inner<F> {
    fetcher: F,
    up: Gauge,
    total_scrapes: IntCounter,
    store: Mutex<MetricStore>,
}

/// The exporter itself: drives scrapes against the broker and implements
/// `Collector` for registration with a `prometheus::Registry`.
pub struct Exporter<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for Exporter<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Fetch> Exporter<F> {
    pub fn new(fetcher: F) -> prometheus::Result<Self> {
        let up = Gauge::with_opts(
            Opts::new("up", "Was the last scrape of EMQ successful").namespace(NAMESPACE),
        )?;
        let total_scrapes = IntCounter::with_opts(
            Opts::new("exporter_total_scrapes", "Current total scrapes").namespace(NAMESPACE),
        )?;

        Ok(Self {
            inner: Arc::new(Inner {
                fetcher,
                up,
                total_scrapes,
                store: Mutex::new(MetricStore::default()),
            }),
        })
    }

    /// Runs one scrape cycle: fetch the flattened broker statistics and fold
    /// them into the store. Numbers pass through, strings go through the
    /// value parser, everything else is skipped.
    pub async fn scrape(&self) {
        self.inner.total_scrapes.inc();

        let data = match self.inner.fetcher.fetch().await {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "scrape failed");
                self.inner.up.set(0.0);
                return;
            }
        };

        let mut ok = true;
        {
            let mut store = self.inner.store.lock().unwrap_or_else(|e| e.into_inner());

            for (key, raw) in &data {
                let value = match Leaf::from(raw) {
                    Leaf::Number(n) => n,
                    Leaf::Text(s) => match parse_value(&s) {
                        Ok(v) => v,
                        Err(err) => {
                            debug!(metric = %key, error = %err, "skipping unparseable value");
                            continue;
                        }
                    },
                    Leaf::Other => {
                        debug!(metric = %key, "skipping non-scalar value");
                        continue;
                    }
                };

                let fq_name = format!("{NAMESPACE}_{}", key.replace('.', "_"));
                let help = format!("EMQ node metric {key}");
                if let Err(err) = store.upsert(&fq_name, &help, value) {
                    error!(metric = %fq_name, error = %err, "failed to register metric");
                    ok = false;
                }
            }
        }

        self.inner.up.set(if ok { 1.0 } else { 0.0 });
    }

    pub fn up(&self) -> f64 {
        self.inner.up.get()
    }

    pub fn total_scrapes(&self) -> u64 {
        self.inner.total_scrapes.get()
    }

    pub fn sample_count(&self) -> usize {
        self.inner
            .store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl<F: Fetch + 'static> Collector for Exporter<F> {
    fn desc(&self) -> Vec<&Desc> {
        // Broker gauges are discovered at scrape time and intentionally not
        // pre-declared here.
        let mut descs = self.inner.up.desc();
        descs.extend(self.inner.total_scrapes.desc());
        descs
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let mut families = self.inner.up.collect();
        families.extend(self.inner.total_scrapes.collect());

        let snapshot = {
            let store = self.inner.store.lock().unwrap_or_else(|e| e.into_inner());
            store.snapshot()
        };
        families.extend(snapshot);

        families
    }
}
