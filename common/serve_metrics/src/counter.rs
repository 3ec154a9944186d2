use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestLabels {
    pub method: &'static str,
    pub status: u16,
}

/// Per `(method, status)` count of served requests, shared by every clone.
///
/// The `GET`/`200` series is always present, starting at zero, so dashboards
/// built against the old exporter keep finding it.
#[derive(Clone, Debug)]
pub struct RequestCounter {
    counts: Arc<DashMap<RequestLabels, AtomicU64>>,
}

impl Default for RequestCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCounter {
    pub fn new() -> Self {
        let counts = DashMap::new();
        counts.insert(
            RequestLabels {
                method: "GET",
                status: 200,
            },
            AtomicU64::new(0),
        );
        Self {
            counts: Arc::new(counts),
        }
    }

    pub fn increment(&self, method: &str, status: u16) {
        let labels = RequestLabels {
            method: method_label(method),
            status,
        };
        // Fast path takes a shard read lock only
        if let Some(count) = self.counts.get(&labels) {
            count.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.counts
            .entry(labels)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, method: &str, status: u16) -> u64 {
        let labels = RequestLabels {
            method: method_label(method),
            status,
        };
        self.counts
            .get(&labels)
            .map(|count| count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// All series, sorted by labels for a stable exposition.
    pub fn snapshot(&self) -> Vec<(RequestLabels, u64)> {
        let mut series: Vec<_> = self
            .counts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();
        series.sort();
        series
    }
}

// Unknown methods are folded together to keep label cardinality bounded
fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_with_get_ok() {
        let counter = RequestCounter::new();
        assert_eq!(
            counter.snapshot(),
            vec![(
                RequestLabels {
                    method: "GET",
                    status: 200
                },
                0
            )]
        );
    }

    #[test]
    fn clones_share_counts() {
        let counter = RequestCounter::new();
        let clone = counter.clone();
        counter.increment("GET", 200);
        clone.increment("GET", 200);
        clone.increment("POST", 201);
        counter.increment("POST", 400);

        assert_eq!(counter.get("GET", 200), 2);
        assert_eq!(counter.get("POST", 201), 1);
        assert_eq!(clone.get("POST", 400), 1);
        assert_eq!(counter.get("DELETE", 204), 0);
        assert_eq!(counter.snapshot().len(), 3);
    }

    #[test]
    fn unknown_methods_are_folded() {
        let counter = RequestCounter::new();
        counter.increment("BREW", 404);
        counter.increment("PROPFIND", 404);
        assert_eq!(counter.get("WHATEVER", 404), 2);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counter = RequestCounter::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.increment("GET", 200);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(counter.get("GET", 200), 8000);
    }
}
