//! Place-name resolution: gazetteer, process cache, geocoder, placeholder.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use trip_core::gazetteer::{self, CONTINENTAL_CENTROID};
use trip_core::{Coordinates, GeoConfidence, GeoResolution};

use crate::cache::TtlCache;
use crate::providers::{CallPolicy, GeocodingProvider};

pub struct GeoResolver {
    geocoder: Option<Arc<dyn GeocodingProvider>>,
    policy: Arc<CallPolicy>,
    cache: TtlCache<String, Coordinates>,
}

impl GeoResolver {
    pub fn new(
        geocoder: Option<Arc<dyn GeocodingProvider>>,
        policy: Arc<CallPolicy>,
        cache_max_entries: usize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            geocoder,
            policy,
            cache: TtlCache::new(cache_max_entries, cache_ttl),
        }
    }

    /// Resolve a free-text place name. Never fails.
    pub async fn resolve(&self, name: &str) -> GeoResolution {
        let query = name.trim().to_string();

        if let Some(coordinates) = gazetteer::lookup(&query) {
            return GeoResolution {
                query,
                coordinates,
                confidence: GeoConfidence::Gazetteer,
            };
        }

        let key = gazetteer::normalize(&query);
        if let Some(coordinates) = self.cache.get(&key) {
            return GeoResolution {
                query,
                coordinates,
                confidence: GeoConfidence::Geocoded,
            };
        }

        if let Some(geocoder) = &self.geocoder {
            if !key.is_empty() {
                match self
                    .policy
                    .call(geocoder.name(), geocoder.geocode(&query))
                    .await
                {
                    Ok(coordinates) => {
                        self.cache.insert(key, coordinates);
                        return GeoResolution {
                            query,
                            coordinates,
                            confidence: GeoConfidence::Geocoded,
                        };
                    }
                    Err(err) => tracing::warn!("Geocoding '{}' failed: {}", query, err),
                }
            }
        }

        tracing::debug!("No coordinates for '{}', using placeholder", query);
        GeoResolution {
            query,
            coordinates: CONTINENTAL_CENTROID,
            confidence: GeoConfidence::Placeholder,
        }
    }

    /// Resolve several names concurrently, preserving input order.
    pub async fn resolve_all(&self, names: &[&str]) -> Vec<GeoResolution> {
        join_all(names.iter().map(|name| self.resolve(name))).await
    }
}
