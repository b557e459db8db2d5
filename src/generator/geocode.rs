//! Customer geocoding through the Nominatim search API.
//!
//! Lookups are best effort: a customer whose lookup fails keeps empty
//! coordinates and generation carries on. Requests are spaced out to
//! respect Nominatim's rate limit of one request per second.

use crate::config::GeneratorConfig;
use crate::error::GeocodeError;
use crate::models::Customer;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings for the geocoder.
#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub user_agent: String,
    /// Pause between two consecutive requests.
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&GeneratorConfig> for GeocoderSettings {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            base_url: config.nominatim_url.clone(),
            user_agent: config.user_agent.clone(),
            interval: Duration::from_millis(config.request_interval_ms),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// One search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl Place {
    fn coordinates(&self) -> Result<(f64, f64), GeocodeError> {
        let parse = |text: &str| -> Result<f64, GeocodeError> {
            text.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| GeocodeError::InvalidCoordinate(text.to_string()))
        };

        let latitude = parse(&self.lat)?;
        let longitude = parse(&self.lon)?;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeocodeError::InvalidCoordinate(format!(
                "{}, {}",
                self.lat, self.lon
            )));
        }

        Ok((latitude, longitude))
    }
}

/// Async Nominatim client.
pub struct Geocoder {
    http_client: reqwest::Client,
    settings: GeocoderSettings,
}

impl Geocoder {
    pub fn new(settings: GeocoderSettings) -> Result<Self, GeocodeError> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    /// Look up the first match for a free-form query.
    pub async fn locate(&self, query: &str) -> Result<Option<(f64, f64)>, GeocodeError> {
        debug!("Geocoding '{}'", query);

        let response = self
            .http_client
            .get(&self.settings.base_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }

        let places: Vec<Place> = response.json().await?;
        places.first().map(Place::coordinates).transpose()
    }

    /// Fill in the coordinates of every customer, one request each.
    ///
    /// Returns how many customers were located.
    pub async fn geocode_customers(&self, customers: &mut [Customer], show_progress: bool) -> usize {
        info!("Geocoding {} customers", customers.len());

        let progress_bar = if show_progress {
            let pb = ProgressBar::new(customers.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        let mut located = 0;
        for (i, customer) in customers.iter_mut().enumerate() {
            if i > 0 && !self.settings.interval.is_zero() {
                tokio::time::sleep(self.settings.interval).await;
            }

            let query = customer_query(customer);
            if let Some(ref pb) = progress_bar {
                pb.set_message(query.clone());
            }

            let coordinates = match self.locate(&query).await {
                Ok(Some(coordinates)) => Some(coordinates),
                Ok(None) => {
                    warn!("No geocoding match for '{}'", query);
                    None
                }
                Err(e) => {
                    warn!("Geocoding '{}' failed: {}", query, e);
                    None
                }
            };

            customer.latitude = coordinates.map(|c| c.0);
            customer.longitude = coordinates.map(|c| c.1);
            if coordinates.is_some() {
                located += 1;
            }

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Geocoding complete");
        }

        info!("Located {}/{} customers", located, customers.len());
        located
    }
}

fn customer_query(customer: &Customer) -> String {
    format!("{}, {}, Brasil", customer.city, customer.state)
}
