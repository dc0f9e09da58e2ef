//! Optional collaborators consulted during a computation.
//!
//! Providers may fail; failures are converted into [`Lookup::Unavailable`] here so
//! that nothing past this boundary has to handle provider errors.

use std::collections::BTreeMap;

use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider returned an invalid value: {0}")]
    Invalid(String),
}

/// Currency units per one euro.
pub trait RateProvider: Send + Sync {
    fn rate(&self, currency: &str) -> Result<Option<f64>, ProviderError>;
}

/// Great-circle or network distance between two named stations.
pub trait DistanceEstimator: Send + Sync {
    fn km(&self, from: &str, to: &str) -> Result<Option<f64>, ProviderError>;
}

/// Outcome of a provider call after the error boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Unknown,
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn from_result(result: Result<Option<T>, ProviderError>, provider: &'static str) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::Unknown,
            Err(error) => {
                warn!(provider, %error, "provider call failed");
                Lookup::Unavailable
            }
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Unknown | Lookup::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Lookup::Unavailable)
    }
}

/// Reference rates used when no provider is configured or the provider has no answer.
#[derive(Debug, Clone)]
pub struct StaticRates {
    rates: BTreeMap<String, f64>,
}

impl Default for StaticRates {
    fn default() -> Self {
        let rates = [
            ("EUR", 1.0),
            ("DKK", 7.46),
            ("SEK", 11.2),
            ("NOK", 11.6),
            ("PLN", 4.3),
            ("CZK", 25.0),
            ("HUF", 395.0),
            ("RON", 4.97),
            ("BGN", 1.9558),
            ("CHF", 0.95),
            ("GBP", 0.85),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();
        Self { rates }
    }
}

impl StaticRates {
    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates
            .get(&currency.trim().to_ascii_uppercase())
            .copied()
    }
}

impl RateProvider for StaticRates {
    fn rate(&self, currency: &str) -> Result<Option<f64>, ProviderError> {
        Ok(self.get(currency))
    }
}

/// Euro value of `amount`, asking `provider` first and the static table second.
pub fn eur_equivalent(
    amount: f64,
    currency: &str,
    provider: Option<&dyn RateProvider>,
    fallback: &StaticRates,
) -> Option<f64> {
    if currency.trim().eq_ignore_ascii_case("EUR") {
        return Some(amount);
    }
    let provided = provider
        .map(|provider| Lookup::from_result(provider.rate(currency), "rates"))
        .and_then(Lookup::value)
        .filter(|rate| *rate > 0.0);
    provided
        .or_else(|| fallback.get(currency))
        .map(|rate| super::domain::round2(amount / rate))
}

/// Haversine distance over a fixed station gazetteer.
#[derive(Debug, Clone)]
pub struct StationDistance {
    stations: BTreeMap<String, (f64, f64)>,
}

impl Default for StationDistance {
    fn default() -> Self {
        Self::with_stations([
            ("københavn h", (55.6726, 12.5647)),
            ("malmö c", (55.6090, 13.0006)),
            ("lund c", (55.7053, 13.1867)),
            ("helsingborg c", (56.0434, 12.6943)),
            ("göteborg c", (57.7089, 11.9733)),
            ("stockholm c", (59.3303, 18.0586)),
            ("uppsala c", (59.8586, 17.6464)),
            ("södertälje syd", (59.1630, 17.6454)),
            ("helsinki", (60.1719, 24.9414)),
            ("tampere", (61.4981, 23.7730)),
            ("berlin hbf", (52.5251, 13.3694)),
            ("hamburg hbf", (53.5530, 10.0069)),
            ("praha hl.n.", (50.0831, 14.4353)),
            ("warszawa centralna", (52.2287, 21.0031)),
        ])
    }
}

impl StationDistance {
    pub fn with_stations<I, S>(stations: I) -> Self
    where
        I: IntoIterator<Item = (S, (f64, f64))>,
        S: AsRef<str>,
    {
        Self {
            stations: stations
                .into_iter()
                .map(|(name, coords)| (name.as_ref().trim().to_lowercase(), coords))
                .collect(),
        }
    }

    fn lookup(&self, station: &str) -> Option<(f64, f64)> {
        self.stations.get(&station.trim().to_lowercase()).copied()
    }
}

impl DistanceEstimator for StationDistance {
    fn km(&self, from: &str, to: &str) -> Result<Option<f64>, ProviderError> {
        let (Some(a), Some(b)) = (self.lookup(from), self.lookup(to)) else {
            return Ok(None);
        };
        Ok(Some(haversine_km(a, b)))
    }
}

fn haversine_km((lat1, lon1): (f64, f64), (lat2, lon2): (f64, f64)) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
