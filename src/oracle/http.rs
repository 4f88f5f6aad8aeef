//! HTTP-backed providers: OSRM routing and Open-Elevation lookups.

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::provider::{DistanceProvider, ElevationSource};
use crate::models::Coordinate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status().as_u16();
    if !(200..=299).contains(&status) {
        let msg = response.text().unwrap_or_default();
        return Err(anyhow!("Request error (status: {}, body: {})", status, msg));
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct TableResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteSummary>,
}

#[derive(Debug, Deserialize)]
struct RouteSummary {
    distance: f64,
}

/// Road distances from an OSRM server, in kilometers.
///
/// Unroutable pairs (`null` in the table) become `f64::INFINITY`.
#[derive(Debug, Clone)]
pub struct OsrmProvider {
    base_url: String,
    profile: String,
    symmetric: bool,
    client: reqwest::blocking::Client,
}

impl OsrmProvider {
    /// Creates a provider for `base_url` (e.g. `http://router.project-osrm.org`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: "driving".into(),
            symmetric: true,
            client: client()?,
        })
    }

    /// Sets the routing profile (`driving`, `cycling`, ...).
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Keeps both directions separately instead of assuming symmetry.
    pub fn with_symmetry(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = check_status(self.client.get(url).send()?)?;
        Ok(response.json()?)
    }

    fn table_url(&self, sources: &[Coordinate], destinations: &[Coordinate]) -> String {
        let all: Vec<Coordinate> = sources.iter().chain(destinations).copied().collect();
        let src: Vec<String> = (0..sources.len()).map(|i| i.to_string()).collect();
        let dst: Vec<String> = (sources.len()..all.len()).map(|i| i.to_string()).collect();
        format!(
            "{}/table/v1/{}/{}?sources={}&destinations={}&annotations=distance",
            self.base_url,
            self.profile,
            format_coordinates(&all),
            src.join(";"),
            dst.join(";")
        )
    }
}

/// OSRM expects `lon,lat` pairs joined by `;`.
fn format_coordinates(points: &[Coordinate]) -> String {
    points
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lon(), p.lat()))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_table(response: TableResponse, rows: usize, cols: usize) -> Result<Vec<Vec<f64>>> {
    if response.code != "Ok" {
        return Err(anyhow!(
            "OSRM table error {}: {}",
            response.code,
            response.message.unwrap_or_default()
        ));
    }
    let distances = response
        .distances
        .ok_or_else(|| anyhow!("OSRM table response has no distances"))?;
    anyhow::ensure!(
        distances.len() == rows && distances.iter().all(|r| r.len() == cols),
        "OSRM table shape mismatch"
    );
    Ok(distances
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|m| m.map_or(f64::INFINITY, |meters| meters / 1000.0))
                .collect()
        })
        .collect())
}

impl DistanceProvider for OsrmProvider {
    fn table(&self, sources: &[Coordinate], destinations: &[Coordinate]) -> Result<Vec<Vec<f64>>> {
        let response: TableResponse = self.get_json(&self.table_url(sources, destinations))?;
        parse_table(response, sources.len(), destinations.len())
    }

    fn route(&self, from: Coordinate, to: Coordinate) -> Result<f64> {
        let url = format!(
            "{}/route/v1/{}/{}?overview=false",
            self.base_url,
            self.profile,
            format_coordinates(&[from, to])
        );
        let response: RouteResponse = self.get_json(&url)?;
        if response.code != "Ok" {
            return Err(anyhow!(
                "OSRM route error {}: {}",
                response.code,
                response.message.unwrap_or_default()
            ));
        }
        response
            .routes
            .first()
            .map(|r| r.distance / 1000.0)
            .ok_or_else(|| anyhow!("OSRM route response has no routes"))
    }

    fn is_symmetric(&self) -> bool {
        self.symmetric
    }
}

#[derive(Debug, Serialize)]
struct LookupLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct LookupRequest {
    locations: Vec<LookupLocation>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: f64,
}

/// Elevations from an Open-Elevation compatible lookup endpoint.
#[derive(Debug, Clone)]
pub struct OpenElevationProvider {
    url: String,
    client: reqwest::blocking::Client,
}

impl OpenElevationProvider {
    /// Public endpoint.
    pub const PUBLIC_URL: &'static str = "https://api.open-elevation.com/api/v1/lookup";

    /// Creates a provider posting to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            client: client()?,
        })
    }
}

impl ElevationSource for OpenElevationProvider {
    fn elevations(&self, points: &[Coordinate]) -> Result<Vec<f64>> {
        let body = LookupRequest {
            locations: points
                .iter()
                .map(|p| LookupLocation {
                    latitude: p.lat(),
                    longitude: p.lon(),
                })
                .collect(),
        };
        let response = check_status(self.client.post(&self.url).json(&body).send()?)?;
        let parsed: LookupResponse = response.json()?;
        anyhow::ensure!(
            parsed.results.len() == points.len(),
            "elevation lookup returned {} results for {} points",
            parsed.results.len(),
            points.len()
        );
        Ok(parsed.results.into_iter().map(|r| r.elevation).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coordinates_lon_first() {
        let s = format_coordinates(&[Coordinate::new(39.9, 32.8), Coordinate::new(40.0, 33.0)]);
        assert_eq!(s, "32.800000,39.900000;33.000000,40.000000");
    }

    #[test]
    fn test_table_url() {
        let provider = OsrmProvider::new("http://localhost:5000/").expect("client");
        let url = provider.table_url(&[Coordinate::new(1.0, 2.0)], &[Coordinate::new(3.0, 4.0)]);
        assert_eq!(
            url,
            "http://localhost:5000/table/v1/driving/2.000000,1.000000;4.000000,3.000000\
             ?sources=0&destinations=1&annotations=distance"
        );
    }

    #[test]
    fn test_parse_table_converts_meters_and_nulls() {
        let json = r#"{"code":"Ok","distances":[[0.0,1500.0],[null,0.0]]}"#;
        let response: TableResponse = serde_json::from_str(json).expect("json");
        let table = parse_table(response, 2, 2).expect("ok");
        assert_eq!(table[0][1], 1.5);
        assert!(table[1][0].is_infinite());
    }

    #[test]
    fn test_parse_table_error_code() {
        let json = r#"{"code":"TooBig","message":"Too many table coordinates"}"#;
        let response: TableResponse = serde_json::from_str(json).expect("json");
        assert!(parse_table(response, 2, 2).is_err());
    }
}
