//! Survey cutouts from NASA SkyView

use std::time::Duration;

use tracing::{debug, info};

use skysweep_core::{BandImage, FetchError, FetchRequest, ImageSource};

use crate::fits;

const RUNQUERY_URL: &str = "https://skyview.gsfc.nasa.gov/current/cgi/runquery.pl";
const TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking SkyView client returning FITS cutouts.
pub struct SkyView {
    client: reqwest::blocking::Client,
    url: String,
}

impl SkyView {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_url(RUNQUERY_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!("skysweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// Query parameters for one cutout.
fn query(request: &FetchRequest) -> Vec<(&'static str, String)> {
    vec![
        (
            "Position",
            format!(
                "{:.6},{:.6}",
                request.position.ra_deg(),
                request.position.dec_deg()
            ),
        ),
        ("Coordinates", "J2000".to_string()),
        ("Survey", request.survey.clone()),
        ("Pixels", format!("{},{}", request.width, request.height)),
        // SkyView takes the full field width; the request carries its radius
        ("Size", format!("{}", 2.0 * request.radius_deg)),
        ("Return", "FITS".to_string()),
    ]
}

impl ImageSource for SkyView {
    fn fetch(&self, request: &FetchRequest) -> Result<BandImage, FetchError> {
        debug!(survey = %request.survey, position = %request.position, "requesting cutout");

        let response = self
            .client
            .get(&self.url)
            .query(&query(request))
            .send()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .map_err(|e| FetchError::Http(e.to_string()))?;
        info!("Downloaded {} ({} bytes)", request.survey, bytes.len());
        fits::decode_band(&bytes)
    }
}
