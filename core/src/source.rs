//! Image sources
//!
//! An [`ImageSource`] produces one band image for a sky position. The survey
//! client lives in the CLI; the core only defines the seam and the per-band
//! fan-out, which tolerates individual band failures.

use std::hash::{Hash, Hasher};

use tracing::{debug, warn};

use crate::band::{BandImage, BandImages, BandSet};
use crate::coords::SkyPosition;
use crate::error::FetchError;

/// Everything that identifies one survey image.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub position: SkyPosition,
    /// Survey name, e.g. `SDSSg`
    pub survey: String,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Angular radius of the field in degrees (half the image width)
    pub radius_deg: f64,
}

// Positions and radii are validated finite values, so bitwise equality is
// equivalent to numeric equality for cache keys.
impl Eq for FetchRequest {}

impl Hash for FetchRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position.ra_deg().to_bits().hash(state);
        self.position.dec_deg().to_bits().hash(state);
        self.survey.hash(state);
        self.width.hash(state);
        self.height.hash(state);
        self.radius_deg.to_bits().hash(state);
    }
}

/// Provider of survey images.
pub trait ImageSource {
    fn fetch(&self, request: &FetchRequest) -> Result<BandImage, FetchError>;
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn fetch(&self, request: &FetchRequest) -> Result<BandImage, FetchError> {
        (**self).fetch(request)
    }
}

impl<S: ImageSource + ?Sized> ImageSource for Box<S> {
    fn fetch(&self, request: &FetchRequest) -> Result<BandImage, FetchError> {
        (**self).fetch(request)
    }
}

/// Fetch every band in `bands`, keeping band order.
///
/// A band that fails to download is logged and recorded as absent.
pub fn fetch_bands<S: ImageSource + ?Sized>(
    source: &S,
    position: SkyPosition,
    bands: &BandSet,
    size: (u32, u32),
    radius_deg: f64,
) -> BandImages {
    bands
        .iter()
        .map(|band| {
            let request = FetchRequest {
                position,
                survey: band.name().to_string(),
                width: size.0,
                height: size.1,
                radius_deg,
            };
            match source.fetch(&request) {
                Ok(image) => {
                    debug!(band = %band, width = image.width(), height = image.height(), "fetched band");
                    (band.clone(), Some(image))
                }
                Err(e) => {
                    warn!("No image for band {} at {}: {}", band, position, e);
                    (band.clone(), None)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::present_count;

    struct OnlyGreen;

    impl ImageSource for OnlyGreen {
        fn fetch(&self, request: &FetchRequest) -> Result<BandImage, FetchError> {
            if request.survey == "SDSSg" {
                Ok(BandImage::from_rows(1, 2, vec![1.0, 2.0])?)
            } else {
                Err(FetchError::Status(404))
            }
        }
    }

    #[test]
    fn test_fetch_bands_tolerates_failures() {
        let position = SkyPosition::from_degrees(10.0, 20.0).unwrap();
        let images = fetch_bands(&OnlyGreen, position, &BandSet::sdss(), (2, 1), 0.1);
        assert_eq!(images.len(), 5);
        assert_eq!(present_count(&images), 1);
        assert_eq!(images[1].0.name(), "SDSSg");
        assert!(images[1].1.is_some());
        assert!(images[0].1.is_none());
    }

    #[test]
    fn test_request_hash_matches_eq() {
        use std::collections::hash_map::DefaultHasher;

        let request = FetchRequest {
            position: SkyPosition::from_degrees(1.5, -2.5).unwrap(),
            survey: "SDSSr".into(),
            width: 300,
            height: 300,
            radius_deg: 0.2,
        };
        let hash = |r: &FetchRequest| {
            let mut hasher = DefaultHasher::new();
            r.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&request), hash(&request.clone()));

        let other = FetchRequest {
            survey: "SDSSz".into(),
            ..request.clone()
        };
        assert_ne!(request, other);
    }
}
