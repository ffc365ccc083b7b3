//! Rectangular latitude/longitude region
//!
//! Corners are given as (latitude, longitude) pairs, the order an operator
//! reads them off a map. The box is the independent min/max of each axis, so
//! corner winding does not matter. Regions crossing the antimeridian are not
//! representable.

use crate::{PipelineError, Result, TrackRecord};
use orbital_mechanics::GeodeticPoint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const REGION_CORNERS: usize = 4;

/// Validate latitude is in valid range
fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && lat.is_finite()
}

/// Validate longitude is in valid range
fn is_valid_longitude(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && lon.is_finite()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCorner {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCorner {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Parses `"LAT,LON"`
impl FromStr for GeoCorner {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            PipelineError::InvalidConfiguration(format!(
                "corner {:?} is not of the form LAT,LON",
                s
            ))
        };
        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let latitude = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let longitude = lon.trim().parse::<f64>().map_err(|_| invalid())?;
        Ok(Self::new(latitude, longitude))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    lon_min: f64,
    lon_max: f64,
    lat_min: f64,
    lat_max: f64,
}

impl Region {
    /// Bounding box of exactly four corners
    pub fn from_corners(corners: &[GeoCorner]) -> Result<Self> {
        if corners.len() != REGION_CORNERS {
            return Err(PipelineError::InvalidConfiguration(format!(
                "region needs {} corners, got {}",
                REGION_CORNERS,
                corners.len()
            )));
        }

        for (i, c) in corners.iter().enumerate() {
            if !is_valid_latitude(c.latitude) {
                return Err(PipelineError::InvalidConfiguration(format!(
                    "corner {} latitude {} outside [-90, 90]",
                    i + 1,
                    c.latitude
                )));
            }
            if !is_valid_longitude(c.longitude) {
                return Err(PipelineError::InvalidConfiguration(format!(
                    "corner {} longitude {} outside [-180, 180]",
                    i + 1,
                    c.longitude
                )));
            }
        }

        let lons = corners.iter().map(|c| c.longitude);
        let lats = corners.iter().map(|c| c.latitude);

        Ok(Self {
            lon_min: lons.clone().fold(f64::INFINITY, f64::min),
            lon_max: lons.fold(f64::NEG_INFINITY, f64::max),
            lat_min: lats.clone().fold(f64::INFINITY, f64::min),
            lat_max: lats.fold(f64::NEG_INFINITY, f64::max),
        })
    }

    pub fn whole_globe() -> Self {
        Self {
            lon_min: -180.0,
            lon_max: 180.0,
            lat_min: -90.0,
            lat_max: 90.0,
        }
    }

    pub fn lon_min(&self) -> f64 {
        self.lon_min
    }

    pub fn lon_max(&self) -> f64 {
        self.lon_max
    }

    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    /// Inclusive on every edge
    pub fn contains(&self, point: &GeodeticPoint) -> bool {
        (self.lon_min..=self.lon_max).contains(&point.longitude)
            && (self.lat_min..=self.lat_max).contains(&point.latitude)
    }

    pub fn filter<'a, I>(&self, records: I) -> Vec<TrackRecord>
    where
        I: IntoIterator<Item = &'a TrackRecord>,
    {
        records
            .into_iter()
            .filter(|r| self.contains(&r.position))
            .cloned()
            .collect()
    }
}
