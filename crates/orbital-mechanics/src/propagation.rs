//! Propagation of element sets to state vectors
//!
//! [`Propagator`] is the seam the track pipeline works against;
//! [`Sgp4Propagator`] is the production implementation on top of the `sgp4`
//! crate.

use crate::{ElementSet, JulianDate, PropagationError};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Earth rotation rate (rad/s)
const EARTH_ROTATION_RATE_RAD_S: f64 = 7.292115146706979e-5;

/// Position (km) and velocity (km/s) at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

/// Turns an element set plus an instant into a state vector.
///
/// `prepare` runs once per satellite per work unit so that expensive
/// initialization is not repeated for every instant. Implementations are
/// shared read-only across parallel workers.
pub trait Propagator: Send + Sync {
    type Model: Send;

    fn prepare(&self, elements: &ElementSet) -> Result<Self::Model, PropagationError>;

    fn propagate(
        &self,
        model: &Self::Model,
        time: JulianDate,
    ) -> Result<StateVector, PropagationError>;
}

/// Frame of the state vectors returned by [`Sgp4Propagator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFrame {
    /// Rotated into the Earth-fixed frame by Greenwich mean sidereal time
    #[default]
    EarthFixed,
    /// Raw SGP4 output (true equator, mean equinox)
    Teme,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Propagator {
    frame: OutputFrame,
}

pub struct Sgp4Model {
    constants: sgp4::Constants,
    epoch: JulianDate,
}

impl Sgp4Propagator {
    pub fn new(frame: OutputFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> OutputFrame {
        self.frame
    }
}

impl Propagator for Sgp4Propagator {
    type Model = Sgp4Model;

    fn prepare(&self, elements: &ElementSet) -> Result<Sgp4Model, PropagationError> {
        let parsed = sgp4::Elements::from_tle(
            Some(elements.name.clone()),
            elements.line1.as_bytes(),
            elements.line2.as_bytes(),
        )
        .map_err(|e| PropagationError::InvalidElements(format!("{:?}", e)))?;

        let constants = sgp4::Constants::from_elements(&parsed)
            .map_err(|e| PropagationError::InvalidElements(format!("{:?}", e)))?;

        Ok(Sgp4Model {
            constants,
            epoch: JulianDate::from_naive_utc(parsed.datetime),
        })
    }

    fn propagate(
        &self,
        model: &Sgp4Model,
        time: JulianDate,
    ) -> Result<StateVector, PropagationError> {
        let minutes_since_epoch = time.minutes_since(&model.epoch);

        let prediction = model
            .constants
            .propagate(minutes_since_epoch)
            .map_err(|e| PropagationError::Propagation(format!("{:?}", e)))?;

        let teme = StateVector {
            position: Vector3::from(prediction.position),
            velocity: Vector3::from(prediction.velocity),
        };

        Ok(match self.frame {
            OutputFrame::Teme => teme,
            OutputFrame::EarthFixed => teme_to_earth_fixed(&teme, time.gmst()),
        })
    }
}

/// Rotate a TEME state into the Earth-fixed frame.
///
/// Polar motion is ignored. Velocity is corrected for the frame rotation.
pub fn teme_to_earth_fixed(state: &StateVector, gmst_rad: f64) -> StateVector {
    let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), -gmst_rad);
    let omega = Vector3::new(0.0, 0.0, EARTH_ROTATION_RATE_RAD_S);

    let position = rotation * state.position;
    let velocity = rotation * state.velocity - omega.cross(&position);

    StateVector { position, velocity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeodeticTransform;
    use chrono::{TimeZone, Utc};

    fn iss() -> ElementSet {
        ElementSet::new(
            "ISS (ZARYA)",
            "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927",
            "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537",
        )
    }

    fn near_epoch() -> JulianDate {
        JulianDate::from_datetime(Utc.with_ymd_and_hms(2008, 9, 20, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_propagate_iss() {
        let propagator = Sgp4Propagator::default();
        let model = propagator.prepare(&iss()).unwrap();
        let state = propagator.propagate(&model, near_epoch()).unwrap();

        let radius = state.position.norm();
        assert!(radius > 6600.0 && radius < 6900.0, "radius = {radius}");

        let speed = state.velocity.norm();
        assert!(speed > 6.5 && speed < 8.0, "speed = {speed}");

        let point = GeodeticTransform::wgs84().to_geodetic(
            state.position.x,
            state.position.y,
            state.position.z,
        );
        assert!(point.altitude_km > 300.0 && point.altitude_km < 450.0);
        assert!(point.latitude.abs() <= 52.0);
    }

    #[test]
    fn test_earth_fixed_is_rotation_of_teme() {
        let teme = Sgp4Propagator::new(OutputFrame::Teme);
        let fixed = Sgp4Propagator::new(OutputFrame::EarthFixed);
        let time = near_epoch();

        let a = teme.propagate(&teme.prepare(&iss()).unwrap(), time).unwrap();
        let b = fixed.propagate(&fixed.prepare(&iss()).unwrap(), time).unwrap();

        assert!((a.position.norm() - b.position.norm()).abs() < 1e-9);
        assert!((a.position.z - b.position.z).abs() < 1e-9);
        assert!((a.velocity.z - b.velocity.z).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_direction() {
        let state = StateVector {
            position: Vector3::new(7000.0, 0.0, 0.0),
            velocity: Vector3::zeros(),
        };
        // Greenwich 90 degrees east of the TEME x axis puts the point at -90 longitude
        let rotated = teme_to_earth_fixed(&state, std::f64::consts::FRAC_PI_2);
        assert!(rotated.position.x.abs() < 1e-9);
        assert!((rotated.position.y + 7000.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_elements() {
        let propagator = Sgp4Propagator::default();
        let junk = ElementSet::new("JUNK", "1 not an element line", "2 not one either");
        let err = propagator.prepare(&junk).err().unwrap();
        assert!(matches!(err, PropagationError::InvalidElements(_)));
    }
}
