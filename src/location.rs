//! Search origin providers
//!
//! Searches never read a location directly; they ask a [`LocationProvider`]
//! so that the query and render path can run without any geolocation
//! subsystem behind it.

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::models::Coordinate;

/// The simulated device location used when nothing else is configured
pub const SIMULATED_LOCATION: Coordinate =
    Coordinate::new(7.900_412_097_203_202, -72.502_959_645_818_14);

/// Capability yielding the current search origin
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Current position, or [`crate::NearbyError::LocationUnavailable`]
    async fn current_location(&self) -> Result<Coordinate>;
}

/// Always reports [`SIMULATED_LOCATION`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedLocation;

#[async_trait]
impl LocationProvider for SimulatedLocation {
    async fn current_location(&self) -> Result<Coordinate> {
        debug!(
            "Using simulated location {}",
            SIMULATED_LOCATION.format_coordinates()
        );
        Ok(SIMULATED_LOCATION)
    }
}

/// Reports a location chosen by configuration or the command line
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coordinate: Coordinate,
}

impl FixedLocation {
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinate> {
        if !self.coordinate.is_valid() {
            return Err(crate::NearbyError::location_unavailable(format!(
                "configured location ({}, {}) is out of range",
                self.coordinate.latitude, self.coordinate.longitude
            )));
        }
        Ok(self.coordinate)
    }
}
