use std::sync::Arc;

use tracing::{debug, info};

use crate::ephemeris::EphemerisEngine;
use crate::error::ChartError;
use crate::geocode::Geocoder;
use crate::reading::ReadingGenerator;
use crate::timezone::TimezoneResolver;
use crate::types::{BirthInput, ChartResult, Planet, PlanetReading, ZodiacSign};

/// Sequences one chart request: resolve location, resolve time, then per
/// body position → sign → explanation, and finally the holistic reading.
///
/// Geocoding, timezone, and ephemeris failures abort the run; generation
/// failures are absorbed inside [`ReadingGenerator`] and never do. There
/// are no retries anywhere in the pipeline.
pub struct ChartOrchestrator {
    geocoder: Arc<dyn Geocoder>,
    timezones: TimezoneResolver,
    ephemeris: EphemerisEngine,
    readings: ReadingGenerator,
}

impl ChartOrchestrator {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        timezones: TimezoneResolver,
        ephemeris: EphemerisEngine,
        readings: ReadingGenerator,
    ) -> Self {
        Self {
            geocoder,
            timezones,
            ephemeris,
            readings,
        }
    }

    pub async fn run(
        &self,
        input: &BirthInput,
        credential: &str,
    ) -> Result<ChartResult, ChartError> {
        input.validate()?;

        let place = format!("{}, {}", input.birth_city, input.birth_state_country);
        let coords = self.geocoder.resolve(&place).await?;

        let zone = self.timezones.resolve_zone(coords)?;
        let moment =
            self.timezones
                .to_civil_moment(&input.birth_date, &input.birth_time, zone, coords)?;
        info!(
            %place,
            zone = %zone,
            offset_minutes = moment.utc_offset_minutes,
            "birth moment resolved"
        );

        let mut readings = Vec::with_capacity(Planet::ALL.len());
        for planet in Planet::ALL {
            let position = self.ephemeris.position(planet, &moment).await?;
            let sign = ZodiacSign::from_longitude(position.longitude);
            debug!(
                planet = %planet,
                longitude = position.longitude,
                latitude = position.latitude,
                retrograde = position.is_retrograde(),
                sign = %sign,
                "position computed"
            );
            let explanation = self.readings.explain(planet, sign, credential).await;
            readings.push(PlanetReading {
                planet,
                position,
                sign,
                explanation,
            });
        }

        let pairs: Vec<(Planet, ZodiacSign)> =
            readings.iter().map(|r| (r.planet, r.sign)).collect();
        let holistic_reading = self.readings.synthesize(&pairs, credential).await;

        Ok(ChartResult {
            readings,
            holistic_reading,
        })
    }
}
