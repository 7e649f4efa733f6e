use std::fmt;

use serde::Deserialize;

use crate::error::ChartError;

/// The ten bodies of a natal chart, in the fixed order readings are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Planet {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Planet {
    pub const ALL: [Planet; 10] = [
        Planet::Sun,
        Planet::Moon,
        Planet::Mercury,
        Planet::Venus,
        Planet::Mars,
        Planet::Jupiter,
        Planet::Saturn,
        Planet::Uranus,
        Planet::Neptune,
        Planet::Pluto,
    ];

    /// Swiss Ephemeris body id (SE_SUN..SE_PLUTO).
    pub const fn swe_id(self) -> i32 {
        match self {
            Planet::Sun => 0,
            Planet::Moon => 1,
            Planet::Mercury => 2,
            Planet::Venus => 3,
            Planet::Mars => 4,
            Planet::Jupiter => 5,
            Planet::Saturn => 6,
            Planet::Uranus => 7,
            Planet::Neptune => 8,
            Planet::Pluto => 9,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Planet::Sun => "Sun",
            Planet::Moon => "Moon",
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
            Planet::Pluto => "Pluto",
        }
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Twelve fixed 30° ecliptic-longitude buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Map an ecliptic longitude in degrees to its sign. Total over all
    /// finite inputs: the longitude is normalized into [0,360) first.
    pub fn from_longitude(longitude_deg: f64) -> Self {
        let normalized = longitude_deg.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
        let index = ((normalized / 30.0) as usize).min(11);
        Self::ALL[index]
    }

    pub const fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Birth fields as supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct BirthInput {
    pub birth_date: String,
    pub birth_time: String,
    pub birth_city: String,
    pub birth_state_country: String,
}

impl BirthInput {
    /// All four fields must be present and non-blank before any external
    /// call is made.
    pub fn validate(&self) -> Result<(), ChartError> {
        let fields = [
            ("birth_date", &self.birth_date),
            ("birth_time", &self.birth_time),
            ("birth_city", &self.birth_city),
            ("birth_state_country", &self.birth_state_country),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ChartError::InvalidInput(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Geographic position of the birthplace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A local civil timestamp plus the UTC offset in effect at that instant.
/// The local fields and the offset together pin down a single instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CivilBirthMoment {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub utc_offset_minutes: i32,
    pub coordinates: Coordinates,
}

/// Topocentric ecliptic position of one body, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetPosition {
    /// Ecliptic longitude, normalized into [0,360).
    pub longitude: f64,
    pub latitude: f64,
    /// Degrees per day in longitude; negative while retrograde.
    pub speed_longitude: f64,
}

impl PlanetPosition {
    pub fn is_retrograde(&self) -> bool {
        self.speed_longitude < 0.0
    }
}

/// One body's placement plus its generated reading.
#[derive(Debug, Clone)]
pub struct PlanetReading {
    pub planet: Planet,
    pub position: PlanetPosition,
    pub sign: ZodiacSign,
    pub explanation: String,
}

/// The sole output artifact of one orchestration run. Readings are in
/// [`Planet::ALL`] order.
#[derive(Debug, Clone)]
pub struct ChartResult {
    pub readings: Vec<PlanetReading>,
    pub holistic_reading: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_boundaries() {
        assert_eq!(ZodiacSign::from_longitude(0.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(29.9), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(30.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(359.99), ZodiacSign::Pisces);
    }

    #[test]
    fn sign_normalization_wraps() {
        assert_eq!(ZodiacSign::from_longitude(360.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(725.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(-30.0), ZodiacSign::Sagittarius);
        // Epsilon below the wrap point sits at the top of Pisces, even
        // though rem_euclid rounds the remainder up to exactly 360.0.
        assert_eq!(ZodiacSign::from_longitude(-1e-16), ZodiacSign::Pisces);
    }

    #[test]
    fn sign_periodicity() {
        for k in [-2i32, -1, 0, 1, 2] {
            for base in [0.0f64, 15.0, 145.5, 299.99] {
                assert_eq!(
                    ZodiacSign::from_longitude(base),
                    ZodiacSign::from_longitude(base + 360.0 * f64::from(k)),
                    "longitude {base} shifted by {k} turns"
                );
            }
        }
    }

    #[test]
    fn every_bucket_is_distinct() {
        let signs: Vec<ZodiacSign> = (0..12)
            .map(|i| ZodiacSign::from_longitude(f64::from(i) * 30.0 + 0.5))
            .collect();
        for (i, sign) in signs.iter().enumerate() {
            assert_eq!(*sign, ZodiacSign::ALL[i]);
        }
    }

    #[test]
    fn planet_order_and_ids() {
        assert_eq!(Planet::ALL.len(), 10);
        assert_eq!(Planet::ALL[0], Planet::Sun);
        assert_eq!(Planet::ALL[9], Planet::Pluto);
        for (i, planet) in Planet::ALL.iter().enumerate() {
            assert_eq!(planet.swe_id(), i as i32);
        }
    }

    #[test]
    fn blank_input_rejected() {
        let input = BirthInput {
            birth_date: "1990-06-15".into(),
            birth_time: "14:30".into(),
            birth_city: "  ".into(),
            birth_state_country: "France".into(),
        };
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("birth_city"));
    }
}
