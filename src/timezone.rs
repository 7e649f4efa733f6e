use chrono::{Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike};
use chrono_tz::Tz;
use tracing::debug;
use tzf_rs::DefaultFinder;

use crate::error::ChartError;
use crate::types::{CivilBirthMoment, Coordinates};

/// Maps coordinates to an IANA zone via an embedded dataset (no network
/// call) and combines the zone with local birth date/time into a
/// [`CivilBirthMoment`].
pub struct TimezoneResolver {
    finder: DefaultFinder,
}

impl TimezoneResolver {
    /// Builds the lookup index; do this once at startup, not per request.
    pub fn new() -> Self {
        Self {
            finder: DefaultFinder::new(),
        }
    }

    pub fn resolve_zone(&self, coords: Coordinates) -> Result<Tz, ChartError> {
        if !coords.in_range() {
            return Err(ChartError::InvalidCoordinates(format!(
                "({}, {}) is outside the valid latitude/longitude ranges",
                coords.latitude, coords.longitude
            )));
        }
        let name = self.finder.get_tz_name(coords.longitude, coords.latitude);
        debug!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            zone = name,
            "timezone resolved"
        );
        name.parse::<Tz>().map_err(|_| {
            ChartError::InvalidCoordinates(format!(
                "no timezone known for ({}, {})",
                coords.latitude, coords.longitude
            ))
        })
    }

    /// Combine local date/time strings with the zone. The offset in effect
    /// at that local timestamp is taken as `chrono-tz` reports it: a
    /// nonexistent local time (DST gap) is an error, an ambiguous one (DST
    /// overlap) resolves to the earlier offset.
    pub fn to_civil_moment(
        &self,
        date: &str,
        time: &str,
        zone: Tz,
        coords: Coordinates,
    ) -> Result<CivilBirthMoment, ChartError> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| ChartError::InvalidDateTime(format!("unparseable birth_date: {e}")))?;
        let time = parse_clock_time(time)?;
        let naive = NaiveDateTime::new(date, time);

        let local = match zone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earlier, _) => earlier,
            LocalResult::None => {
                return Err(ChartError::InvalidDateTime(format!(
                    "{naive} does not exist in {zone}"
                )))
            }
        };

        let utc_offset_minutes = local.offset().fix().local_minus_utc() / 60;
        Ok(CivilBirthMoment {
            year: naive.year(),
            month: naive.month(),
            day: naive.day(),
            hour: naive.hour(),
            minute: naive.minute(),
            second: naive.second(),
            utc_offset_minutes,
            coordinates: coords,
        })
    }
}

fn parse_clock_time(time: &str) -> Result<NaiveTime, ChartError> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|e| ChartError::InvalidDateTime(format!("unparseable birth_time: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: Coordinates = Coordinates {
        latitude: 48.85,
        longitude: 2.35,
    };

    #[test]
    fn resolves_known_zones() {
        let resolver = TimezoneResolver::new();
        assert_eq!(resolver.resolve_zone(PARIS).unwrap(), Tz::Europe__Paris);

        let nyc = Coordinates {
            latitude: 40.7,
            longitude: -74.0,
        };
        assert_eq!(resolver.resolve_zone(nyc).unwrap(), Tz::America__New_York);
    }

    #[test]
    fn out_of_range_coordinates_rejected() {
        let resolver = TimezoneResolver::new();
        let bad = Coordinates {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(matches!(
            resolver.resolve_zone(bad),
            Err(ChartError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn summer_birth_gets_dst_offset() {
        let resolver = TimezoneResolver::new();
        let moment = resolver
            .to_civil_moment("1990-06-15", "14:30", Tz::Europe__Paris, PARIS)
            .unwrap();
        assert_eq!(moment.utc_offset_minutes, 120);
        assert_eq!(
            (moment.year, moment.month, moment.day, moment.hour, moment.minute),
            (1990, 6, 15, 14, 30)
        );
        assert_eq!(moment.second, 0);
    }

    #[test]
    fn winter_birth_gets_standard_offset() {
        let resolver = TimezoneResolver::new();
        let moment = resolver
            .to_civil_moment("1990-01-15", "08:45:30", Tz::Europe__Paris, PARIS)
            .unwrap();
        assert_eq!(moment.utc_offset_minutes, 60);
        assert_eq!(moment.second, 30);
    }

    #[test]
    fn unparseable_strings_rejected() {
        let resolver = TimezoneResolver::new();
        for (date, time) in [
            ("not-a-date", "14:30"),
            ("1990-06-15", "25:99"),
            ("1990-02-30", "14:30"),
        ] {
            let err = resolver
                .to_civil_moment(date, time, Tz::Europe__Paris, PARIS)
                .unwrap_err();
            assert!(
                matches!(err, ChartError::InvalidDateTime(_)),
                "{date} {time} should be InvalidDateTime, got {err}"
            );
        }
    }

    #[test]
    fn dst_gap_is_invalid() {
        // Clocks in Paris jumped 02:00 -> 03:00 on 2023-03-26.
        let resolver = TimezoneResolver::new();
        let err = resolver
            .to_civil_moment("2023-03-26", "02:30", Tz::Europe__Paris, PARIS)
            .unwrap_err();
        assert!(matches!(err, ChartError::InvalidDateTime(_)));
    }

    #[test]
    fn dst_overlap_takes_earlier_offset() {
        // 02:30 happened twice in Paris on 2023-10-29; the first pass was
        // still on summer time.
        let resolver = TimezoneResolver::new();
        let moment = resolver
            .to_civil_moment("2023-10-29", "02:30", Tz::Europe__Paris, PARIS)
            .unwrap();
        assert_eq!(moment.utc_offset_minutes, 120);
    }
}
