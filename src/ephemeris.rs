use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::{Mutex, Once};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::config::EphemerisConfig;
use crate::error::ChartError;
use crate::types::{CivilBirthMoment, Planet, PlanetPosition};

const SE_GREG_CAL: i32 = 1;
const SEFLG_SWIEPH: i32 = 2;
const SEFLG_SPEED: i32 = 256;
const SEFLG_TOPOCTR: i32 = 32768;

static SWE_INIT: Once = Once::new();

// Swiss Ephemeris keeps its state (ephemeris path, observer position) in
// process globals; every call sequence against it must hold this lock.
static SWE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Computes topocentric ecliptic positions through the Swiss Ephemeris C
/// library. With no data files configured the library falls back to its
/// built-in Moshier analytical theory.
pub struct EphemerisEngine {
    ephe_path: Option<CString>,
}

impl EphemerisEngine {
    pub fn new(config: &EphemerisConfig) -> Self {
        let ephe_path = config.ephe_path.as_deref().and_then(|p| {
            CString::new(p)
                .map_err(|_| warn!("ignoring ephe_path containing a NUL byte"))
                .ok()
        });
        Self { ephe_path }
    }

    /// Position of one body at the given civil moment, as seen from its
    /// coordinates (elevation 0). The FFI computation is blocking, so it is
    /// delegated to the blocking thread pool and awaited.
    pub async fn position(
        &self,
        planet: Planet,
        moment: &CivilBirthMoment,
    ) -> Result<PlanetPosition, ChartError> {
        let moment = moment.clone();
        let ephe_path = self.ephe_path.clone();
        tokio::task::spawn_blocking(move || compute_position(ephe_path, planet, &moment))
            .await
            .map_err(|e| ChartError::EphemerisCompute(format!("ephemeris task failed: {e}")))?
    }
}

fn compute_position(
    ephe_path: Option<CString>,
    planet: Planet,
    moment: &CivilBirthMoment,
) -> Result<PlanetPosition, ChartError> {
    let jd = julian_day_ut(moment)?;
    debug!(planet = %planet, jd, "computing ephemeris position");

    let _guard = SWE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    SWE_INIT.call_once(|| unsafe {
        match &ephe_path {
            Some(path) => libswisseph_sys::swe_set_ephe_path(path.as_ptr() as *mut _),
            None => libswisseph_sys::swe_set_ephe_path(std::ptr::null_mut()),
        }
    });

    let mut xx: [f64; 6] = [0.0; 6];
    let mut serr: [c_char; 256] = [0; 256];
    let ret = unsafe {
        libswisseph_sys::swe_set_topo(
            moment.coordinates.longitude,
            moment.coordinates.latitude,
            0.0,
        );
        libswisseph_sys::swe_calc_ut(
            jd,
            planet.swe_id(),
            SEFLG_SWIEPH | SEFLG_SPEED | SEFLG_TOPOCTR,
            xx.as_mut_ptr(),
            serr.as_mut_ptr(),
        )
    };

    if ret < 0 {
        let detail = unsafe { CStr::from_ptr(serr.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        return Err(ChartError::EphemerisCompute(format!(
            "{planet} at JD {jd}: {detail}"
        )));
    }

    Ok(PlanetPosition {
        longitude: xx[0].rem_euclid(360.0),
        latitude: xx[1],
        speed_longitude: xx[3],
    })
}

/// Julian day (UT) for the moment's instant, proleptic Gregorian. The local
/// civil fields are shifted to UTC by the stored offset before conversion.
fn julian_day_ut(moment: &CivilBirthMoment) -> Result<f64, ChartError> {
    let date = NaiveDate::from_ymd_opt(moment.year, moment.month, moment.day).ok_or_else(|| {
        ChartError::EphemerisCompute(format!(
            "invalid civil date {}-{:02}-{:02}",
            moment.year, moment.month, moment.day
        ))
    })?;
    let time = NaiveTime::from_hms_opt(moment.hour, moment.minute, moment.second).ok_or_else(
        || {
            ChartError::EphemerisCompute(format!(
                "invalid civil time {:02}:{:02}:{:02}",
                moment.hour, moment.minute, moment.second
            ))
        },
    )?;

    let utc = NaiveDateTime::new(date, time) - Duration::minutes(moment.utc_offset_minutes.into());
    let fractional_hour = f64::from(utc.hour())
        + f64::from(utc.minute()) / 60.0
        + f64::from(utc.second()) / 3600.0;

    let jd = unsafe {
        libswisseph_sys::swe_julday(
            utc.year(),
            utc.month() as i32,
            utc.day() as i32,
            fractional_hour,
            SE_GREG_CAL,
        )
    };
    Ok(jd)
}
