use std::fmt;

/// Classified pipeline error — tells the HTTP layer *which* stage failed so
/// it can pick the right status code and message.
///
/// Generation-backend failures never appear here: they are absorbed at the
/// call boundary with a fixed fallback string (see `reading.rs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    /// Missing/blank birth fields or credential. Raised before any
    /// external call is made.
    InvalidInput(String),
    /// The geocoding service returned zero matches for the place text.
    LocationNotFound(String),
    /// The geocoding call failed in transit: network error, timeout,
    /// non-2xx status, or malformed payload.
    UpstreamUnavailable(String),
    /// Latitude/longitude outside the valid ranges — a precondition
    /// violation, since resolved coordinates are checked on arrival.
    InvalidCoordinates(String),
    /// Date/time strings unparseable, or the local timestamp does not
    /// exist in the resolved zone.
    InvalidDateTime(String),
    /// The ephemeris library reported an error status. Non-retryable.
    EphemerisCompute(String),
}

impl ChartError {
    /// Short variant tag for logs and the diagnostic trace field.
    pub fn kind(&self) -> &'static str {
        match self {
            ChartError::InvalidInput(_) => "InvalidInput",
            ChartError::LocationNotFound(_) => "LocationNotFound",
            ChartError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            ChartError::InvalidCoordinates(_) => "InvalidCoordinates",
            ChartError::InvalidDateTime(_) => "InvalidDateTime",
            ChartError::EphemerisCompute(_) => "EphemerisComputeError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ChartError::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            ChartError::LocationNotFound(place) => {
                write!(f, "no coordinates found for the given location: {place}")
            }
            ChartError::UpstreamUnavailable(msg) => write!(f, "geocoding unavailable: {msg}"),
            ChartError::InvalidCoordinates(msg) => write!(f, "invalid coordinates: {msg}"),
            ChartError::InvalidDateTime(msg) => write!(f, "invalid date/time: {msg}"),
            ChartError::EphemerisCompute(msg) => write!(f, "ephemeris computation failed: {msg}"),
        }
    }
}

impl std::error::Error for ChartError {}
