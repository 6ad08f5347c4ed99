use serde::{Deserialize, Serialize};

/// Equinox written when a coordinate pair carries none
pub const DEFAULT_EQUINOX: f64 = 2000.0;

/// An equatorial position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCoord {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub equinox: Option<f64>,
}

/// Right ascension split into hours, minutes and seconds of time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hms {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

/// Declination split into sign, degrees, arcminutes and arcseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub negative: bool,
    pub degrees: u32,
    pub arcminutes: u32,
    pub arcseconds: f64,
}

const MICROS_PER_UNIT: f64 = 3_600_000_000.0;

impl SkyCoord {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra_deg,
            dec_deg,
            equinox: None,
        }
    }

    pub fn with_equinox(mut self, equinox: f64) -> Self {
        self.equinox = Some(equinox);
        self
    }

    /// Compose from sexagesimal parts
    pub fn from_sexagesimal(ra: Hms, dec: Dms, equinox: Option<f64>) -> Self {
        let hours = ra.hours as f64 + ra.minutes as f64 / 60.0 + ra.seconds / 3600.0;
        let degrees =
            dec.degrees as f64 + dec.arcminutes as f64 / 60.0 + dec.arcseconds / 3600.0;
        Self {
            ra_deg: hours * 15.0,
            dec_deg: if dec.negative { -degrees } else { degrees },
            equinox,
        }
    }

    /// Right ascension rounded to whole microseconds of time, wrapped into [0h, 24h)
    pub fn ra_hms(&self) -> Hms {
        let day = 24 * MICROS_PER_UNIT as i64;
        let micros = ((self.ra_deg / 15.0) * MICROS_PER_UNIT).round() as i64;
        let micros = micros.rem_euclid(day);
        let (hours, minutes, seconds) = split_micros(micros);
        Hms {
            hours,
            minutes,
            seconds,
        }
    }

    /// Declination rounded to whole micro-arcseconds
    pub fn dec_dms(&self) -> Dms {
        let micros = (self.dec_deg.abs() * MICROS_PER_UNIT).round() as i64;
        let (degrees, arcminutes, arcseconds) = split_micros(micros);
        Dms {
            negative: self.dec_deg < 0.0 && micros > 0,
            degrees,
            arcminutes,
            arcseconds,
        }
    }
}

fn split_micros(micros: i64) -> (u32, u32, f64) {
    let per_minute = 60_000_000;
    let per_unit = 60 * per_minute;
    let whole = (micros / per_unit) as u32;
    let minutes = ((micros % per_unit) / per_minute) as u32;
    let seconds = (micros % per_minute) as f64 / 1_000_000.0;
    (whole, minutes, seconds)
}
