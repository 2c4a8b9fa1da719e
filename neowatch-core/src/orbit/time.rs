//! Calendar to continuous-time conversion.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Continuous time: fractional Julian days. Every epoch and sample time in
/// the crate uses this scale.
pub type JulianDate = f64;

/// Julian date of the J2000.0 epoch (2000-01-01T12:00:00).
pub const J2000: JulianDate = 2_451_545.0;

/// Mean length of a Julian year in days.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Convert a UTC instant into a Julian date.
///
/// January and February count as months 13 and 14 of the previous year,
/// and the Gregorian leap-century correction is applied. The fractional day
/// comes from hours, minutes and whole seconds.
pub fn to_continuous_time(instant: DateTime<Utc>) -> JulianDate {
    let mut year = f64::from(instant.year());
    let mut month = f64::from(instant.month());
    let day = f64::from(instant.day());

    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }

    let century = (year / 100.0).floor();
    let leap_correction = 2.0 - century + (century / 4.0).floor();

    let julian_day = (365.25 * (year + 4716.0)).floor()
        + (30.6001 * (month + 1.0)).floor()
        + day
        + leap_correction
        - 1524.5;

    let fraction = f64::from(instant.hour()) / 24.0
        + f64::from(instant.minute()) / 1440.0
        + f64::from(instant.second()) / 86_400.0;

    julian_day + fraction
}

/// Julian date of the current wall-clock instant.
pub fn julian_now() -> JulianDate {
    to_continuous_time(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn j2000_epoch_maps_to_reference_day() {
        let jd = to_continuous_time(utc(2000, 1, 1, 12, 0, 0));
        assert_abs_diff_eq!(jd, J2000, epsilon = 1e-9);
    }

    #[test]
    fn unix_epoch_maps_to_known_julian_date() {
        let jd = to_continuous_time(utc(1970, 1, 1, 0, 0, 0));
        assert_abs_diff_eq!(jd, 2_440_587.5, epsilon = 1e-9);
    }

    #[test]
    fn leap_day_and_march_are_contiguous() {
        let feb29 = to_continuous_time(utc(2024, 2, 29, 0, 0, 0));
        let mar1 = to_continuous_time(utc(2024, 3, 1, 0, 0, 0));
        assert_abs_diff_eq!(mar1 - feb29, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn fractional_day_tracks_clock_time() {
        let midnight = to_continuous_time(utc(2025, 6, 15, 0, 0, 0));
        let later = to_continuous_time(utc(2025, 6, 15, 18, 30, 36));
        let expected = 18.0 / 24.0 + 30.0 / 1440.0 + 36.0 / 86_400.0;
        assert_abs_diff_eq!(later - midnight, expected, epsilon = 1e-9);
    }

    #[test]
    fn century_without_leap_year_is_handled() {
        // 1900 was not a leap year: Feb 28 -> Mar 1 is one day.
        let feb28 = to_continuous_time(utc(1900, 2, 28, 0, 0, 0));
        let mar1 = to_continuous_time(utc(1900, 3, 1, 0, 0, 0));
        assert_abs_diff_eq!(mar1 - feb28, 1.0, epsilon = 1e-9);
    }
}
