// conversions between Unix time and GPS time

use crate::leapsecs::LeapSecs;

/// Unix time of the GPS epoch, 1980-01-06T00:00:00Z
pub const GPS_EPOCH: i64 = 315964800;

pub const SECS_PER_WEEK: i64 = 604800;

// leap count used to start the search in `gps_to_unix`; the loop finds
// the real count for the instant in question
const SEED_LEAPS: i64 = 18;

// the leap count only changes by one at each table entry, so this is
// more than the loop needs to settle for any real table
const ITERATIONS: usize = 4;

impl LeapSecs {
    /// Returns `None` if the result does not fit in an `i64`.
    pub fn unix_to_gps(&self, unix: i64) -> Option<i64> {
        unix.checked_sub(GPS_EPOCH)?.checked_add(self.count(unix))
    }

    /// The leap second count depends on the Unix time we are trying to
    /// find, so iterate a fixed number of times from a seeded guess.
    pub fn gps_to_unix(&self, gps: i64) -> Option<i64> {
        let base = gps.checked_add(GPS_EPOCH)?;
        let mut unix = base.checked_sub(SEED_LEAPS)?;
        for _ in 0..ITERATIONS {
            unix = base.checked_sub(self.count(unix))?;
        }
        Some(unix)
    }
}

/// GPS time as a week number and seconds into the week.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WeekSeconds {
    pub week: i64,
    pub seconds: i64,
}

impl WeekSeconds {
    pub fn from_gps(gps: i64) -> WeekSeconds {
        WeekSeconds {
            week: gps.div_euclid(SECS_PER_WEEK),
            seconds: gps.rem_euclid(SECS_PER_WEEK),
        }
    }

    pub fn gps(self) -> Option<i64> {
        self.week.checked_mul(SECS_PER_WEEK)?.checked_add(self.seconds)
    }
}

// WWWWSSSSSS; fields wider than their padding are printed in full, and
// a week before the GPS epoch keeps its minus sign
impl std::fmt::Display for WeekSeconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:06}", self.week, self.seconds)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test() {
        let list = LeapSecs::builtin();
        assert_eq!(Some(0), list.unix_to_gps(GPS_EPOCH));
        assert_eq!(Some(GPS_EPOCH), list.gps_to_unix(0));
        // 2017-01-01, 18 leap seconds
        assert_eq!(Some(1483228800 - GPS_EPOCH + 18), list.unix_to_gps(1483228800));
        assert_eq!(Some(1700000000 - GPS_EPOCH + 18), list.unix_to_gps(1700000000));
        assert_eq!(Some(1700000000), list.gps_to_unix(1700000000 - GPS_EPOCH + 18));
    }

    #[test]
    fn round_trip() {
        let list = LeapSecs::builtin();
        let epochs: &[i64] = (&list).into();
        let mut probes = vec![GPS_EPOCH, 1000000000, 1370000000, 1700000000, 4000000000];
        for &epoch in epochs {
            probes.extend_from_slice(&[epoch - 2, epoch - 1, epoch, epoch + 1]);
        }
        for unix in probes {
            let gps = list.unix_to_gps(unix).unwrap();
            assert_eq!(Some(unix), list.gps_to_unix(gps), "unix {}", unix);
        }
    }

    #[test]
    fn fixed_point() {
        let list = LeapSecs::builtin();
        let gps = 1370000000;
        let unix = list.gps_to_unix(gps).unwrap();
        assert_eq!(unix, gps + GPS_EPOCH - list.count(unix));
        assert_eq!(1685964782, unix);
    }

    #[test]
    fn overflow() {
        let list = LeapSecs::builtin();
        assert_eq!(None, list.gps_to_unix(i64::MAX));
        assert_eq!(None, list.unix_to_gps(i64::MIN));
    }

    #[test]
    fn week_seconds() {
        for &(week, seconds) in &[(0, 0), (2190, 123456), (1, 604799), (9999, 0)] {
            let ws = WeekSeconds { week, seconds };
            assert_eq!(ws, WeekSeconds::from_gps(ws.gps().unwrap()));
        }
        assert_eq!("2190123456", WeekSeconds { week: 2190, seconds: 123456 }.to_string());
        assert_eq!("0001000042", WeekSeconds::from_gps(SECS_PER_WEEK + 42).to_string());
        assert_eq!("12345000000", WeekSeconds::from_gps(12345 * SECS_PER_WEEK).to_string());
        // the Unix epoch
        let ws = WeekSeconds::from_gps(-GPS_EPOCH);
        assert_eq!(WeekSeconds { week: -523, seconds: 345600 }, ws);
        assert_eq!("-523345600", ws.to_string());
        assert_eq!("-001604799", WeekSeconds::from_gps(-1).to_string());
    }
}
