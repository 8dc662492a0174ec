use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::date::*;

// Dates on which GPS time moved one more second ahead of UTC. The list
// starts after the GPS epoch, so the 19 seconds of TAI-UTC that were
// already in effect in January 1980 are not counted.
const BUILTIN: [Gregorian; 18] = [
    Gregorian(1981, 7, 1),
    Gregorian(1982, 7, 1),
    Gregorian(1983, 7, 1),
    Gregorian(1985, 7, 1),
    Gregorian(1988, 1, 1),
    Gregorian(1990, 1, 1),
    Gregorian(1991, 1, 1),
    Gregorian(1992, 7, 1),
    Gregorian(1993, 7, 1),
    Gregorian(1994, 7, 1),
    Gregorian(1996, 1, 1),
    Gregorian(1997, 7, 1),
    Gregorian(1999, 1, 1),
    Gregorian(2006, 1, 1),
    Gregorian(2009, 1, 1),
    Gregorian(2012, 7, 1),
    Gregorian(2015, 7, 1),
    Gregorian(2017, 1, 1),
];

/// Unix seconds at which each leap second took effect, strictly increasing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeapSecs(Vec<i64>);

impl LeapSecs {
    pub fn builtin() -> LeapSecs {
        LeapSecs(BUILTIN.iter().map(|date| date.unix()).collect())
    }

    /// Number of leap seconds in effect at `unix`, i.e. the number of
    /// entries that are less than or equal to it.
    pub fn count(&self, unix: i64) -> i64 {
        self.0.partition_point(|&epoch| epoch <= unix) as i64
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for LeapSecs {
    fn default() -> LeapSecs {
        LeapSecs::builtin()
    }
}

impl<'a> From<&'a LeapSecs> for &'a [i64] {
    fn from(s: &'a LeapSecs) -> &'a [i64] {
        &s.0
    }
}

impl From<LeapSecs> for Vec<i64> {
    fn from(s: LeapSecs) -> Vec<i64> {
        s.0
    }
}

impl TryFrom<Vec<i64>> for LeapSecs {
    type Error = Error;

    fn try_from(mut list: Vec<i64>) -> Result<LeapSecs> {
        if list.is_empty() {
            return Err(Error::Empty);
        }
        list.sort_unstable();
        list.dedup();
        Ok(LeapSecs(list))
    }
}

impl std::fmt::Display for LeapSecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, &epoch) in self.0.iter().enumerate() {
            let date = Gregorian::from_unix(epoch);
            writeln!(f, "{:2} {} {}", i + 1, date, epoch)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////

/// The leap second table shared by every conversion.
///
/// Readers take a snapshot with [`Table::current`] and keep using it for
/// the rest of their call, so a concurrent [`Table::replace`] is never
/// observed half way through a conversion.
#[derive(Debug)]
pub struct Table(RwLock<Arc<LeapSecs>>);

impl Default for Table {
    fn default() -> Table {
        Table::new(LeapSecs::builtin())
    }
}

impl Table {
    pub fn new(list: LeapSecs) -> Table {
        Table(RwLock::new(Arc::new(list)))
    }

    pub fn current(&self) -> Arc<LeapSecs> {
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new list of leap second epochs, which need not be sorted.
    /// An empty list is rejected and the current table is kept.
    pub fn replace(&self, entries: Vec<i64>) -> Result<usize> {
        let list = match LeapSecs::try_from(entries) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!("keeping current leap second table: {}", err);
                return Err(err);
            }
        };
        let count = list.len();
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(list);
        tracing::info!(entries = count, "replaced leap second table");
        Ok(count)
    }
}

////////////////////////////////////////////////////////////////////////

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("expected 10 digits of GPS week and seconds, found {0}")]
    Digits(usize),
    #[error("leap seconds list is empty")]
    Empty,
    #[error("unknown input mode {0:?}")]
    Mode(String),
    #[error("GPS seconds are negative ({0})")]
    Negative(i64),
    #[error("expected digits, found {0:?}")]
    NotDigits(String),
    #[error("parse error {0}")]
    Nom(String),
    #[error("number out of range ({0})")]
    Overflow(String),
    #[error("seconds of week out of range ({0} >= 604800)")]
    SecondsOfWeek(i64),
    #[error("{0}")]
    Unicode(#[from] std::str::Utf8Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test() {
        let list = LeapSecs::builtin();
        assert_eq!(18, list.len());
        let epochs: &[i64] = (&list).into();
        assert!(epochs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(362793600, epochs[0]);
        assert_eq!(1483228800, epochs[17]);
    }

    #[test]
    fn count() {
        let list = LeapSecs::builtin();
        assert_eq!(0, list.count(315964800));
        assert_eq!(0, list.count(362793599));
        assert_eq!(1, list.count(362793600));
        assert_eq!(17, list.count(1483228799));
        assert_eq!(18, list.count(1483228800));
        assert_eq!(18, list.count(i64::MAX));
        assert_eq!(0, list.count(i64::MIN));

        // steps of exactly one, and only at table entries
        let epochs: &[i64] = (&list).into();
        for (i, &epoch) in epochs.iter().enumerate() {
            assert_eq!(i as i64, list.count(epoch - 1));
            assert_eq!(i as i64 + 1, list.count(epoch));
        }
    }

    #[test]
    fn replace() {
        let table = Table::default();
        let before = table.current();
        assert!(matches!(table.replace(vec![]), Err(Error::Empty)));
        assert_eq!(18, table.current().len());

        let count = table.replace(vec![1483228800, 362793600, 362793600]);
        assert_eq!(2, count.unwrap());
        let after = table.current();
        let epochs: &[i64] = (&*after).into();
        assert_eq!(&[362793600_i64, 1483228800][..], epochs);

        // the old snapshot is untouched
        assert_eq!(18, before.len());
        assert_eq!(2, after.count(i64::MAX));
    }
}
