// calendar arithmetic for rendering Unix seconds as ISO 8601 UTC

pub const SECS_PER_DAY: i64 = 86400;

// 1970-01-01
const UNIX_MJD: i64 = 40587;

#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Gregorian(pub i64, pub i64, pub i64);

impl std::fmt::Display for Gregorian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // expanded representation, as ECMAScript does it
        if (0..=9999).contains(&self.year()) {
            write!(f, "{:04}", self.year())?;
        } else if self.year() < 0 {
            write!(f, "-{:06}", -self.year())?;
        } else {
            write!(f, "+{:06}", self.year())?;
        }
        write!(f, "-{:02}-{:02}", self.month(), self.day())
    }
}

impl Gregorian {
    pub fn year(self) -> i64 {
        self.0
    }
    pub fn month(self) -> i64 {
        self.1
    }
    pub fn day(self) -> i64 {
        self.2
    }
    pub const fn mjd(self) -> MJD {
        let Gregorian(y, m, d) = self;
        let (y, m) = if m > 2 { (y, m + 1) } else { (y - 1, m + 13) };
        MJD(days_in_years(y) + muldiv(m, 153, 5) + d - 679004)
    }
    /// Unix seconds at midnight UTC at the start of this date.
    pub const fn unix(self) -> i64 {
        (self.mjd().0 - UNIX_MJD) * SECS_PER_DAY
    }
    /// The UTC date containing the Unix time `unix`.
    pub fn from_unix(unix: i64) -> Gregorian {
        Gregorian::from(MJD(UNIX_MJD + unix.div_euclid(SECS_PER_DAY)))
    }
}

impl From<MJD> for Gregorian {
    fn from(mjd: MJD) -> Gregorian {
        let mut d = mjd.0 + 678881;
        let mut y = muldiv(d, 400, 146097) + 1;
        y -= (days_in_years(y) > d) as i64;
        d -= days_in_years(y) - 31;
        let m = muldiv(d, 17, 520);
        d -= muldiv(m, 520, 17);
        if m > 10 {
            Gregorian(y + 1, m - 10, d)
        } else {
            Gregorian(y, m + 2, d)
        }
    }
}

impl From<Gregorian> for MJD {
    fn from(date: Gregorian) -> MJD {
        date.mjd()
    }
}

const fn days_in_years(y: i64) -> i64 {
    muldiv(y, 1461, 4) - muldiv(y, 1, 100) + muldiv(y, 1, 400)
}

const fn muldiv(var: i64, mul: i64, div: i64) -> i64 {
    (var * mul).div_euclid(div)
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct MJD(i64);

impl std::fmt::Display for MJD {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} mjd {}", Gregorian::from(*self), self.0)
    }
}

impl std::fmt::Debug for MJD {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MJD({})", self)
    }
}

impl From<i64> for MJD {
    fn from(mjd: i64) -> MJD {
        MJD(mjd)
    }
}

/// Render whole Unix seconds as `YYYY-MM-DDTHH:MM:SS.000Z`.
pub fn iso8601(unix: i64) -> String {
    let date = Gregorian::from_unix(unix);
    let secs = unix.rem_euclid(SECS_PER_DAY);
    format!(
        "{}T{:02}:{:02}:{:02}.000Z",
        date,
        secs / 3600,
        secs / 60 % 60,
        secs % 60
    )
}
