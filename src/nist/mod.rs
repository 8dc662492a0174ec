// fetch and parse leap-seconds.list, and keep the shared table fresh

mod parse;

use anyhow::{anyhow, Context};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::LeapConfig;
use crate::date::Gregorian;
use crate::gps::GPS_EPOCH;
use crate::leapsecs::*;
use parse::Line;

pub const IANA_URL: &str = "https://data.iana.org/time-zones/data/leap-seconds.list";
pub const IERS_URL: &str = "https://hpiers.obspm.fr/iers/bul/bulc/ntp/leap-seconds.list";
pub const NIST_URL: &str = "ftp://ftp.nist.gov/pub/time/leap-seconds.list";

// seconds from 1900-01-01 to 1970-01-01
pub const NTP_UNIX_OFFSET: i64 = 2208988800;

// TAI-UTC at the GPS epoch
const GPS_TAI_UTC: i64 = 19;

pub fn ntp2unix(ntp: i64) -> i64 {
    ntp - NTP_UNIX_OFFSET
}

/// The parts of a leap-seconds.list we use.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Feed {
    pub updated: Option<i64>,
    pub expires: Option<i64>,
    /// NTP timestamp and TAI-UTC from each data line
    pub leaps: Vec<(i64, i64)>,
}

impl Feed {
    /// Unix times of the leap seconds that moved GPS away from UTC, that
    /// is, those after the GPS epoch when TAI-UTC was already 19.
    pub fn leap_epochs(&self) -> Vec<i64> {
        self.leaps
            .iter()
            .filter(|&&(_, dtai)| dtai - GPS_TAI_UTC > 0)
            .map(|&(ntp, _)| ntp2unix(ntp))
            .filter(|&unix| unix >= GPS_EPOCH)
            .collect()
    }

    pub fn updated_date(&self) -> Option<Gregorian> {
        self.updated.map(|ntp| Gregorian::from_unix(ntp2unix(ntp)))
    }

    pub fn expiry_date(&self) -> Option<Gregorian> {
        self.expires.map(|ntp| Gregorian::from_unix(ntp2unix(ntp)))
    }
}

pub fn read_bytes(data: &[u8]) -> Result<Feed> {
    read_str(std::str::from_utf8(data)?)
}

pub fn read_str(text: &str) -> Result<Feed> {
    let lines = match parse::parse(text) {
        Ok((_, lines)) => lines,
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
            return Err(Error::Nom(nom::error::convert_error(text, err)))
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(Error::Nom("incomplete input".to_owned()))
        }
    };
    let mut feed = Feed::default();
    for line in lines {
        match line {
            Line::Updated(ntp) => feed.updated = Some(ntp),
            Line::Expires(ntp) => feed.expires = Some(ntp),
            Line::Leap(ntp, dtai) => feed.leaps.push((ntp, dtai)),
            Line::Ignore => (),
        }
    }
    Ok(feed)
}

pub fn read_file(name: &Path) -> anyhow::Result<Vec<u8>> {
    let ctx = || format!("failed to read {}", name.display());
    let mut fh = std::fs::File::open(name).with_context(ctx)?;
    let mut data = Vec::new();
    fh.read_to_end(&mut data).with_context(ctx)?;
    Ok(data)
}

pub fn read_url(url: &str, timeout: Duration) -> anyhow::Result<Vec<u8>> {
    let mut data = Vec::new();
    curl_get(url, timeout, &mut data)
        .with_context(|| format!("failed to fetch {}", url))?;
    Ok(data)
}

// curl abandons the transfer when the timeout expires
fn curl_get(
    url: &str,
    timeout: Duration,
    buffer: &mut Vec<u8>,
) -> std::result::Result<(), curl::Error> {
    let mut ua = curl::easy::Easy::new();
    ua.useragent(&format!(
        "leapconv/0 curl/{}",
        curl::Version::get().version()
    ))?;
    ua.fail_on_error(true)?;
    ua.follow_location(true)?;
    ua.timeout(timeout)?;
    ua.url(url)?;
    let mut xfer = ua.transfer();
    xfer.write_function(|chunk| {
        buffer.extend_from_slice(chunk);
        Ok(chunk.len())
    })?;
    xfer.perform()?;
    Ok(())
}

fn checked(data: &[u8]) -> anyhow::Result<(Feed, Vec<i64>)> {
    let feed = read_bytes(data)?;
    let epochs = feed.leap_epochs();
    if epochs.is_empty() {
        return Err(Error::Empty.into());
    }
    Ok((feed, epochs))
}

/// A leap second list and where it came from.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub source: String,
    pub feed: Feed,
    pub epochs: Vec<i64>,
}

/// Try the local copy (if any) and then each URL in turn. The first source
/// that yields a non-empty list wins. A list fetched from the network is
/// saved as the local copy for next time.
pub fn fetch(config: &LeapConfig) -> anyhow::Result<Fetched> {
    if let Some(file) = &config.file {
        tracing::debug!(file = %file.display(), "reading leap seconds");
        match read_file(file).and_then(|data| checked(&data)) {
            Ok((feed, epochs)) => {
                let source = file.display().to_string();
                return Ok(Fetched { source, feed, epochs });
            }
            Err(err) => tracing::debug!("{:#}", err),
        }
    }
    for url in &config.sources {
        tracing::debug!(url = %url, "fetching leap seconds");
        let data = match read_url(url, config.timeout()) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("{:#}", err);
                continue;
            }
        };
        let (feed, epochs) = match checked(&data) {
            Ok(it) => it,
            Err(err) => {
                tracing::warn!(url = %url, "{:#}", err);
                continue;
            }
        };
        if let Some(file) = &config.file {
            if let Err(err) = std::fs::write(file, &data) {
                tracing::warn!(file = %file.display(), "failed to save: {}", err);
            }
        }
        return Ok(Fetched { source: url.clone(), feed, epochs });
    }
    Err(anyhow!("no leap second source succeeded"))
}

/// Outcome of a refresh, for whoever shows status to the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Refresh {
    Fetched {
        source: String,
        entries: usize,
        updated: Option<Gregorian>,
        expires: Option<Gregorian>,
    },
    Unchanged {
        entries: usize,
    },
}

impl std::fmt::Display for Refresh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Refresh::Fetched { source, entries, updated, expires } => {
                write!(f, "Leap seconds updated from {} ({} entries", source, entries)?;
                if let Some(date) = updated {
                    write!(f, ", published {}", date)?;
                }
                if let Some(date) = expires {
                    write!(f, ", valid until {}", date)?;
                }
                write!(f, ").")
            }
            Refresh::Unchanged { entries } => write!(
                f,
                "Using the current leap second table ({} entries).",
                entries
            ),
        }
    }
}

/// Fetch a new table and swap it in. Any failure leaves the current
/// table in place.
pub fn refresh(table: &Table, config: &LeapConfig) -> Refresh {
    let unchanged = || Refresh::Unchanged { entries: table.current().len() };
    let fetched = match fetch(config) {
        Ok(fetched) => fetched,
        Err(err) => {
            tracing::warn!("keeping current leap second table: {:#}", err);
            return unchanged();
        }
    };
    match table.replace(fetched.epochs) {
        Ok(entries) => Refresh::Fetched {
            source: fetched.source,
            entries,
            updated: fetched.feed.updated_date(),
            expires: fetched.feed.expiry_date(),
        },
        Err(_) => unchanged(),
    }
}

/// Run `refresh` on a background thread.
pub fn spawn_refresh(table: Arc<Table>, config: LeapConfig) -> JoinHandle<Refresh> {
    std::thread::spawn(move || refresh(&table, &config))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    const LIST: &str = "\
#	leap-seconds.list, abridged
#$	 3676924800
#@	3960057600
#
2272060800	10	# 1 Jan 1972
2287785600	11	# 1 Jul 1972
2303683200	12	# 1 Jan 1973
2335219200	13	# 1 Jan 1974
2366755200	14	# 1 Jan 1975
2398291200	15	# 1 Jan 1976
2429913600	16	# 1 Jan 1977
2461449600	17	# 1 Jan 1978
2492985600	18	# 1 Jan 1979
2524521600	19	# 1 Jan 1980
2571782400	20	# 1 Jul 1981
2603318400	21	# 1 Jul 1982
2634854400	22	# 1 Jul 1983
2698012800	23	# 1 Jul 1985
2776982400	24	# 1 Jan 1988
2840140800	25	# 1 Jan 1990
2871676800	26	# 1 Jan 1991
2918937600	27	# 1 Jul 1992
2950473600	28	# 1 Jul 1993
2982009600	29	# 1 Jul 1994
3029443200	30	# 1 Jan 1996
3076704000	31	# 1 Jul 1997
3124137600	32	# 1 Jan 1999
3345062400	33	# 1 Jan 2006
3439756800	34	# 1 Jan 2009
3550089600	35	# 1 Jul 2012
3644697600	36	# 1 Jul 2015
3692217600	37	# 1 Jan 2017
#h	16edd0f0 3666784f 37db6bdd e74ced87 59af48f1
";

    fn offline(file: Option<PathBuf>) -> LeapConfig {
        LeapConfig { sources: vec![], file, ..LeapConfig::default() }
    }

    #[test]
    fn test() {
        let feed = read_str(LIST).unwrap();
        assert_eq!(Some(3676924800), feed.updated);
        assert_eq!(Some(Gregorian(2016, 7, 8)), feed.updated_date());
        assert_eq!(Some(Gregorian(2025, 6, 28)), feed.expiry_date());
        assert_eq!(28, feed.leaps.len());
        let builtin: Vec<i64> = LeapSecs::builtin().into();
        assert_eq!(builtin, feed.leap_epochs());
    }

    #[test]
    fn errors() {
        assert!(matches!(read_str("2272060800 ten\n"), Err(Error::Nom(_))));
        assert!(matches!(read_bytes(b"\xff\xfe"), Err(Error::Unicode(_))));
        let feed = read_str("# nothing here\n").unwrap();
        assert!(feed.leap_epochs().is_empty());
        // before the GPS epoch, however large the offset
        let feed = read_str("2272060800 25\n").unwrap();
        assert!(feed.leap_epochs().is_empty());
    }

    #[test]
    fn refresh_from_file() {
        let path = std::env::temp_dir().join(format!("leapconv-{}.list", std::process::id()));
        std::fs::write(&path, LIST.lines().take(20).collect::<Vec<_>>().join("\n")).unwrap();
        let table = Table::default();
        let status = refresh(&table, &offline(Some(path.clone())));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(status, Refresh::Fetched { entries: 6, .. }), "{:?}", status);
        assert_eq!(6, table.current().len());
        let message = format!(
            "Leap seconds updated from {} (6 entries, published 2016-07-08, valid until 2025-06-28).",
            path.display()
        );
        assert_eq!(message, status.to_string());
    }

    #[test]
    fn refresh_status() {
        let status = Refresh::Fetched {
            source: IANA_URL.to_owned(),
            entries: 18,
            updated: Some(Gregorian(2016, 7, 8)),
            expires: None,
        };
        assert_eq!(
            format!("Leap seconds updated from {} (18 entries, published 2016-07-08).", IANA_URL),
            status.to_string()
        );
        let status = Refresh::Fetched {
            source: IANA_URL.to_owned(),
            entries: 18,
            updated: None,
            expires: None,
        };
        assert_eq!(
            format!("Leap seconds updated from {} (18 entries).", IANA_URL),
            status.to_string()
        );
    }

    #[test]
    fn refresh_fallback() {
        let table = Arc::new(Table::default());
        let missing = std::env::temp_dir().join("leapconv-missing/leap-seconds.list");
        let status = spawn_refresh(Arc::clone(&table), offline(Some(missing))).join().unwrap();
        assert_eq!(Refresh::Unchanged { entries: 18 }, status);
        assert_eq!(LeapSecs::builtin(), *table.current());
        assert_eq!("Using the current leap second table (18 entries).", status.to_string());
    }
}
