// parse raw text into Unix seconds, GPS seconds, or GPS week and seconds

use nom::character::complete::*;
use nom::combinator::*;
use nom::sequence::*;

use crate::gps::{WeekSeconds, SECS_PER_WEEK};
use crate::leapsecs::*;

// tokens this long are Unix milliseconds
const MILLIS_DIGITS: usize = 13;

const WEEK_DIGITS: usize = 4;
const WEEK_SECONDS_DIGITS: usize = 10;

type IResult<'a, O> = nom::IResult<&'a str, O, nom::error::Error<&'a str>>;

fn signed<'a>(input: &'a str) -> IResult<'a, (Option<char>, &'a str)> {
    preceded(multispace0, pair(opt(one_of("+-")), digit1))(input)
}

/// Parse the leading integer of `raw`, ignoring anything after it.
pub fn integer(raw: &str) -> Result<i64> {
    let (sign, digits) = match signed(raw) {
        Ok((_, it)) => it,
        Err(_) => return Err(Error::NotDigits(raw.to_owned())),
    };
    let value: i64 = digits
        .parse()
        .map_err(|_| Error::Overflow(digits.to_owned()))?;
    match sign {
        Some('-') => Ok(-value),
        _ => Ok(value),
    }
}

/// True if `token` is a non-empty run of ASCII digits.
pub fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Unix seconds; 13 or more characters are taken to be milliseconds.
pub fn parse_unix(raw: &str) -> Result<i64> {
    let value = integer(raw)?;
    if raw.chars().count() >= MILLIS_DIGITS {
        Ok(value.div_euclid(1000))
    } else {
        Ok(value)
    }
}

pub fn parse_gps(raw: &str) -> Result<i64> {
    match integer(raw)? {
        gps if gps < 0 => Err(Error::Negative(gps)),
        gps => Ok(gps),
    }
}

/// `WWWWSSSSSS`, ignoring any separators between the digits.
pub fn parse_week_seconds(raw: &str) -> Result<WeekSeconds> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != WEEK_SECONDS_DIGITS {
        return Err(Error::Digits(digits.len()));
    }
    let (week, seconds) = digits.split_at(WEEK_DIGITS);
    let week = integer(week)?;
    let seconds = integer(seconds)?;
    if seconds >= SECS_PER_WEEK {
        return Err(Error::SecondsOfWeek(seconds));
    }
    Ok(WeekSeconds { week, seconds })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test() {
        assert_eq!(1700000000, integer("1700000000").unwrap());
        assert_eq!(-42, integer("-42").unwrap());
        assert_eq!(42, integer("  +42 seconds").unwrap());
        assert!(matches!(integer("seconds"), Err(Error::NotDigits(_))));
        assert!(matches!(integer(""), Err(Error::NotDigits(_))));
        assert!(matches!(integer("99999999999999999999"), Err(Error::Overflow(_))));

        assert!(is_digits("0123"));
        assert!(!is_digits(""));
        assert!(!is_digits("12 34"));
        assert!(!is_digits("١٢٣٤"));
    }

    #[test]
    fn unix() {
        assert_eq!(1700000000, parse_unix("1700000000").unwrap());
        assert_eq!(1700000000, parse_unix("1700000000999").unwrap());
        assert_eq!(170000000099, parse_unix("170000000099").unwrap());
        assert!(parse_unix("soon").is_err());
    }

    #[test]
    fn gps() {
        assert_eq!(1370000000, parse_gps("1370000000").unwrap());
        assert_eq!(0, parse_gps("0").unwrap());
        assert!(matches!(parse_gps("-1"), Err(Error::Negative(-1))));
    }

    #[test]
    fn week_seconds() {
        let ws = parse_week_seconds("2190123456").unwrap();
        assert_eq!(WeekSeconds { week: 2190, seconds: 123456 }, ws);
        let ws = parse_week_seconds("2190 123456").unwrap();
        assert_eq!(WeekSeconds { week: 2190, seconds: 123456 }, ws);
        let ws = parse_week_seconds("0000604799").unwrap();
        assert_eq!(WeekSeconds { week: 0, seconds: 604799 }, ws);
        assert!(matches!(
            parse_week_seconds("2190604800"),
            Err(Error::SecondsOfWeek(604800))
        ));
        assert!(matches!(parse_week_seconds("219012345"), Err(Error::Digits(9))));
        assert!(matches!(parse_week_seconds("21901234567"), Err(Error::Digits(11))));
    }
}
