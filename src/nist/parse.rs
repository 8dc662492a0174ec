use nom::branch::*;
use nom::bytes::complete::*;
use nom::character::complete::*;
use nom::combinator::*;
use nom::error::VerboseError;
use nom::multi::*;
use nom::sequence::*;
use std::str::FromStr;

type Result<'a, O> = nom::IResult<&'a str, O, VerboseError<&'a str>>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum Line {
    Updated(i64),
    Expires(i64),
    // NTP timestamp, TAI-UTC
    Leap(i64, i64),
    Ignore,
}

fn dec64<'a>(input: &'a str) -> Result<'a, i64> {
    map_res(digit1, i64::from_str)(input)
}

fn updated<'a>(input: &'a str) -> Result<'a, Line> {
    map(
        delimited(pair(tag("#$"), space0), dec64, not_line_ending),
        Line::Updated,
    )(input)
}

fn expires<'a>(input: &'a str) -> Result<'a, Line> {
    map(
        delimited(pair(tag("#@"), space0), dec64, not_line_ending),
        Line::Expires,
    )(input)
}

fn comment<'a>(input: &'a str) -> Result<'a, Line> {
    value(Line::Ignore, pair(tag("#"), not_line_ending))(input)
}

// anything after the second column is a comment
fn leap<'a>(input: &'a str) -> Result<'a, Line> {
    map(
        tuple((
            preceded(space0, dec64),
            preceded(space1, dec64),
            not_line_ending,
        )),
        |(ntp, dtai, _)| Line::Leap(ntp, dtai),
    )(input)
}

fn blank<'a>(input: &'a str) -> Result<'a, Line> {
    value(Line::Ignore, space0)(input)
}

fn line<'a>(input: &'a str) -> Result<'a, Line> {
    alt((updated, expires, comment, leap, blank))(input)
}

pub(super) fn parse<'a>(input: &'a str) -> Result<'a, Vec<Line>> {
    all_consuming(terminated(
        separated_list0(line_ending, line),
        multispace0,
    ))(input)
}
