use crate::error::ParseIssue;

use std::fmt::Write;
use std::time::Duration;

use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::one_of;
use nom::combinator::{all_consuming, map_res};
use nom::error::VerboseError;
use nom::IResult;

/// The textual shape a timestamp was written in before normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// `HH:MM:SS,mmm`, already canonical.
    Srt,
    /// `MM:SS.mmm` or `HH:MM:SS.mmm`.
    Bracketed,
}

/// Converts a timestamp to seconds, or 0 when it is not `HH:MM:SS,mmm`
/// (a `.` separator is accepted too).
pub fn parse_time(input: &str) -> f64 {
    parse_timestamp(input).unwrap_or(0.0)
}

pub fn parse_timestamp(input: &str) -> Result<f64, ParseIssue> {
    match all_consuming(timestamp)(input.trim()) {
        Ok((_, ts)) => Ok(ts.as_secs() as f64 + f64::from(ts.subsec_millis()) / 1000.0),
        Err(_) => Err(ParseIssue::MalformedTimestamp {
            entry: 0,
            text: input.to_string(),
        }),
    }
}

/// Rewrites a timestamp into the `HH:MM:SS,mmm` shape `parse_time` expects.
pub fn to_canonical_time_string(raw: &str, format: TimeFormat) -> String {
    let raw = raw.trim();
    match format {
        TimeFormat::Srt => raw.to_string(),
        TimeFormat::Bracketed => {
            let ts = raw.replacen('.', ",", 1);
            if ts.matches(':').count() == 1 {
                format!("00:{}", ts)
            } else {
                ts
            }
        }
    }
}

/// Renders seconds as `HH:MM:SS,mmm`. Negative and non-finite values render as zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let timestamp = Duration::from_millis(total_millis);

    let total_secs = timestamp.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = timestamp.subsec_millis();
    let mut out = String::with_capacity(12);
    let _ = write!(
        out,
        "{:02}:{:02}:{:02},{:03}",
        hours, minutes, seconds, millis
    );
    out
}

fn digits<'a>(
    count: usize,
) -> impl FnMut(&'a str) -> IResult<&'a str, u64, VerboseError<&'a str>> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u64>(),
    )
}

fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    let (input, hours) = digits(2)(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes) = digits(2)(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds) = digits(2)(input)?;
    let (input, _) = one_of(",.")(input)?;
    let (input, millis) = digits(3)(input)?;

    Ok((
        input,
        Duration::from_millis(
            millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    macro_rules! test_parse_time {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected): (&str, f64) = $value;

                let secs = parse_time(input);

                assert!((secs - expected).abs() < 1e-9, "{} parsed as {}", input, secs);
            }
        )*
        }
    }

    test_parse_time! {
        test_parse_time_0: ("00:00:00,000", 0.0),
        test_parse_time_1: ("00:00:01,000", 1.0),
        test_parse_time_2: ("00:00:06,500", 6.5),
        test_parse_time_3: ("01:01:01,200", 3661.2),
        test_parse_time_4: ("00:00:01.002", 1.002),
        test_parse_time_5: ("99:59:59,999", 359_999.999),
        test_parse_time_6: ("  00:00:04,000\r", 4.0),
        test_parse_time_bad_0: ("", 0.0),
        test_parse_time_bad_1: ("1:1:1,200", 0.0),
        test_parse_time_bad_2: ("00:00:01,2", 0.0),
        test_parse_time_bad_3: ("00:00:01;000", 0.0),
        test_parse_time_bad_4: ("00:01,000", 0.0),
        test_parse_time_bad_5: ("100:00:01,000", 0.0),
        test_parse_time_bad_6: ("00:00:01,0000", 0.0),
        test_parse_time_bad_7: ("aa:bb:cc,ddd", 0.0),
    }

    macro_rules! test_canonical {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, format, expected) = $value;

                assert_eq!(to_canonical_time_string(input, format), expected);
            }
        )*
        }
    }

    test_canonical! {
        test_canonical_0: ("00:01.000", TimeFormat::Bracketed, "00:00:01,000"),
        test_canonical_1: ("00:00:01.000", TimeFormat::Bracketed, "00:00:01,000"),
        test_canonical_2: ("12:34.567", TimeFormat::Bracketed, "00:12:34,567"),
        test_canonical_3: (" 00:00:01,000 ", TimeFormat::Srt, "00:00:01,000"),
    }

    macro_rules! test_format_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                assert_eq!(format_timestamp(input), expected);
            }
        )*
        }
    }

    test_format_ts! {
        test_format_ts_0: (0.0, "00:00:00,000"),
        test_format_ts_1: (0.001, "00:00:00,001"),
        test_format_ts_2: (6.5, "00:00:06,500"),
        test_format_ts_3: (59.999, "00:00:59,999"),
        test_format_ts_4: (3600.0, "01:00:00,000"),
        test_format_ts_5: (7326.159, "02:02:06,159"),
        test_format_ts_6: (360_000.001, "100:00:00,001"),
        test_format_ts_7: (-4.0, "00:00:00,000"),
        test_format_ts_8: (f64::NAN, "00:00:00,000"),
    }

    #[test]
    fn malformed_timestamp_is_reported() {
        assert_eq!(
            parse_timestamp("later"),
            Err(ParseIssue::MalformedTimestamp {
                entry: 0,
                text: "later".to_string()
            })
        );
    }

    proptest! {
        #[test]
        fn parse_time_matches_formula(h in 0u64..100, m in 0u64..100, s in 0u64..100, ms in 0u64..1000) {
            let input = format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms);
            let expected = (h * 3600 + m * 60 + s) as f64 + ms as f64 / 1000.0;

            prop_assert!((parse_time(&input) - expected).abs() < 1e-9);
        }
    }
}
