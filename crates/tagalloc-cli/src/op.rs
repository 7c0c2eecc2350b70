//! Replay operations given on the command line.

use std::{fmt, num::ParseIntError, str::FromStr};

use snafu::{ResultExt as _, Snafu};

/// One step of a replay script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `alloc:<bytes>`: allocate a payload of the given size.
    Alloc(usize),
    /// `free:<n>`: free the `n`-th successful allocation, counting from 1.
    Free(usize),
    /// `check`: audit the arena structure.
    Check,
    /// `dump`: print the block listing.
    Dump,
}

#[derive(Debug, Snafu)]
pub enum ParseOpError {
    #[snafu(display(
        "unknown operation `{op}`, expected `alloc:<bytes>`, `free:<n>`, `check` or `dump`"
    ))]
    Unknown { op: String },
    #[snafu(display("`{name}` requires an argument, e.g. `{name}:16`"))]
    MissingArgument { name: &'static str },
    #[snafu(display("invalid argument `{value}` for `{name}`"))]
    InvalidNumber {
        name: &'static str,
        value: String,
        source: ParseIntError,
    },
}

fn parse_number(name: &'static str, value: &str) -> Result<usize, ParseOpError> {
    value.parse().context(InvalidNumberSnafu { name, value })
}

impl FromStr for Op {
    type Err = ParseOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        match (name, arg) {
            ("alloc", Some(arg)) => parse_number("alloc", arg).map(Self::Alloc),
            ("free", Some(arg)) => parse_number("free", arg).map(Self::Free),
            ("alloc", None) => MissingArgumentSnafu { name: "alloc" }.fail(),
            ("free", None) => MissingArgumentSnafu { name: "free" }.fail(),
            ("check", None) => Ok(Self::Check),
            ("dump", None) => Ok(Self::Dump),
            _ => UnknownSnafu { op: s }.fail(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(size) => write!(f, "alloc:{size}"),
            Self::Free(number) => write!(f, "free:{number}"),
            Self::Check => f.write_str("check"),
            Self::Dump => f.write_str("dump"),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ops() {
        assert_eq!("alloc:128".parse::<Op>().unwrap(), Op::Alloc(128));
        assert_eq!("free:3".parse::<Op>().unwrap(), Op::Free(3));
        assert_eq!("check".parse::<Op>().unwrap(), Op::Check);
        assert_eq!("dump".parse::<Op>().unwrap(), Op::Dump);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "alloc".parse::<Op>(),
            Err(ParseOpError::MissingArgument { name: "alloc" })
        ));
        assert!(matches!(
            "free:x".parse::<Op>(),
            Err(ParseOpError::InvalidNumber { name: "free", .. })
        ));
        assert!(matches!(
            "free:-1".parse::<Op>(),
            Err(ParseOpError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "dump:1".parse::<Op>(),
            Err(ParseOpError::Unknown { .. })
        ));
        assert!(matches!(
            "realloc:8".parse::<Op>(),
            Err(ParseOpError::Unknown { .. })
        ));
    }

    #[test]
    fn test_display_round_trips() {
        for op in [Op::Alloc(7), Op::Free(1), Op::Check, Op::Dump] {
            assert_eq!(op.to_string().parse::<Op>().unwrap(), op);
        }
    }

    #[test]
    fn test_error_message() {
        let err = "alloc:lots".parse::<Op>().unwrap_err();
        assert_eq!(err.to_string(), "invalid argument `lots` for `alloc`");
    }
}
