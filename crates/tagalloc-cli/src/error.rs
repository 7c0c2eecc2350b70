//! Top-level error type and the report printed on failure.

use std::{error::Error, fmt};

use snafu::{ChainCompat, Snafu};
use tagalloc::{ArenaError, Location};

use crate::{
    replay::ReplayError,
    style::{Color, WithFg},
};

#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
pub struct GenericError {
    message: String,
    #[snafu(implicit)]
    location: Location,
    #[snafu(source(from(Box<dyn Error>, Some)))]
    source: Option<Box<dyn Error>>,
}

/// Source location recorded by the errors this binary knows about.
fn location_of(err: &(dyn Error + 'static)) -> Option<Location> {
    if let Some(err) = err.downcast_ref::<GenericError>() {
        return Some(err.location);
    }
    if let Some(err) = err.downcast_ref::<ReplayError>() {
        return Some(err.location());
    }
    err.downcast_ref::<ArenaError>().map(ArenaError::location)
}

fn write_location(
    f: &mut fmt::Formatter<'_>,
    err: &(dyn Error + 'static),
    indent: &str,
) -> fmt::Result {
    match location_of(err) {
        Some(loc) => writeln!(f, "{indent}at {}", WithFg::new(Color::DarkGray, loc)),
        None => Ok(()),
    }
}

/// Renders an error followed by its numbered causes, each with the location
/// it was raised at when known.
pub struct Report<E> {
    error: E,
}

impl<E> fmt::Display for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chain = ChainCompat::new(&self.error);
        if let Some(top) = chain.next() {
            writeln!(f, "Error: {}", WithFg::new(Color::Red, top))?;
            write_location(f, top, "  ")?;
        }
        for (index, cause) in chain.enumerate() {
            if index == 0 {
                writeln!(f)?;
                writeln!(f, "Caused by:")?;
            }
            writeln!(f, "{index:4}: {}", WithFg::new(Color::Red, cause))?;
            write_location(f, cause, "      ")?;
        }
        Ok(())
    }
}

impl<E> Report<E> {
    pub fn new(error: E) -> Self {
        Self { error }
    }
}
