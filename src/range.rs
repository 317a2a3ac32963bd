use crate::history::record_timestamp;
use crate::model::{DatasetRange, Window};
use anyhow::{Result, bail};
use serde_json::Value;
use std::fmt;
use time::macros::time;
use time::{Date, Time};

const END_OF_DAY: Time = time!(23:59:59);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSubstitution {
    Earliest(Date),
    Latest(Date),
}

impl fmt::Display for BoundSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earliest(date) => write!(f, "Using earliest available date: {date}"),
            Self::Latest(date) => write!(f, "Using latest available date: {date}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub window: Window,
    pub substitutions: Vec<BoundSubstitution>,
}

pub fn dataset_range(records: &[Value]) -> Result<DatasetRange> {
    let mut stamps = records.iter().filter_map(record_timestamp);
    let Some(first) = stamps.next() else {
        bail!("no records with a parseable timestamp were loaded");
    };
    let (earliest, latest) = stamps.fold((first, first), |(earliest, latest), stamp| {
        (earliest.min(stamp), latest.max(stamp))
    });
    Ok(DatasetRange { earliest, latest })
}

/// `to` covers its whole day. Every bound, supplied or not, ends up inside the
/// dataset range; only `from` after `to` is rejected.
pub fn resolve_window(
    range: &DatasetRange,
    from: Option<Date>,
    to: Option<Date>,
) -> Result<Resolution> {
    let requested_from = from.map(|date| date.midnight().assume_utc());
    let requested_to = to.map(|date| date.with_time(END_OF_DAY).assume_utc());

    if let (Some(from), Some(to)) = (requested_from, requested_to)
        && from > to
    {
        bail!("From date {} is after to date {}", from.date(), to.date());
    }

    let mut substitutions = Vec::new();
    let from = match requested_from {
        Some(from) if from > range.latest => {
            substitutions.push(BoundSubstitution::Latest(range.latest.date()));
            range.latest
        }
        Some(from) if from >= range.earliest => from,
        _ => {
            substitutions.push(BoundSubstitution::Earliest(range.earliest.date()));
            range.earliest
        }
    };
    let to = match requested_to {
        Some(to) if to < range.earliest => {
            substitutions.push(BoundSubstitution::Earliest(range.earliest.date()));
            range.earliest
        }
        Some(to) if to <= range.latest => to,
        _ => {
            substitutions.push(BoundSubstitution::Latest(range.latest.date()));
            range.latest
        }
    };

    Ok(Resolution {
        window: Window { from, to },
        substitutions,
    })
}
