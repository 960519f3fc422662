//! Builds Microsoft Graph `$filter` predicates from time constraints.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("time filter field must be 'start' or 'end', got '{0}'")]
    InvalidField(String),
    #[error("time filter direction must be 'before' or 'after', got '{0}'")]
    InvalidDirection(String),
    #[error("exactly one of a relative offset or an explicit time must be provided")]
    AmbiguousValue,
}

/// Which timestamp of the event the clause compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start,
    End,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Start => "start",
            Field::End => "end",
        }
    }
}

impl FromStr for Field {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Field::Start),
            "end" => Ok(Field::End),
            other => Err(FilterError::InvalidField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

impl FromStr for Direction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Direction::Before),
            "after" => Ok(Direction::After),
            other => Err(FilterError::InvalidDirection(other.to_string())),
        }
    }
}

/// One time constraint on a calendar query. The instant is either relative
/// (minutes from now, negative for the past) or an explicit timestamp
/// already in the calendar's wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFilter {
    pub field: Field,
    pub direction: Direction,
    minutes: Option<i64>,
    at: Option<String>,
}

impl TimeFilter {
    pub fn new(
        minutes: Option<i64>,
        at: Option<String>,
        direction: Direction,
        field: Field,
    ) -> Result<Self, FilterError> {
        if minutes.is_some() == at.is_some() {
            return Err(FilterError::AmbiguousValue);
        }
        Ok(Self {
            field,
            direction,
            minutes,
            at,
        })
    }

    pub fn relative(minutes: i64, direction: Direction, field: Field) -> Self {
        Self {
            field,
            direction,
            minutes: Some(minutes),
            at: None,
        }
    }

    pub fn absolute(at: impl Into<String>, direction: Direction, field: Field) -> Self {
        Self {
            field,
            direction,
            minutes: None,
            at: Some(at.into()),
        }
    }
}

/// Combine the filters into one `$filter` string, ANDing every clause.
///
/// `now` is sampled once by the caller and reused for every relative clause
/// so a slow build cannot skew the window.
pub fn build_filter(filters: &[TimeFilter], now: DateTime<Utc>) -> Result<String, FilterError> {
    let mut clauses = Vec::with_capacity(filters.len());

    for filter in filters {
        let stamp = match (filter.minutes, &filter.at) {
            (Some(minutes), None) => {
                let target = now + Duration::minutes(minutes);
                target.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
            }
            (None, Some(at)) => {
                // Truncate fractional seconds from wire-format timestamps.
                at.split('.').next().unwrap_or(at).to_string()
            }
            _ => return Err(FilterError::AmbiguousValue),
        };

        let comparison = match filter.direction {
            Direction::Before => "le",
            Direction::After => "ge",
        };

        clauses.push(format!(
            "{}/dateTime {} '{}Z'",
            filter.field.as_str(),
            comparison,
            stamp
        ));
    }

    let predicate = clauses.join(" and ");
    tracing::debug!(filter = %predicate, "built time filter");
    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ten_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_filter() {
        let filters = [
            TimeFilter::relative(-15, Direction::After, Field::Start),
            TimeFilter::relative(15, Direction::Before, Field::Start),
        ];
        let predicate = build_filter(&filters, ten_am()).unwrap();
        assert_eq!(
            predicate,
            "start/dateTime ge '2024-01-01T09:45:00.000Z' and \
             start/dateTime le '2024-01-01T10:15:00.000Z'"
        );
    }

    #[test]
    fn test_absolute_filter_truncates_fraction() {
        let filters = [TimeFilter::absolute(
            "2024-01-01T10:00:00.0000000",
            Direction::Before,
            Field::End,
        )];
        let predicate = build_filter(&filters, ten_am()).unwrap();
        assert_eq!(predicate, "end/dateTime le '2024-01-01T10:00:00Z'");
    }

    #[test]
    fn test_clause_order_is_commutative() {
        let a = TimeFilter::relative(-75, Direction::After, Field::End);
        let b = TimeFilter::relative(-15, Direction::Before, Field::End);
        let now = ten_am();
        let forwards = build_filter(&[a.clone(), b.clone()], now).unwrap();
        let backwards = build_filter(&[b, a], now).unwrap();

        let mut forward_clauses: Vec<&str> = forwards.split(" and ").collect();
        let mut backward_clauses: Vec<&str> = backwards.split(" and ").collect();
        forward_clauses.sort_unstable();
        backward_clauses.sort_unstable();
        assert_eq!(forward_clauses, backward_clauses);
    }

    #[test]
    fn test_now_is_not_resampled() {
        // Two clauses with the same offset must resolve to the same instant.
        let filters = [
            TimeFilter::relative(30, Direction::Before, Field::Start),
            TimeFilter::relative(30, Direction::After, Field::End),
        ];
        let predicate = build_filter(&filters, Utc::now()).unwrap();
        let stamps: Vec<&str> = predicate
            .split('\'')
            .filter(|s| s.contains(':'))
            .collect();
        assert_eq!(stamps[0], stamps[1]);
    }

    #[test]
    fn test_both_or_neither_value_is_rejected() {
        assert_eq!(
            TimeFilter::new(None, None, Direction::Before, Field::Start).unwrap_err(),
            FilterError::AmbiguousValue
        );
        assert_eq!(
            TimeFilter::new(
                Some(5),
                Some("2024-01-01T10:00:00".to_string()),
                Direction::Before,
                Field::Start
            )
            .unwrap_err(),
            FilterError::AmbiguousValue
        );
    }

    #[test]
    fn test_field_and_direction_parsing() {
        assert_eq!("start".parse::<Field>().unwrap(), Field::Start);
        assert_eq!("end".parse::<Field>().unwrap(), Field::End);
        assert_eq!("before".parse::<Direction>().unwrap(), Direction::Before);
        assert_eq!("after".parse::<Direction>().unwrap(), Direction::After);
        assert!(matches!(
            "middle".parse::<Field>(),
            Err(FilterError::InvalidField(_))
        ));
        assert!(matches!(
            "during".parse::<Direction>(),
            Err(FilterError::InvalidDirection(_))
        ));
    }
}
