//! Reporting periods and the date windows they cover.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

/// The view that metrics and charts are calculated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The calendar month containing today.
    #[default]
    Monthly,
    /// The calendar year containing today.
    Yearly,
}

impl Period {
    /// The window of dates that this period covers when evaluated on `today`.
    pub fn window(self, today: Date) -> DateWindow {
        match self {
            Period::Monthly => {
                let start = today.saturating_sub(Duration::days(i64::from(today.day()) - 1));
                let end = last_day_while(today, |date| date.month() == today.month());
                DateWindow { start, end }
            }
            Period::Yearly => {
                let start =
                    today.saturating_sub(Duration::days(i64::from(today.ordinal()) - 1));
                let end = last_day_while(today, |date| date.year() == today.year());
                DateWindow { start, end }
            }
        }
    }
}

fn last_day_while(from: Date, predicate: impl Fn(Date) -> bool) -> Date {
    let mut end = from;

    while let Some(next) = end.next_day().filter(|date| predicate(*date)) {
        end = next;
    }

    end
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Date,
    pub end: Date,
}

impl DateWindow {
    /// Whether `date` falls within the window.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// The number of days in the window.
    pub fn days(&self) -> u16 {
        // A window never spans more than a year.
        u16::try_from((self.end - self.start).whole_days() + 1).unwrap_or(u16::MAX)
    }
}

/// The three letter label of a month, e.g. "Jan".
pub fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// The months of the year in order.
pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];
