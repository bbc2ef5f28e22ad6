//! Relógio local.

use super::{Provider, Reading};
use chrono::{DateTime, Local, TimeZone};

/// Formato `Mon 01/02/24 01:00:00 PM`.
pub const DATE_FORMAT: &str = "%a %x %I:%M:%S %p";

#[derive(Debug, Default)]
pub struct DateProvider;

impl Provider for DateProvider {
    fn poll(&mut self) -> Reading {
        Reading::Fresh(format_date(&Local::now()))
    }
}

pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DATE_FORMAT).to_string()
}
