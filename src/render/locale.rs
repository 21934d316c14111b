//! Locale context for rendering dates, timestamps and notices.

use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Supported display locales.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
    Ru,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
            Locale::Ru => "ru",
        }
    }

    fn date_format(&self) -> &'static str {
        match self {
            Locale::En => "%m/%d/%Y",
            Locale::De | Locale::Ru => "%d.%m.%Y",
        }
    }

    fn date_time_format(&self) -> &'static str {
        match self {
            Locale::En => "%m/%d/%Y %H:%M",
            Locale::De | Locale::Ru => "%d.%m.%Y %H:%M",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            "ru" => Ok(Locale::Ru),
            other => Err(format!("unsupported locale '{}' (expected en, de or ru)", other)),
        }
    }
}

/// Rendering context handed to every summary builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext {
    pub locale: Locale,
}

impl RenderContext {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Format a date or date-time value. Unparseable input is returned unchanged.
    pub fn format_date(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return date.format(self.locale.date_format()).to_string();
        }
        for pattern in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(moment) = NaiveDateTime::parse_from_str(trimmed, pattern) {
                return moment.format(self.locale.date_time_format()).to_string();
            }
        }
        if let Ok(moment) = DateTime::parse_from_rfc3339(trimmed) {
            return moment
                .with_timezone(&Local)
                .format(self.locale.date_time_format())
                .to_string();
        }
        trimmed.to_string()
    }

    /// Format an RFC 3339 timestamp in the server's local zone.
    pub fn format_timestamp(&self, raw: &str) -> String {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(moment) => moment
                .with_timezone(&Local)
                .format(self.locale.date_time_format())
                .to_string(),
            Err(_) => raw.to_string(),
        }
    }

    /// Notice shown when a checklist has nothing to display.
    pub fn no_entries(&self) -> &'static str {
        match self.locale {
            Locale::En => "No entries",
            Locale::De => "Keine Einträge",
            Locale::Ru => "Нет записей",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_codes() {
        assert_eq!("DE".parse::<Locale>().unwrap(), Locale::De);
        assert_eq!(Locale::Ru.code(), "ru");
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_format_date_per_locale() {
        let en = RenderContext::new(Locale::En);
        let de = RenderContext::new(Locale::De);
        assert_eq!(en.format_date("2025-01-10"), "01/10/2025");
        assert_eq!(de.format_date("2025-01-10"), "10.01.2025");
        assert_eq!(de.format_date("2025-01-10T07:30"), "10.01.2025 07:30");
        assert_eq!(en.format_date("next tuesday"), "next tuesday");
    }

    #[test]
    fn test_no_entries_is_localized() {
        assert_eq!(RenderContext::new(Locale::De).no_entries(), "Keine Einträge");
        assert_eq!(RenderContext::default().no_entries(), "No entries");
    }
}
