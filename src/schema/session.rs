//! Session metadata
//!
//! The session text is YAML. Free-text values are quoted first, then it is
//! deserialized with `serde_yaml_ng` into the few sections the statistics
//! pipeline reads, and reduced to a flat [`SessionMetadata`].
//!
//! Per-driver fields come from the first entry of `DriverInfo.Drivers` that
//! carries them.

use crate::yaml_utils;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Value used for string fields missing from the session text.
pub const UNKNOWN: &str = "Unknown";

/// Track, car, driver and weather for one capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Track display name (`TrackDisplayName`)
    pub track: String,
    /// Track short name (`TrackDisplayShortName`)
    pub track_short: String,
    /// Car display name (`CarScreenName`)
    pub car: String,
    /// Driver name (`UserName`)
    pub driver: String,
    /// Precipitation percentage, 0-100 (`TrackPrecipitation`)
    #[serde(rename = "precipitation")]
    pub precipitation_percent: u8,
    /// Sky condition (`TrackSkies`)
    #[serde(rename = "skies")]
    pub sky_condition: String,
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self {
            track: UNKNOWN.to_string(),
            track_short: UNKNOWN.to_string(),
            car: UNKNOWN.to_string(),
            driver: UNKNOWN.to_string(),
            precipitation_percent: 0,
            sky_condition: UNKNOWN.to_string(),
        }
    }
}

/// Sections of the session document the pipeline reads
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
struct SessionDocument {
    weekend_info: WeekendInfo,
    driver_info: DriverInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
struct WeekendInfo {
    track_display_name: Option<String>,
    track_display_short_name: Option<String>,
    track_skies: Option<String>,
    track_precipitation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
struct DriverInfo {
    drivers: Vec<Driver>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
struct Driver {
    user_name: Option<String>,
    car_screen_name: Option<String>,
}

impl SessionDocument {
    fn parse(text: &str) -> Result<Self, serde_yaml_ng::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(&yaml_utils::preprocess_iracing_yaml(text))
    }

    fn first_driver_field(&self, field: impl Fn(&Driver) -> Option<&String>) -> Option<String> {
        self.driver_info.drivers.iter().find_map(|driver| present(field(driver)))
    }
}

impl SessionMetadata {
    /// Resolve metadata from cleaned session text.
    ///
    /// Text that does not parse as YAML yields the defaults.
    pub fn from_session_text(text: &str) -> Self {
        match SessionDocument::parse(text) {
            Ok(document) => Self::from_document(&document),
            Err(e) => {
                warn!(error = %e, "Session text is not valid YAML, using default metadata");
                Self::default()
            }
        }
    }

    fn from_document(document: &SessionDocument) -> Self {
        let weekend = &document.weekend_info;
        let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            track: or_unknown(present(weekend.track_display_name.as_ref())),
            track_short: or_unknown(present(weekend.track_display_short_name.as_ref())),
            car: or_unknown(document.first_driver_field(|d| d.car_screen_name.as_ref())),
            driver: or_unknown(document.first_driver_field(|d| d.user_name.as_ref())),
            precipitation_percent: weekend
                .track_precipitation
                .as_deref()
                .map(parse_percentage)
                .unwrap_or(0),
            sky_condition: or_unknown(present(weekend.track_skies.as_ref())),
        }
    }

    /// Any precipitation makes a session wet.
    pub fn is_wet(&self) -> bool {
        self.precipitation_percent > 0
    }
}

/// Trimmed value, or `None` when it is empty.
fn present(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Leading decimal digits of `value`, clamped to 100; zero when there are none.
fn parse_percentage(value: &str) -> u8 {
    let value = value.trim_start();
    let digits: &str = {
        let end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
        &value[..end]
    };

    if digits.is_empty() {
        return 0;
    }

    // Any digit run too long for u32 is far above 100 anyway.
    digits.parse::<u32>().map(|p| p.min(100) as u8).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::session_text;
    use proptest::prelude::*;

    #[test]
    fn resolves_named_fields() {
        let text = session_text("Autodromo Nazionale Monza", "Dallara F3", "Jane Doe", 0);
        let metadata = SessionMetadata::from_session_text(&text);

        assert_eq!(metadata.track, "Autodromo Nazionale Monza");
        assert_eq!(metadata.track_short, "Monza");
        assert_eq!(metadata.car, "Dallara F3");
        assert_eq!(metadata.driver, "Jane Doe");
        assert_eq!(metadata.sky_condition, "Partly Cloudy");
        assert_eq!(metadata.precipitation_percent, 0);
        assert!(!metadata.is_wet());
    }

    #[test]
    fn precipitation_marks_session_wet() {
        let text = session_text("Monza", "Dallara F3", "Jane Doe", 10);
        let metadata = SessionMetadata::from_session_text(&text);
        assert_eq!(metadata.precipitation_percent, 10);
        assert!(metadata.is_wet());
    }

    #[test]
    fn missing_fields_default() {
        let metadata = SessionMetadata::from_session_text("WeekendInfo:\n TrackName: x\n");
        assert_eq!(metadata, SessionMetadata::default());
        assert_eq!(metadata.car, UNKNOWN);
    }

    #[test]
    fn empty_text_defaults() {
        assert_eq!(SessionMetadata::from_session_text(""), SessionMetadata::default());
        assert_eq!(SessionMetadata::from_session_text("\n\n"), SessionMetadata::default());
    }

    #[test]
    fn similar_keys_do_not_collide() {
        let text = "WeekendInfo:\n TrackDisplayShortName: Short\n\
DriverInfo:\n Drivers:\n - CarIdx: 0\n   CarScreenNameShort: F3\n";
        let metadata = SessionMetadata::from_session_text(text);
        assert_eq!(metadata.track, UNKNOWN);
        assert_eq!(metadata.track_short, "Short");
        assert_eq!(metadata.car, UNKNOWN);
    }

    #[test]
    fn first_driver_wins() {
        let text = concat!(
            "DriverInfo:\n Drivers:\n",
            " - CarIdx: 0\n   UserName: First\n   CarScreenName: F3\n",
            " - CarIdx: 1\n   UserName: Second\n   CarScreenName: GT3\n",
        );
        let metadata = SessionMetadata::from_session_text(text);
        assert_eq!(metadata.driver, "First");
        assert_eq!(metadata.car, "F3");
    }

    #[test]
    fn empty_values_are_skipped() {
        let text = "WeekendInfo:\n TrackSkies:\n\
DriverInfo:\n Drivers:\n - CarIdx: 0\n   UserName:\n - CarIdx: 1\n   UserName: Named\n";
        let metadata = SessionMetadata::from_session_text(text);
        assert_eq!(metadata.sky_condition, UNKNOWN);
        assert_eq!(metadata.driver, "Named");
    }

    #[test]
    fn unquoted_apostrophes_in_names_parse() {
        let text = session_text("Spa", "Porsche 911 GT3 R", "O'Connor, Mike", 0);
        let metadata = SessionMetadata::from_session_text(&text);
        assert_eq!(metadata.driver, "O'Connor, Mike");
        assert_eq!(metadata.track, "Spa");
    }

    #[test]
    fn numeric_scalars_read_as_text() {
        let text = "DriverInfo:\n Drivers:\n - CarIdx: 0\n   CarScreenName: 911\n";
        assert_eq!(SessionMetadata::from_session_text(text).car, "911");
    }

    #[test]
    fn unparseable_text_defaults() {
        let metadata = SessionMetadata::from_session_text("WeekendInfo: [unclosed\n");
        assert_eq!(metadata, SessionMetadata::default());
    }

    #[test]
    fn percentage_parsing() {
        assert_eq!(parse_percentage("10 %"), 10);
        assert_eq!(parse_percentage("0 %"), 0);
        assert_eq!(parse_percentage("100"), 100);
        assert_eq!(parse_percentage("250 %"), 100);
        assert_eq!(parse_percentage("99999999999999 %"), 100);
        assert_eq!(parse_percentage("%"), 0);
        assert_eq!(parse_percentage("light"), 0);
    }

    proptest! {
        #[test]
        fn prop_precipitation_is_bounded(value in "[0-9a-z %]{0,12}") {
            let text = format!("WeekendInfo:\n TrackPrecipitation: {}\n", value);
            let metadata = SessionMetadata::from_session_text(&text);
            prop_assert!(metadata.precipitation_percent <= 100);
        }
    }
}
