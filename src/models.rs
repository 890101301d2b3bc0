//! Typed rows of the static GTFS files the classifier reads.
//!
//! Only the columns the classifier needs are modelled; any other column in a
//! file is ignored during deserialization.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Deserializer};

use crate::error::ParseArrivalTimeError;

/// A row of `agency.txt`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Agency {
    /// Optional in single-agency feeds, in which case it reads as `""`.
    #[serde(default)]
    pub agency_id: String,
}

/// A row of `stops.txt`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

/// The `route_type` code of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "u16")]
pub enum RouteType {
    Bus,
    Ferry,
    /// Tram, subway, rail, cable car and anything else.
    Other(u16),
}

impl From<u16> for RouteType {
    fn from(code: u16) -> Self {
        match code {
            3 => RouteType::Bus,
            4 => RouteType::Ferry,
            other => RouteType::Other(other),
        }
    }
}

/// A row of `routes.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub route_type: RouteType,
    #[serde(default)]
    pub route_short_name: String,
}

/// A row of `trips.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
}

/// A row of `stop_times.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    /// Empty for stops that are not timepoints.
    #[serde(default)]
    pub arrival_time: Option<ArrivalTime>,
}

/// A `HH:MM:SS` clock time stored as seconds since midnight.
///
/// Hours past 23 are accepted as-is; no service-day rollover is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrivalTime(u32);

impl ArrivalTime {
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        ArrivalTime(hours * 3600 + minutes * 60 + seconds)
    }

    pub fn hours(self) -> u32 {
        self.0 / 3600
    }

    /// Minutes and seconds past the hour, in seconds.
    pub fn seconds_within_hour(self) -> u32 {
        self.0 % 3600
    }
}

impl FromStr for ArrivalTime {
    type Err = ParseArrivalTimeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseArrivalTimeError(raw.to_string());
        let mut parts = raw.trim().split(':');
        let (Some(h), Some(m), Some(s), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let field = |part: &str| -> Result<u32, ParseArrivalTimeError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let (hours, minutes, seconds) = (field(h)?, field(m)?, field(s)?);
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }
        hours
            .checked_mul(3600)
            .and_then(|secs| secs.checked_add(minutes * 60 + seconds))
            .map(ArrivalTime)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for ArrivalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let within = self.seconds_within_hour();
        write!(f, "{:02}:{:02}:{:02}", self.hours(), within / 60, within % 60)
    }
}

impl<'de> Deserialize<'de> for ArrivalTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A row of `calendar.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Calendar {
    pub service_id: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub monday: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub tuesday: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub wednesday: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub thursday: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub friday: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub saturday: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub sunday: bool,
}

impl Calendar {
    pub fn runs_on(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// Saturday or Sunday; either day alone counts as weekend service.
    pub fn runs_on_weekend(&self) -> bool {
        self.saturday || self.sunday
    }
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "expected 0 or 1, got {other:?}"
        ))),
    }
}

/// Every table of one unpacked feed, held in memory for a single run.
#[derive(Debug, Default, Clone)]
pub struct Feed {
    pub agencies: Vec<Agency>,
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: Vec<Calendar>,
}

impl Feed {
    /// The agency that selects the duplicate-route table: the first row of `agency.txt`.
    pub fn agency(&self) -> Option<&Agency> {
        self.agencies.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read<T: serde::de::DeserializeOwned>(data: &str) -> Vec<T> {
        csv::Reader::from_reader(data.as_bytes())
            .deserialize()
            .collect::<Result<Vec<T>, _>>()
            .unwrap()
    }

    #[test]
    fn test_parse_arrival_time() {
        let time: ArrivalTime = "08:15:30".parse().unwrap();
        assert_eq!(time, ArrivalTime::from_hms(8, 15, 30));
        assert_eq!(time.hours(), 8);
        assert_eq!(time.seconds_within_hour(), 15 * 60 + 30);
        assert_eq!(time.to_string(), "08:15:30");
    }

    #[test]
    fn test_parse_arrival_time_single_digit_hour_and_rollover() {
        assert_eq!(
            "8:05:00".parse::<ArrivalTime>().unwrap(),
            ArrivalTime::from_hms(8, 5, 0)
        );
        let late: ArrivalTime = "25:10:00".parse().unwrap();
        assert_eq!(late.hours(), 25);
        assert_eq!(late.to_string(), "25:10:00");
    }

    #[test]
    fn test_parse_arrival_time_rejects_garbage() {
        for raw in [
            "",
            "08:00",
            "08:60:00",
            "08:00:61",
            "aa:bb:cc",
            "08:00:00:00",
            "-1:00:00",
            "1193047:00:00",
            "1193046:28:16",
        ] {
            assert!(raw.parse::<ArrivalTime>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn test_parse_arrival_time_largest_hour() {
        let time: ArrivalTime = "1193046:28:15".parse().unwrap();
        assert_eq!(time.hours(), 1_193_046);
        assert_eq!(time.seconds_within_hour(), 28 * 60 + 15);
    }

    #[test]
    fn test_route_type_codes() {
        assert_eq!(RouteType::from(3), RouteType::Bus);
        assert_eq!(RouteType::from(4), RouteType::Ferry);
        assert_eq!(RouteType::from(2), RouteType::Other(2));
    }

    #[test]
    fn test_deserialize_routes_ignores_extra_columns() {
        let routes: Vec<Route> = read(
            "route_id,agency_id,route_short_name,route_long_name,route_type\n\
             r1,SFMTA,5,Fulton,3\n\
             r2,SFMTA,,Ferry,4\n",
        );
        assert_eq!(routes[0].route_type, RouteType::Bus);
        assert_eq!(routes[0].route_short_name, "5");
        assert_eq!(routes[1].route_type, RouteType::Ferry);
        assert_eq!(routes[1].route_short_name, "");
    }

    #[test]
    fn test_deserialize_stop_times_with_empty_arrival() {
        let stop_times: Vec<StopTime> = read(
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             t1,08:01:00,08:01:00,s1,1\n\
             t1,,,s2,2\n",
        );
        assert_eq!(
            stop_times[0].arrival_time,
            Some(ArrivalTime::from_hms(8, 1, 0))
        );
        assert_eq!(stop_times[1].arrival_time, None);
    }

    #[test]
    fn test_deserialize_calendar_flags() {
        let calendars: Vec<Calendar> = read(
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             wk,1,1,1,1,1,0,0,20240101,20241231\n\
             sun,0,0,0,0,0,0,1,20240101,20241231\n",
        );
        assert!(calendars[0].runs_on(Weekday::Mon));
        assert!(!calendars[0].runs_on(Weekday::Sat));
        assert!(!calendars[0].runs_on_weekend());
        assert!(calendars[1].runs_on_weekend());
        assert!(!calendars[1].runs_on(Weekday::Mon));
    }

    #[test]
    fn test_deserialize_calendar_rejects_bad_flag() {
        let result: Result<Vec<Calendar>, _> = csv::Reader::from_reader(
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday\n\
             wk,yes,1,1,1,1,0,0\n"
                .as_bytes(),
        )
        .deserialize()
        .collect();
        assert!(result.is_err());
    }

    #[test]
    fn test_feed_agency_is_first_row() {
        let feed = Feed {
            agencies: vec![
                Agency {
                    agency_id: "SFMTA".into(),
                },
                Agency {
                    agency_id: "BART".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(feed.agency().unwrap().agency_id, "SFMTA");
        assert!(Feed::default().agency().is_none());
    }
}
