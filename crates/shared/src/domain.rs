use std::{fmt, str::FromStr};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CompetitionId);

/// Identity issued by the backend auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar day a daily competition belongs to, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompetitionDay(pub NaiveDate);

impl CompetitionDay {
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }
}

impl fmt::Display for CompetitionDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CompetitionDay {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl CompetitionPeriod {
    pub const ALL: [CompetitionPeriod; 3] = [
        CompetitionPeriod::Daily,
        CompetitionPeriod::Weekly,
        CompetitionPeriod::Monthly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CompetitionPeriod::Daily => "Daily",
            CompetitionPeriod::Weekly => "Weekly",
            CompetitionPeriod::Monthly => "Monthly",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            CompetitionPeriod::Daily => "Enter the daily challenge",
            CompetitionPeriod::Weekly => "Weekly top",
            CompetitionPeriod::Monthly => "Monthly standings",
        }
    }

    /// Only the daily competition has a playable game behind it.
    pub fn is_playable(self) -> bool {
        matches!(self, CompetitionPeriod::Daily)
    }
}

/// Game tag recorded with a generic match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    MinigameDaily,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competition_day_renders_zero_padded() {
        let day = CompetitionDay(NaiveDate::from_ymd_opt(2026, 3, 7).expect("date"));
        assert_eq!(day.to_string(), "2026-03-07");
        assert_eq!("2026-03-07".parse::<CompetitionDay>().expect("parse"), day);
    }

    #[test]
    fn game_kind_serializes_as_backend_tag() {
        assert_eq!(
            serde_json::to_string(&GameKind::MinigameDaily).expect("json"),
            "\"minigame_daily\""
        );
    }

    #[test]
    fn only_daily_is_playable() {
        let playable: Vec<_> = CompetitionPeriod::ALL
            .into_iter()
            .filter(|period| period.is_playable())
            .collect();
        assert_eq!(playable, vec![CompetitionPeriod::Daily]);
    }
}
