//! Month view for the emotion heatmap.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{Emotion, EmotionSummary};

/// A displayed calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    year: i32,
    month: u32,
}

/// One cell of the month grid. `None` cells pad the first and last week.
pub type Week = [Option<NaiveDate>; 7];

impl Month {
    /// `None` if `month` is outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    /// Inclusive date range sent to the emotions-summary endpoint
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.last_day())
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// e.g. "October 2024"
    pub fn title(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }

    /// Weeks of the month, Sunday first
    pub fn weeks(&self) -> Vec<Week> {
        let first = self.first_day();
        let last = self.last_day();
        let lead = first.weekday().num_days_from_sunday() as usize;

        let mut weeks = Vec::new();
        let mut week: Week = [None; 7];
        let mut slot = lead;
        let mut day = first;
        while day <= last {
            week[slot] = Some(day);
            slot += 1;
            if slot == 7 {
                weeks.push(week);
                week = [None; 7];
                slot = 0;
            }
            day += Duration::days(1);
        }
        if slot != 0 {
            weeks.push(week);
        }
        weeks
    }
}

/// Prevalent emotion per day, as returned for one month
#[derive(Debug, Clone, Default)]
pub struct Heatmap {
    days: HashMap<NaiveDate, Emotion>,
}

impl Heatmap {
    pub fn from_summaries(summaries: &[EmotionSummary]) -> Self {
        Self {
            days: summaries
                .iter()
                .map(|s| (s.date, s.prevalent_emotion))
                .collect(),
        }
    }

    /// `None` for days with no notes; `Some(Unknown)` for unrecognised emotions
    pub fn get(&self, date: NaiveDate) -> Option<Emotion> {
        self.days.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_covers_whole_month() {
        let feb_leap = Month::new(2024, 2).unwrap();
        assert_eq!(feb_leap.range(), (date(2024, 2, 1), date(2024, 2, 29)));

        let dec = Month::new(2023, 12).unwrap();
        assert_eq!(dec.range(), (date(2023, 12, 1), date(2023, 12, 31)));

        assert!(Month::new(2024, 13).is_none());
    }

    #[test]
    fn test_prev_next_wrap_years() {
        let jan = Month::new(2024, 1).unwrap();
        assert_eq!(jan.prev(), Month::new(2023, 12).unwrap());
        assert_eq!(jan.prev().next(), jan);
        assert_eq!(Month::new(2024, 12).unwrap().next(), Month::new(2025, 1).unwrap());
    }

    #[test]
    fn test_title() {
        assert_eq!(Month::new(2024, 10).unwrap().title(), "October 2024");
    }

    #[test]
    fn test_weeks_start_on_sunday() {
        // 1 September 2024 is a Sunday; 30 September is a Monday
        let weeks = Month::new(2024, 9).unwrap().weeks();
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0][0], Some(date(2024, 9, 1)));
        assert_eq!(weeks[4][1], Some(date(2024, 9, 30)));
        assert_eq!(weeks[4][2], None);

        // 1 October 2024 is a Tuesday
        let weeks = Month::new(2024, 10).unwrap().weeks();
        assert_eq!(weeks[0][..2], [None, None]);
        assert_eq!(weeks[0][2], Some(date(2024, 10, 1)));
        let days: usize = weeks.iter().map(|w| w.iter().flatten().count()).sum();
        assert_eq!(days, 31);
    }

    #[test]
    fn test_heatmap_lookup() {
        let summaries = vec![
            EmotionSummary {
                date: date(2024, 10, 3),
                prevalent_emotion: Emotion::Calm,
            },
            EmotionSummary {
                date: date(2024, 10, 4),
                prevalent_emotion: Emotion::Unknown,
            },
        ];
        let map = Heatmap::from_summaries(&summaries);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(date(2024, 10, 3)), Some(Emotion::Calm));
        assert_eq!(map.get(date(2024, 10, 4)), Some(Emotion::Unknown));
        assert_eq!(map.get(date(2024, 10, 5)), None);
    }
}
