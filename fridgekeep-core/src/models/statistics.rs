use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ingredient lifecycle events that move a counter.
///
/// Deleting an ingredient is not an event: it removes data without counting
/// it as used or wasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    Added,
    Consumed,
    Disposed,
}

/// Calendar period a bucket covers (UTC, weeks start on Monday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    /// First day of the period containing `date`.
    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Period::Month => date.with_day(1).unwrap_or(date),
            Period::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }
}

/// Counters for one period.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatBucket {
    pub period_start: Option<NaiveDate>,
    pub added: u32,
    pub consumed: u32,
    pub disposed: u32,
}

impl StatBucket {
    /// Resets the counters when `start` begins a later period than the one
    /// this bucket holds.
    fn roll(&mut self, start: NaiveDate) {
        match self.period_start {
            Some(current) if current >= start => {}
            _ => {
                *self = StatBucket {
                    period_start: Some(start),
                    ..Default::default()
                };
            }
        }
    }

    fn bump(&mut self, event: StatEvent) {
        match event {
            StatEvent::Added => self.added += 1,
            StatEvent::Consumed => self.consumed += 1,
            StatEvent::Disposed => self.disposed += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MostUsedFridge {
    pub fridge_id: String,
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FridgeUsage {
    pub name: String,
    pub count: u32,
}

/// Aggregated ingredient activity for one user.
///
/// Derived data: updated as ingredient events happen, never authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    pub weekly: StatBucket,
    pub monthly: StatBucket,
    pub yearly: StatBucket,
    pub most_used_fridge: Option<MostUsedFridge>,
    #[serde(default)]
    pub fridge_usage: BTreeMap<String, FridgeUsage>,
}

impl UserStatistics {
    pub fn record(&mut self, event: StatEvent, fridge_id: &str, fridge_name: &str, at: DateTime<Utc>) {
        let today = at.date_naive();
        for (bucket, period) in [
            (&mut self.weekly, Period::Week),
            (&mut self.monthly, Period::Month),
            (&mut self.yearly, Period::Year),
        ] {
            bucket.roll(period.start_of(today));
            bucket.bump(event);
        }

        if event == StatEvent::Added {
            let usage = self
                .fridge_usage
                .entry(fridge_id.to_string())
                .or_insert_with(|| FridgeUsage {
                    name: fridge_name.to_string(),
                    count: 0,
                });
            usage.name = fridge_name.to_string();
            usage.count += 1;
            self.recompute_most_used();
        }
    }

    /// Drops a deleted fridge from the usage ranking.
    pub fn forget_fridge(&mut self, fridge_id: &str) {
        if self.fridge_usage.remove(fridge_id).is_some() {
            self.recompute_most_used();
        }
    }

    /// Copy with any bucket from an earlier period zeroed for `now`.
    pub fn as_of(&self, now: DateTime<Utc>) -> Self {
        let mut view = self.clone();
        let today = now.date_naive();
        for (bucket, period) in [
            (&mut view.weekly, Period::Week),
            (&mut view.monthly, Period::Month),
            (&mut view.yearly, Period::Year),
        ] {
            bucket.roll(period.start_of(today));
        }
        view
    }

    fn recompute_most_used(&mut self) {
        // Highest count wins; ties go to the smallest id so the result is stable.
        self.most_used_fridge = self
            .fridge_usage
            .iter()
            .fold(None::<(&String, &FridgeUsage)>, |best, (id, usage)| match best {
                Some((_, b)) if b.count >= usage.count => best,
                _ => Some((id, usage)),
            })
            .map(|(id, usage)| MostUsedFridge {
                fridge_id: id.clone(),
                name: usage.name.clone(),
                count: usage.count,
            });
    }
}

impl fmt::Display for UserStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<8} {:>6} {:>9} {:>9}", "", "added", "consumed", "disposed")?;
        for (label, bucket) in [
            ("week", &self.weekly),
            ("month", &self.monthly),
            ("year", &self.yearly),
        ] {
            writeln!(
                f,
                "{:<8} {:>6} {:>9} {:>9}",
                label, bucket.added, bucket.consumed, bucket.disposed
            )?;
        }
        match &self.most_used_fridge {
            Some(m) => write!(f, "\nMost used fridge: {} ({} added)", m.name, m.count),
            None => write!(f, "\nMost used fridge: -"),
        }
    }
}
