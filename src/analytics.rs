use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::time_entry::{Category, TimeEntry};

/// カテゴリーごとの合計時間(分)。円グラフの1要素に相当する。
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryShare {
    pub category_id: String,
    pub name: String,
    pub color: String,
    pub minutes: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryDuration {
    pub category_id: String,
    /// 秒
    pub duration: i64,
}

/// 合計時間とカテゴリーごとの内訳。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeStats {
    /// 秒
    pub total_duration: i64,
    pub category_breakdown: Vec<CategoryDuration>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopCategory {
    pub name: String,
    pub hours: f64,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub total_hours: f64,
    pub average_hours_per_day: f64,
    pub most_productive_day: Option<NaiveDate>,
    pub top_category: Option<TopCategory>,
}

/// 集計対象の期間。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeRange {
    Today,
    Week,
    Month,
    Year,
    Custom(NaiveDate, NaiveDate),
}

impl TimeRange {
    /// `today`を基準とした期間の開始日と終了日(両端を含む)を返す。
    ///
    /// 週は月曜日から日曜日までとする。
    pub fn bounds(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        let bounds = match *self {
            TimeRange::Today => (today, today),
            TimeRange::Week => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (start, start + Duration::days(6))
            }
            TimeRange::Month => {
                let start = today.with_day(1).context("Failed to set day")?;
                let next = if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                }
                .context("Failed to set month")?;
                (start, next - Duration::days(1))
            }
            TimeRange::Year => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).context("Failed to set year")?,
                NaiveDate::from_ymd_opt(today.year(), 12, 31).context("Failed to set year")?,
            ),
            TimeRange::Custom(from, to) => (from, to),
        };

        Ok(bounds)
    }
}

/// カテゴリーごとの合計時間(分)をカテゴリーの並び順で返す。
///
/// 時間が0のカテゴリーは含めない。
pub fn category_breakdown(entries: &[TimeEntry], categories: &[Category]) -> Vec<CategoryShare> {
    categories
        .iter()
        .map(|category| {
            let minutes = entries
                .iter()
                .filter(|entry| entry.category_id == category.id)
                .map(|entry| entry.duration().num_seconds() as f64 / 60.0)
                .sum::<f64>();
            CategoryShare {
                category_id: category.id.clone(),
                name: category.name.clone(),
                color: category.color.clone(),
                minutes,
            }
        })
        .filter(|share| share.minutes > 0.0)
        .collect()
}

/// 合計時間とカテゴリーごとの時間(秒)を計算する。
///
/// 内訳はカテゴリーIDの昇順に並べる。
pub fn time_stats(entries: &[TimeEntry]) -> TimeStats {
    let by_category: BTreeMap<&str, i64> =
        entries.iter().fold(BTreeMap::new(), |mut acc, entry| {
            *acc.entry(entry.category_id.as_str()).or_insert(0) += entry.duration().num_seconds();
            acc
        });

    TimeStats {
        total_duration: by_category.values().sum(),
        category_breakdown: by_category
            .into_iter()
            .map(|(category_id, duration)| CategoryDuration {
                category_id: category_id.to_string(),
                duration,
            })
            .collect(),
    }
}

/// エントリーから統計情報を計算する。
///
/// 1日あたりの平均は、エントリーが存在するLocalタイムゾーンの日数で割る。
/// 最も長い日が複数ある場合は早い日付を採用する。
pub fn statistics(entries: &[TimeEntry], categories: &[Category]) -> Statistics {
    let daily_hours: BTreeMap<NaiveDate, f64> =
        entries.iter().fold(BTreeMap::new(), |mut acc, entry| {
            let day = entry.start_time.with_timezone(&Local).date_naive();
            *acc.entry(day).or_insert(0.0) += hours(entry);
            acc
        });

    let total_hours = daily_hours.values().sum::<f64>();
    let average_hours_per_day = if daily_hours.is_empty() {
        0.0
    } else {
        total_hours / daily_hours.len() as f64
    };
    let most_productive_day = daily_hours
        .iter()
        .fold(None, |best: Option<(NaiveDate, f64)>, (day, hours)| match best {
            Some((_, best_hours)) if best_hours >= *hours => best,
            _ => Some((*day, *hours)),
        })
        .map(|(day, _)| day);

    let category_hours: HashMap<&str, f64> =
        entries.iter().fold(HashMap::new(), |mut acc, entry| {
            *acc.entry(entry.category_id.as_str()).or_insert(0.0) += hours(entry);
            acc
        });
    let top_category = categories
        .iter()
        .filter_map(|category| {
            category_hours
                .get(category.id.as_str())
                .map(|hours| TopCategory {
                    name: category.name.clone(),
                    hours: *hours,
                    color: category.color.clone(),
                })
        })
        .fold(None, |best: Option<TopCategory>, candidate| match best {
            Some(best) if best.hours >= candidate.hours => Some(best),
            _ => Some(candidate),
        });

    Statistics {
        total_hours,
        average_hours_per_day,
        most_productive_day,
        top_category,
    }
}

fn hours(entry: &TimeEntry) -> f64 {
    entry.duration().num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::{category_breakdown, statistics, time_stats, CategoryDuration, TimeRange};
    use crate::time_entry::{Category, TimeEntry};

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            color: format!("#{}", id),
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn entry(category_id: &str, start: DateTime<Utc>, minutes: i64) -> TimeEntry {
        TimeEntry {
            id: format!("{}-{}", category_id, start.timestamp()),
            title: "entry".to_string(),
            description: None,
            start_time: start,
            end_time: start + chrono::Duration::minutes(minutes),
            category_id: category_id.to_string(),
            user_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Localタイムゾーンの正午を基準にするので日付がずれない。
    fn noon(day: NaiveDate) -> DateTime<Utc> {
        Local
            .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
            .single()
            .unwrap()
            .to_utc()
    }

    #[test]
    fn test_category_breakdown_skips_empty_categories() {
        let categories = vec![
            category("c1", "Work"),
            category("c2", "Idle"),
            category("c3", "Study"),
        ];
        let entries = vec![
            entry("c3", noon(date(2024, 3, 1)), 30),
            entry("c1", noon(date(2024, 3, 2)), 90),
            entry("c3", noon(date(2024, 3, 3)), 15),
        ];

        let shares = category_breakdown(&entries, &categories);

        assert_eq!(shares.len(), 2);
        assert_eq!((shares[0].name.as_str(), shares[0].minutes), ("Work", 90.0));
        assert_eq!((shares[1].name.as_str(), shares[1].minutes), ("Study", 45.0));
        assert_eq!(shares[1].color, "#c3");
    }

    #[test]
    fn test_category_breakdown_fractional_minutes() {
        let mut short = entry("c1", noon(date(2024, 3, 1)), 0);
        short.end_time = short.start_time + chrono::Duration::seconds(90);

        let shares = category_breakdown(&[short], &[category("c1", "Work")]);

        assert_eq!(shares[0].minutes, 1.5);
    }

    #[test]
    fn test_time_stats() {
        let entries = vec![
            entry("c2", noon(date(2024, 3, 1)), 60),
            entry("c1", noon(date(2024, 3, 2)), 30),
            entry("c2", noon(date(2024, 3, 3)), 15),
        ];

        let stats = time_stats(&entries);

        assert_eq!(stats.total_duration, 105 * 60);
        assert_eq!(
            stats.category_breakdown,
            vec![
                CategoryDuration { category_id: "c1".to_string(), duration: 30 * 60 },
                CategoryDuration { category_id: "c2".to_string(), duration: 75 * 60 },
            ]
        );
    }

    #[test]
    fn test_statistics() {
        let categories = vec![category("c1", "Work"), category("c2", "Study")];
        let entries = vec![
            entry("c1", noon(date(2024, 3, 1)), 120),
            entry("c2", noon(date(2024, 3, 2)), 180),
            entry("c1", noon(date(2024, 3, 2)) + chrono::Duration::hours(4), 120),
        ];

        let stats = statistics(&entries, &categories);

        assert_eq!(stats.total_hours, 7.0);
        assert_eq!(stats.average_hours_per_day, 3.5);
        assert_eq!(stats.most_productive_day, Some(date(2024, 3, 2)));
        let top = stats.top_category.unwrap();
        assert_eq!((top.name.as_str(), top.hours), ("Work", 4.0));
    }

    /// 同じ時間の日が複数ある場合は早い日付になる。
    #[test]
    fn test_statistics_tie_prefers_earliest_day() {
        let entries = vec![
            entry("c1", noon(date(2024, 3, 5)), 60),
            entry("c1", noon(date(2024, 3, 4)), 60),
        ];

        let stats = statistics(&entries, &[category("c1", "Work")]);

        assert_eq!(stats.most_productive_day, Some(date(2024, 3, 4)));
    }

    #[test]
    fn test_statistics_empty() {
        let stats = statistics(&[], &[category("c1", "Work")]);

        assert_eq!(stats.total_hours, 0.0);
        assert_eq!(stats.average_hours_per_day, 0.0);
        assert_eq!(stats.most_productive_day, None);
        assert_eq!(stats.top_category, None);
    }

    #[rstest]
    #[case::today(TimeRange::Today, (date(2024, 2, 14), date(2024, 2, 14)))]
    #[case::week(TimeRange::Week, (date(2024, 2, 12), date(2024, 2, 18)))]
    #[case::month(TimeRange::Month, (date(2024, 2, 1), date(2024, 2, 29)))]
    #[case::year(TimeRange::Year, (date(2024, 1, 1), date(2024, 12, 31)))]
    #[case::custom(TimeRange::Custom(date(2023, 5, 1), date(2023, 5, 9)), (date(2023, 5, 1), date(2023, 5, 9)))]
    fn test_time_range_bounds(#[case] range: TimeRange, #[case] expected: (NaiveDate, NaiveDate)) {
        // 2024-02-14は水曜日
        assert_eq!(range.bounds(date(2024, 2, 14)).unwrap(), expected);
    }

    #[test]
    fn test_month_bounds_december() {
        assert_eq!(
            TimeRange::Month.bounds(date(2023, 12, 24)).unwrap(),
            (date(2023, 12, 1), date(2023, 12, 31))
        );
    }
}
