use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;

use crate::analytics::{CategoryShare, Statistics};
use crate::time_entry::{Category, TimeEntry};

/// Consoleにtime entryや集計結果を表示するためのtrait。
pub trait ConsolePresenter {
    /// タイムエントリーをカテゴリー名と合わせて表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示するタイムエントリー
    /// * `categories` - カテゴリー名の解決に利用するカテゴリー
    fn show_time_entries(&mut self, time_entries: &[TimeEntry], categories: &[Category])
        -> Result<()>;

    fn show_categories(&mut self, categories: &[Category]) -> Result<()>;

    /// カテゴリーごとの時間(分)を表示する。
    fn show_category_breakdown(&mut self, shares: &[CategoryShare]) -> Result<()>;

    fn show_statistics(&mut self, statistics: &Statistics) -> Result<()>;
}

/// Markdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // 開始時刻順にlist形式で表示する。説明があれば次の行に字下げして表示する。
    fn show_time_entries(
        &mut self,
        time_entries: &[TimeEntry],
        categories: &[Category],
    ) -> Result<()> {
        if time_entries.is_empty() {
            writeln!(self.writer, "No entries for this date")
                .context("Failed to write empty message")?;
            return Ok(());
        }

        let mut sorted_entries = time_entries.to_vec();
        sorted_entries.sort_by_key(|entry| entry.start_time);

        for entry in sorted_entries {
            let start_str = entry
                .start_time
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string();
            let end_str = entry
                .end_time
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string();
            let category = categories
                .iter()
                .find(|category| category.id == entry.category_id)
                .map(|category| category.name.as_str())
                .unwrap_or("-");
            writeln!(
                self.writer,
                "- {} ~ {}: {} [{}] ({})",
                start_str, end_str, entry.title, category, entry.id
            )
            .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
            if let Some(description) = &entry.description {
                writeln!(self.writer, "  - {}", description)
                    .with_context(|| format!("Failed to write description: {:?}", entry))?;
            }
        }

        Ok(())
    }

    fn show_categories(&mut self, categories: &[Category]) -> Result<()> {
        for category in categories {
            writeln!(
                self.writer,
                "- {} ({}, {})",
                category.name, category.id, category.color
            )
            .with_context(|| format!("Failed to write category: {:?}", category))?;
        }

        Ok(())
    }

    fn show_category_breakdown(&mut self, shares: &[CategoryShare]) -> Result<()> {
        for share in shares {
            writeln!(
                self.writer,
                "- {}: {} minutes",
                share.name,
                share.minutes.round()
            )
            .with_context(|| format!("Failed to write category share: {:?}", share))?;
        }

        Ok(())
    }

    fn show_statistics(&mut self, statistics: &Statistics) -> Result<()> {
        let most_productive_day = statistics
            .most_productive_day
            .map(|day| day.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let top_category = statistics
            .top_category
            .as_ref()
            .map(|top| format!("{} ({:.2})", top.name, top.hours))
            .unwrap_or_else(|| "-".to_string());

        writeln!(self.writer, "- Total hours: {:.2}", statistics.total_hours)
            .context("Failed to write statistics")?;
        writeln!(
            self.writer,
            "- Average hours per day: {:.2}",
            statistics.average_hours_per_day
        )
        .context("Failed to write statistics")?;
        writeln!(self.writer, "- Most productive day: {}", most_productive_day)
            .context("Failed to write statistics")?;
        writeln!(self.writer, "- Top category: {}", top_category)
            .context("Failed to write statistics")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::ConsoleMarkdownList;
    use super::ConsolePresenter;
    use crate::analytics::{CategoryShare, Statistics, TopCategory};
    use crate::time_entry::{Category, TimeEntry};

    /// 正常系のテスト。
    #[rstest]
    #[case::no_entry(&[], "No entries for this date\n")]
    #[case::single(
        &[dummy_entry(1)],
        &expected_output(&dummy_entry(1), "Work"),
    )]
    #[case::with_description(
        &[dummy_entry(4)],
        &(expected_output(&dummy_entry(4), "Study") + "  - chapter 3\n"),
    )]
    #[case::double(
        &[dummy_entry(1), dummy_entry(2)],
        &[expected_output(&dummy_entry(1), "Work"), expected_output(&dummy_entry(2), "Work")].join(""),
    )]
    #[case::sort_with_start_time(
        &[dummy_entry(2), dummy_entry(1)],
        &[expected_output(&dummy_entry(1), "Work"), expected_output(&dummy_entry(2), "Work")].join(""),
    )]
    #[case::unknown_category(
        &[dummy_entry(3)],
        &expected_output(&dummy_entry(3), "-"),
    )]
    fn test_show_time_entries(#[case] input: &[TimeEntry], #[case] expected: &str) {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_time_entries(input, &categories()).unwrap();

        assert_eq!(String::from_utf8(writer).unwrap(), expected);
    }

    #[test]
    fn test_show_categories() {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_categories(&categories()).unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "- Work (c1, #3366ff)\n- Study (c2, #33aa55)\n"
        );
    }

    #[test]
    fn test_show_category_breakdown() {
        let shares = vec![CategoryShare {
            category_id: "c1".to_string(),
            name: "Work".to_string(),
            color: "#3366ff".to_string(),
            minutes: 89.6,
        }];
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_category_breakdown(&shares).unwrap();

        assert_eq!(String::from_utf8(writer).unwrap(), "- Work: 90 minutes\n");
    }

    #[rstest]
    #[case::with_data(
        Statistics {
            total_hours: 7.0,
            average_hours_per_day: 3.5,
            most_productive_day: NaiveDate::from_ymd_opt(2024, 3, 2),
            top_category: Some(TopCategory { name: "Work".to_string(), hours: 4.0, color: "#3366ff".to_string() }),
        },
        "- Total hours: 7.00\n- Average hours per day: 3.50\n- Most productive day: 2024-03-02\n- Top category: Work (4.00)\n",
    )]
    #[case::empty(
        Statistics { total_hours: 0.0, average_hours_per_day: 0.0, most_productive_day: None, top_category: None },
        "- Total hours: 0.00\n- Average hours per day: 0.00\n- Most productive day: -\n- Top category: -\n",
    )]
    fn test_show_statistics(#[case] statistics: Statistics, #[case] expected: &str) {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_statistics(&statistics).unwrap();

        assert_eq!(String::from_utf8(writer).unwrap(), expected);
    }

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: "c1".to_string(),
                name: "Work".to_string(),
                color: "#3366ff".to_string(),
                user_id: None,
                created_at: None,
                updated_at: None,
            },
            Category {
                id: "c2".to_string(),
                name: "Study".to_string(),
                color: "#33aa55".to_string(),
                user_id: None,
                created_at: None,
                updated_at: None,
            },
        ]
    }

    /// テスト用にダミーのTimeEntryを作成する。
    fn dummy_entry(pattern: u8) -> TimeEntry {
        let (id, start, end, category_id, description) = match pattern {
            1 => ("e1", 1, 2, "c1", None),
            2 => ("e2", 3, 4, "c1", None),
            3 => ("e3", 5, 6, "c9", None),
            4 => ("e4", 7, 8, "c2", Some("chapter 3".to_string())),
            _ => panic!("Invalid pattern: {}", pattern),
        };
        TimeEntry {
            id: id.to_string(),
            title: format!("entry{}", pattern),
            description,
            start_time: Utc.with_ymd_and_hms(2021, 1, 1, start, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2021, 1, 1, end, 0, 0).unwrap(),
            category_id: category_id.to_string(),
            user_id: None,    // 利用しないのでなんでも良い
            created_at: None, // 利用しないのでなんでも良い
            updated_at: None, // 利用しないのでなんでも良い
        }
    }

    /// テスト用に出力の1 time entryに対する期待値の文字列を作成する。
    fn expected_output(entry: &TimeEntry, category: &str) -> String {
        let start_str = entry
            .start_time
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();
        let end_str = entry
            .end_time
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();
        format!(
            "- {} ~ {}: {} [{}] ({})\n",
            start_str, end_str, entry.title, category, entry.id
        )
    }
}
