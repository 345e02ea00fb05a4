use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

use crate::model::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayEmphasis {
    Today,
    Empty,
    Single,
    Multiple,
}

#[derive(Debug)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub posts: Vec<&'a Post>,
    pub emphasis: DayEmphasis,
}

#[derive(Debug)]
pub struct WeekView<'a> {
    pub days: [DayCell<'a>; 7],
}

#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

#[must_use]
pub fn start_of_week(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    let day_idx = i64::from(day.weekday().num_days_from_monday());
    let start_idx = i64::from(week_start.num_days_from_monday());
    add_days(day, -((7 + day_idx - start_idx) % 7))
}

#[must_use]
pub fn week_window(reference: NaiveDate, week_start: Weekday) -> [NaiveDate; 7] {
    let first = start_of_week(reference, week_start);
    std::array::from_fn(|offset| add_days(first, offset as i64))
}

#[must_use]
pub fn today_in_zone(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

#[must_use]
pub fn classify_day(post_count: usize, is_today: bool) -> DayEmphasis {
    if is_today {
        return DayEmphasis::Today;
    }
    match post_count {
        0 => DayEmphasis::Empty,
        1 => DayEmphasis::Single,
        _ => DayEmphasis::Multiple,
    }
}

#[must_use]
pub fn bucket_posts<'a>(
    posts: &'a [Post],
    selection: &BTreeSet<String>,
    window: &[NaiveDate; 7],
    tz: Tz,
) -> [Vec<&'a Post>; 7] {
    let mut buckets: [Vec<&'a Post>; 7] = std::array::from_fn(|_| Vec::new());
    for post in posts {
        if !selection.contains(&post.client_id) {
            continue;
        }
        let date = post.local_date(tz);
        if let Some(slot) = window.iter().position(|day| *day == date) {
            buckets[slot].push(post);
        }
    }
    buckets
}

#[must_use]
pub fn week_view<'a>(
    posts: &'a [Post],
    selection: &BTreeSet<String>,
    reference: NaiveDate,
    today: NaiveDate,
    tz: Tz,
    week_start: Weekday,
) -> WeekView<'a> {
    let window = week_window(reference, week_start);
    let mut buckets = bucket_posts(posts, selection, &window, tz).into_iter();
    let days = window.map(|date| {
        let day_posts = buckets.next().unwrap_or_default();
        let emphasis = classify_day(day_posts.len(), date == today);
        DayCell {
            date,
            posts: day_posts,
            emphasis,
        }
    });
    WeekView { days }
}
