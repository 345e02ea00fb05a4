use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use postdeck_core::calendar::DayEmphasis;
use postdeck_core::datastore::{LocalStore, Store};
use postdeck_core::model::{NewPost, Platform, PostPatch, PostStatus};
use postdeck_core::state::{AppState, Session, View};
use tempfile::tempdir;

fn moscow() -> Tz {
    "Europe/Moscow".parse().expect("valid zone")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[test]
fn seeded_store_drives_the_week_view() {
    let temp = tempdir().expect("tempdir");
    let store = Store::Local(LocalStore::open(temp.path()).expect("open local store"));

    let today = date(2025, 10, 1);

    let state = AppState::load(&store, &Session::default(), today).expect("load workspace");
    assert_eq!(state.clients.len(), 3);
    assert_eq!(state.posts.len(), 3);
    assert_eq!(state.templates.len(), 3);

    // seed listing follows the REST ordering contract
    assert_eq!(state.clients[0].name, "Aesthetic Cafe");
    assert_eq!(state.clients[2].name, "Urban Clothing");
    assert!(state.posts[0].scheduled_for <= state.posts[1].scheduled_for);

    let week = state.week(today, moscow(), Weekday::Mon);
    assert_eq!(week.days[0].date, date(2025, 9, 29));
    assert_eq!(week.days[6].date, date(2025, 10, 5));

    // one seeded post per day Wed..Fri; Wednesday is today
    assert_eq!(week.days[2].emphasis, DayEmphasis::Today);
    assert_eq!(week.days[2].posts.len(), 1);
    assert_eq!(week.days[3].emphasis, DayEmphasis::Single);
    assert_eq!(week.days[4].emphasis, DayEmphasis::Single);
    assert_eq!(week.days[0].emphasis, DayEmphasis::Empty);

    let total: usize = week.days.iter().map(|day| day.posts.len()).sum();
    assert_eq!(total, 3);

    // deselecting a client only shrinks buckets
    let narrowed = state.clone().with_selection_toggled("2");
    let week = narrowed.week(today, moscow(), Weekday::Mon);
    assert!(week.days[3].posts.is_empty());
    assert_eq!(week.days[2].posts.len(), 1);
}

#[test]
fn mutations_confirm_against_the_store_before_updating_state() {
    let temp = tempdir().expect("tempdir");
    let store = Store::Local(LocalStore::open(temp.path()).expect("open local store"));

    let today = date(2025, 10, 1);
    let state = AppState::load(&store, &Session::default(), today).expect("load workspace");

    let draft = NewPost {
        client_id: "1".to_string(),
        content: "Вечер джаза в пятницу".to_string(),
        media: Vec::new(),
        platforms: vec![Platform::Telegram],
        scheduled_for: chrono::DateTime::parse_from_rfc3339("2025-10-03T19:00:00+03:00")
            .expect("valid timestamp"),
        status: PostStatus::Scheduled,
        created_at: chrono::DateTime::parse_from_rfc3339("2025-10-01T09:00:00+03:00")
            .expect("valid stamp"),
        updated_at: chrono::DateTime::parse_from_rfc3339("2025-10-01T09:00:00+03:00")
            .expect("valid stamp"),
    };
    let created = store.create_post(&draft).expect("create post");
    assert_eq!(created.id, "4");
    let state = state.with_post_added(created.clone());

    // the new post lands in the Friday bucket in input (store) order
    let week = state.week(today, moscow(), Weekday::Mon);
    assert_eq!(week.days[4].posts.len(), 2);
    assert_eq!(week.days[4].emphasis, DayEmphasis::Multiple);
    assert_eq!(week.days[4].posts[1].id, "4");

    // a failed mutation leaves the snapshot untouched
    let before = state.posts.len();
    assert!(store.delete_post("99").is_err());
    assert_eq!(state.posts.len(), before);

    let patch = PostPatch {
        status: Some(PostStatus::Published),
        ..PostPatch::default()
    };
    let updated = store.update_post("4", &patch).expect("update post");
    assert_eq!(updated.status, PostStatus::Published);
    assert_eq!(updated.content, created.content);

    store.delete_post("4").expect("delete post");

    // a fresh open sees only confirmed rows
    let reopened = Store::Local(LocalStore::open(temp.path()).expect("reopen local store"));
    let posts = reopened.list_posts().expect("list posts");
    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|post| post.id != "4"));
}

#[test]
fn session_navigation_round_trips() {
    let temp = tempdir().expect("tempdir");
    let store = Store::Local(LocalStore::open(temp.path()).expect("open local store"));
    let path = temp.path().join("session.json");

    let today = date(2025, 10, 1);
    let state = AppState::load(&store, &Session::default(), today).expect("load workspace");
    assert_eq!(state.reference_date, today);

    let state = state.with_week_shifted(1).with_selection_toggled("3");
    state
        .session(View::Calendar)
        .save(&path)
        .expect("save session");

    let session = Session::load(&path);
    assert_eq!(session.view, View::Calendar);
    assert_eq!(session.reference_date, Some(date(2025, 10, 8)));

    let restored = AppState::load(&store, &session, today).expect("reload workspace");
    assert_eq!(restored.reference_date, date(2025, 10, 8));
    assert!(!restored.selection().contains("3"));
    assert_eq!(restored.selection().len(), 2);

    // the shifted week no longer contains the seeded posts
    let week = restored.week(today, moscow(), Weekday::Mon);
    assert!(week.days.iter().all(|day| day.posts.is_empty()));
    assert!(week.days.iter().all(|day| day.emphasis == DayEmphasis::Empty));
}
