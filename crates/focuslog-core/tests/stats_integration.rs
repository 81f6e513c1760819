//! Integration tests for range statistics over stored days.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use focuslog_core::{
    DailySessions, DateRange, EntryType, InterruptionTag, RecoveryPolicy, Session, Storage,
    StorageOptions, TimeEntry,
};

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, n).unwrap()
}

fn at(d: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 3, d, hour, minute, 0).unwrap()
}

/// A session from `start` lasting `minutes`, with interruptions given as
/// (tag, offset, length) in minutes.
fn session(
    start: DateTime<Local>,
    minutes: i64,
    pauses: &[(Option<InterruptionTag>, i64, i64)],
) -> Session {
    let mut s = Session::new(TimeEntry::new(EntryType::Start, start, None));
    for (tag, offset, length) in pauses {
        let from = start + Duration::minutes(*offset);
        let mut entry = TimeEntry::new(EntryType::Interruption, from, None);
        entry.tag = tag.clone();
        s.interrupt(entry).unwrap();
        s.return_from_interruption(TimeEntry::new(
            EntryType::Return,
            from + Duration::minutes(*length),
            None,
        ))
        .unwrap();
    }
    s.end(TimeEntry::new(
        EntryType::End,
        start + Duration::minutes(minutes),
        None,
    ))
    .unwrap();
    s
}

fn seeded_storage(dir: &tempfile::TempDir, custom_tags: Vec<String>) -> Storage {
    let storage = Storage::open(
        StorageOptions::new(dir.path())
            .with_custom_tags(custom_tags)
            .with_recovery(RecoveryPolicy::default()),
    )
    .unwrap();

    // Day 10: two hours with a 30 minute call, plus one clean hour.
    let mut first = DailySessions::new(day(10));
    first.sessions.push(session(
        at(10, 9, 0),
        120,
        &[(Some(InterruptionTag::Call), 30, 30)],
    ));
    first.sessions.push(session(at(10, 14, 0), 60, &[]));
    storage.save(&first).unwrap();

    // Day 12: three hours with a meeting and an untagged pause.
    let mut second = DailySessions::new(day(12));
    second.sessions.push(session(
        at(12, 9, 0),
        180,
        &[(Some(InterruptionTag::Meeting), 30, 60), (None, 120, 15)],
    ));
    storage.save(&second).unwrap();

    storage
}

#[test]
fn test_totals_over_range() {
    let dir = tempfile::tempdir().unwrap();
    let storage = seeded_storage(&dir, vec![]);

    let totals = storage.totals_in(DateRange::new(day(10), day(12)), at(12, 18, 0));
    // Day 10: 90 + 60, day 12: 180 - 60 - 15.
    assert_eq!(totals.work, Duration::minutes(255));
    assert_eq!(totals.interruption, Duration::minutes(105));
    assert_eq!(totals.interruptions, 3);
}

#[test]
fn test_tag_stats_over_range() {
    let dir = tempfile::tempdir().unwrap();
    let storage = seeded_storage(&dir, vec!["dog".to_string()]);

    let stats = storage.tag_stats_in(DateRange::new(day(10), day(12)));
    let tags: Vec<String> = stats.iter().map(|s| s.tag.to_string()).collect();
    assert_eq!(tags, vec!["call", "meeting", "spouse", "other", "dog"]);

    assert_eq!(stats[0].count, 1);
    assert_eq!(stats[0].total_with_recovery, Duration::minutes(40));
    assert_eq!(stats[1].total_time, Duration::minutes(60));
    assert_eq!(stats[3].count, 1);
    assert_eq!(stats[3].total_time, Duration::minutes(15));
    assert_eq!(stats[4].count, 0);
}

#[test]
fn test_detailed_stats_over_range() {
    let dir = tempfile::tempdir().unwrap();
    let storage = seeded_storage(&dir, vec![]);

    let stats = storage.detailed_stats_in(DateRange::new(day(10), day(12)), at(12, 18, 0));
    assert_eq!(stats.total_sessions, 3);
    assert_eq!(stats.total_work, Duration::minutes(255));
    assert_eq!(stats.longest_session, Duration::minutes(105));
    assert_eq!(stats.average_session, Duration::minutes(85));
    assert_eq!(stats.total_interruptions, 3);
    assert_eq!(stats.interruptions_by_tag[&InterruptionTag::Call], 1);

    // Day 11 has no file and contributes an empty entry.
    assert_eq!(stats.daily_work.len(), 3);
    assert_eq!(stats.daily_work[&day(11)], Duration::zero());

    // 09:00 buckets hold 90 + 105 minutes.
    assert_eq!(stats.most_productive_hour(), Some((9, Duration::minutes(195))));

    // 255 / (255 + 105 + 30) * 100, ratio 1.0 => * 0.9
    let expected = 255.0 / 390.0 * 100.0 * 0.9;
    assert!((stats.productivity_score - expected).abs() < 1e-9);
}

#[test]
fn test_range_keyword_errors() {
    let dir = tempfile::tempdir().unwrap();
    let storage = seeded_storage(&dir, vec![]);
    assert!(storage.totals("fortnight").is_err());
    assert!(storage.detailed_stats("week").is_ok());

    let all = storage.date_range_on("all", day(20)).unwrap();
    assert_eq!(all.start, day(10));
    assert_eq!(all.end, day(20));
}
