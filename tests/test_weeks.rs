//! Week generator properties and calendar scenarios.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use shipment_kpi::weeks::days_in_month;
use shipment_kpi::{generate_weeks, generate_weeks_with, TailPolicy};

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

fn all_months() -> impl Iterator<Item = (u32, i32)> {
    (2000..=2030).flat_map(|y| (1..=12).map(move |m| (m, y)))
}

// ---------------------------------------------------------------------------
// Properties over every month
// ---------------------------------------------------------------------------

#[test]
fn buckets_cover_month_contiguously() {
    for (month, year) in all_months() {
        for policy in [TailPolicy::Merge, TailPolicy::Keep] {
            let plan = generate_weeks_with(month, year, policy).unwrap();
            let buckets = &plan.buckets;

            assert_eq!(buckets.first().unwrap().start, plan.month_start, "{year}-{month}");
            assert_eq!(buckets.last().unwrap().end, plan.month_end, "{year}-{month}");
            for pair in buckets.windows(2) {
                assert_eq!(pair[1].start, pair[0].end + Duration::seconds(1), "{year}-{month}");
            }
            for b in buckets {
                assert!(b.start < b.end, "{year}-{month}: empty bucket");
                assert!(b.start >= plan.month_start && b.end <= plan.month_end);
                assert_eq!(b.start.month(), month);
                assert_eq!(b.end.month(), month);
            }
        }
    }
}

#[test]
fn bucket_count_is_between_four_and_six() {
    for (month, year) in all_months() {
        for policy in [TailPolicy::Merge, TailPolicy::Keep] {
            let n = generate_weeks_with(month, year, policy).unwrap().buckets.len();
            assert!((4..=6).contains(&n), "{year}-{month}: {n} buckets");
        }
    }
}

#[test]
fn week_indices_are_consecutive_from_one() {
    for (month, year) in all_months() {
        let plan = generate_weeks(month, year).unwrap();
        for (i, b) in plan.buckets.iter().enumerate() {
            assert_eq!(b.week_index, i as u32 + 1);
        }
    }
}

#[test]
fn buckets_after_the_first_start_on_monday() {
    for (month, year) in all_months() {
        let plan = generate_weeks(month, year).unwrap();
        for b in plan.buckets.iter().skip(1) {
            assert_eq!(b.start.weekday(), Weekday::Mon, "{year}-{month}");
        }
    }
}

#[test]
fn short_tail_survives_only_in_four_week_months() {
    for (month, year) in all_months() {
        let plan = generate_weeks(month, year).unwrap();
        if plan.buckets.last().unwrap().span_days() < 6 {
            assert_eq!(plan.buckets.len(), 4, "{year}-{month}");
        }
    }
}

#[test]
fn weekend_february_is_not_merged_below_four_weeks() {
    // February 2026 starts on a Sunday: 1-8, 9-15, 16-22, 23-28.
    let plan = generate_weeks(2, 2026).unwrap();
    assert_eq!(plan.buckets.len(), 4);
    assert_eq!(plan.buckets[0].end, at(2026, 2, 8, 23, 59, 59));
    assert_eq!(plan.buckets[3].start, at(2026, 2, 23, 0, 0, 0));
    assert_eq!(plan.buckets[3].week_index, 4);
}

#[test]
fn generation_is_idempotent() {
    for (month, year) in all_months() {
        assert_eq!(generate_weeks(month, year).unwrap(), generate_weeks(month, year).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn january_2024_starts_on_monday() {
    let naive = generate_weeks_with(1, 2024, TailPolicy::Keep).unwrap();
    assert_eq!(naive.buckets.len(), 5);
    let first = &naive.buckets[0];
    assert_eq!(first.start, at(2024, 1, 1, 0, 0, 0));
    assert_eq!(first.end, at(2024, 1, 7, 23, 59, 59));
    assert_eq!(first.week_index, 1);
    assert_eq!(first.month_label, "January");

    // The 29th-31st tail is folded into week 4.
    let merged = generate_weeks(1, 2024).unwrap();
    assert_eq!(merged.buckets.len(), 4);
    assert_eq!(merged.buckets[0], naive.buckets[0]);
    let last = merged.buckets.last().unwrap();
    assert_eq!(last.week_index, 4);
    assert_eq!(last.start, at(2024, 1, 22, 0, 0, 0));
    assert_eq!(last.end, at(2024, 1, 31, 23, 59, 59));
}

#[test]
fn february_2024_is_a_leap_month_starting_thursday() {
    let plan = generate_weeks(2, 2024).unwrap();
    assert_eq!(plan.days_in_month, 29);
    assert_eq!(days_in_month(2024, 2).unwrap(), 29);

    let first = &plan.buckets[0];
    assert_eq!(first.start, at(2024, 2, 1, 0, 0, 0));
    assert_eq!(first.end, at(2024, 2, 4, 23, 59, 59));
    assert_eq!(first.week_index, 1);
    assert_eq!(plan.buckets[1].week_index, 2);
    assert_eq!(plan.buckets[1].start, at(2024, 2, 5, 0, 0, 0));
}

#[test]
fn two_day_tail_is_absorbed() {
    // April 2024 starts on a Monday; the naive last week is the 29th-30th.
    let naive = generate_weeks_with(4, 2024, TailPolicy::Keep).unwrap();
    let tail = naive.buckets.last().unwrap();
    assert_eq!(tail.start, at(2024, 4, 29, 0, 0, 0));
    assert_eq!(tail.end, at(2024, 4, 30, 23, 59, 59));

    let merged = generate_weeks(4, 2024).unwrap();
    assert_eq!(merged.buckets.len(), naive.buckets.len() - 1);
    let last = merged.buckets.last().unwrap();
    assert_eq!(last.start, at(2024, 4, 22, 0, 0, 0));
    assert_eq!(last.end, merged.month_end);
    assert_eq!(merged.month_end, at(2024, 4, 30, 23, 59, 59));
}

#[test]
fn full_final_week_is_kept() {
    // December 2023 ends on Sunday the 31st: the last week is a full Mon-Sun.
    let plan = generate_weeks(12, 2023).unwrap();
    assert_eq!(plan.buckets.len(), 5);
    let last = plan.buckets.last().unwrap();
    assert_eq!(last.start, at(2023, 12, 25, 0, 0, 0));
    assert_eq!(last.end, at(2023, 12, 31, 23, 59, 59));
}

#[test]
fn saturday_start_runs_to_second_sunday() {
    // March 2025 starts on a Saturday.
    let plan = generate_weeks(3, 2025).unwrap();
    assert_eq!(plan.buckets[0].end, at(2025, 3, 9, 23, 59, 59));
    assert_eq!(plan.buckets[1].start, at(2025, 3, 10, 0, 0, 0));
}

#[test]
fn december_month_end_is_last_second_of_year() {
    let plan = generate_weeks(12, 2024).unwrap();
    assert_eq!(plan.month_end, at(2024, 12, 31, 23, 59, 59));
    assert_eq!(plan.days_in_month, 31);
}
