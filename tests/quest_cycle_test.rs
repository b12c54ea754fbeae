//! Multi-day quest cycles driven with explicit dates: streak accrual and
//! resets, per-day assignment identity, and threshold badges earned along
//! the way.

use chrono::NaiveDate;
use questd::achievements::storage::AchievementStore;
use questd::achievements::STREAK_5;
use questd::quests::completion::{complete_quest, CompletionOutcome};
use questd::quests::source::QuestSource;
use questd::quests::generation::daily_quests;
use questd::quests::storage::QuestStore;
use questd::storage::Storage;
use tempfile::TempDir;

struct Cycle {
    _dir: TempDir,
    storage: Storage,
    quests: QuestStore,
    achievements: AchievementStore,
    source: QuestSource,
    user_id: String,
}

async fn setup() -> Cycle {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path()).await.unwrap();
    let user = storage
        .create_user("finley", "finley@example.com", "h")
        .await
        .unwrap();
    Cycle {
        quests: QuestStore::new(storage.pool()),
        achievements: AchievementStore::new(storage.pool()),
        source: QuestSource::Catalog,
        user_id: user.id,
        storage,
        _dir: dir,
    }
}

fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap() + chrono::Days::new(n)
}

impl Cycle {
    /// Deal the day's quests and complete the first one.
    async fn complete_one(&self, date: NaiveDate) -> CompletionOutcome {
        let dealt = daily_quests(&self.quests, &self.source, &self.user_id, date)
            .await
            .unwrap();
        complete_quest(
            &self.quests,
            &self.achievements,
            &self.user_id,
            &dealt[0].quest.id,
            date,
        )
        .await
        .unwrap()
    }

    async fn streak(&self) -> i64 {
        self.storage
            .get_user(&self.user_id)
            .await
            .unwrap()
            .unwrap()
            .streak
    }
}

#[tokio::test]
async fn consecutive_days_build_a_streak_and_its_badge() {
    let cycle = setup().await;

    let mut streak_badge_days = Vec::new();
    for n in 0..5 {
        match cycle.complete_one(day(n)).await {
            CompletionOutcome::Completed { stats, unlocked, .. } => {
                assert_eq!(stats.streak, n as i64 + 1);
                if unlocked.iter().any(|a| a.code == STREAK_5) {
                    streak_badge_days.push(n);
                }
            }
            CompletionOutcome::AlreadyCompleted => panic!("fresh day reported as completed"),
        }
    }

    assert_eq!(cycle.streak().await, 5);
    // The badge lands exactly once, on the fifth day.
    assert_eq!(streak_badge_days, vec![4]);
}

#[tokio::test]
async fn a_missed_day_resets_the_streak_to_one() {
    let cycle = setup().await;

    cycle.complete_one(day(0)).await;
    cycle.complete_one(day(1)).await;
    assert_eq!(cycle.streak().await, 2);

    // Day 2 is skipped.
    cycle.complete_one(day(3)).await;
    assert_eq!(cycle.streak().await, 1);
}

#[tokio::test]
async fn extra_completions_on_one_day_leave_the_streak_alone() {
    let cycle = setup().await;

    let dealt = daily_quests(&cycle.quests, &cycle.source, &cycle.user_id, day(0))
        .await
        .unwrap();
    for quest in &dealt {
        complete_quest(
            &cycle.quests,
            &cycle.achievements,
            &cycle.user_id,
            &quest.quest.id,
            day(0),
        )
        .await
        .unwrap();
    }

    assert_eq!(cycle.streak().await, 1);
    assert_eq!(cycle.quests.count_completions(&cycle.user_id).await.unwrap(), 3);
}

#[tokio::test]
async fn each_day_gets_its_own_assignment_set() {
    let cycle = setup().await;

    let monday = daily_quests(&cycle.quests, &cycle.source, &cycle.user_id, day(0))
        .await
        .unwrap();
    let monday_again = daily_quests(&cycle.quests, &cycle.source, &cycle.user_id, day(0))
        .await
        .unwrap();
    let monday_ids: Vec<&str> = monday.iter().map(|q| q.quest.id.as_str()).collect();
    let again_ids: Vec<&str> = monday_again.iter().map(|q| q.quest.id.as_str()).collect();
    assert_eq!(monday_ids, again_ids);

    // Completing a Monday quest never marks Tuesday's deal.
    complete_quest(
        &cycle.quests,
        &cycle.achievements,
        &cycle.user_id,
        &monday[0].quest.id,
        day(0),
    )
    .await
    .unwrap();

    let tuesday = daily_quests(&cycle.quests, &cycle.source, &cycle.user_id, day(1))
        .await
        .unwrap();
    assert_eq!(tuesday.len(), 3);
    assert!(tuesday.iter().all(|q| !q.completed));
}

#[tokio::test]
async fn ten_completions_earn_the_veteran_badge() {
    let cycle = setup().await;

    let mut all_unlocked = Vec::new();
    for n in 0..4 {
        let dealt = daily_quests(&cycle.quests, &cycle.source, &cycle.user_id, day(n))
            .await
            .unwrap();
        for quest in &dealt {
            if let CompletionOutcome::Completed { unlocked, .. } = complete_quest(
                &cycle.quests,
                &cycle.achievements,
                &cycle.user_id,
                &quest.quest.id,
                day(n),
            )
            .await
            .unwrap()
            {
                all_unlocked.extend(unlocked.into_iter().map(|a| a.code));
            }
        }
    }

    // 12 completions: the 10-quest badge fired once, and only once.
    assert_eq!(
        all_unlocked.iter().filter(|c| *c == "quests_10").count(),
        1
    );
    assert_eq!(cycle.quests.count_completions(&cycle.user_id).await.unwrap(), 12);
}
