use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::streak;
use crate::domain::survey::SurveyAnswers;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub cycle_length: i32,
    pub period_length: i32,
    pub survey_completed: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub age: Option<i32>,
    pub last_period_date: Option<NaiveDate>,
    pub period_duration: Option<String>,
    pub cycle_length_band: Option<String>,
    pub period_regularity: Option<String>,
    pub hair_growth: Option<String>,
    pub acne: Option<String>,
    pub hair_thinning: Option<String>,
    pub weight_gain: Option<String>,
    pub sugar_craving: Option<String>,
    pub family_history: Option<String>,
    pub fertility: Option<String>,
    pub mood_swings: Option<String>,
}

impl SurveyResponse {
    /// Charted answer subset for the risk profile builder.
    pub fn answers(&self) -> SurveyAnswers {
        SurveyAnswers {
            period_regularity: self.period_regularity.clone(),
            hair_growth: self.hair_growth.clone(),
            acne: self.acne.clone(),
            hair_thinning: self.hair_thinning.clone(),
            weight_gain: self.weight_gain.clone(),
            sugar_craving: self.sugar_craving.clone(),
            family_history: self.family_history.clone(),
            fertility: self.fertility.clone(),
            mood_swings: self.mood_swings.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSurvey {
    pub age: Option<i32>,
    pub last_period_date: Option<NaiveDate>,
    pub period_duration: Option<String>,
    pub cycle_length_band: Option<String>,
    pub period_regularity: Option<String>,
    pub hair_growth: Option<String>,
    pub acne: Option<String>,
    pub hair_thinning: Option<String>,
    pub weight_gain: Option<String>,
    pub sugar_craving: Option<String>,
    pub family_history: Option<String>,
    pub fertility: Option<String>,
    pub mood_swings: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SymptomEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub flow_level: Option<String>,
    pub mood: Option<String>,
    pub pain_level: Option<i16>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct DailyCheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub check_date: NaiveDate,
    pub login_time: DateTime<Utc>,
    pub checkin_time: Option<DateTime<Utc>>,
    pub is_checked_in: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub checkin: DailyCheckIn,
    pub is_new_login: bool,
}

#[derive(Debug)]
pub enum CheckinOutcome {
    /// This call performed the one false→true transition for the day.
    Completed(DailyCheckIn),
    /// The day was already checked in; carries the original record.
    AlreadyCheckedIn(DailyCheckIn),
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, email, full_name, cycle_length, period_length,
               survey_completed, is_active, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Update cycle profile lengths. Range validation happens at the web
/// boundary; `None` leaves a column unchanged.
pub async fn update_cycle_settings(
    pool: &PgPool,
    user_id: Uuid,
    cycle_length: Option<i32>,
    period_length: Option<i32>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET cycle_length = COALESCE($2, cycle_length),
            period_length = COALESCE($3, period_length)
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(cycle_length)
    .bind(period_length)
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert a survey submission and mark the profile complete in one
/// transaction, so a failure leaves no partial state behind.
pub async fn insert_survey(pool: &PgPool, user_id: Uuid, survey: &NewSurvey) -> Result<Uuid> {
    let mut tx = pool.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO survey_responses (
            user_id, age, last_period_date, period_duration, cycle_length_band,
            period_regularity, hair_growth, acne, hair_thinning, weight_gain,
            sugar_craving, family_history, fertility, mood_swings
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(survey.age)
    .bind(survey.last_period_date)
    .bind(&survey.period_duration)
    .bind(&survey.cycle_length_band)
    .bind(&survey.period_regularity)
    .bind(&survey.hair_growth)
    .bind(&survey.acne)
    .bind(&survey.hair_thinning)
    .bind(&survey.weight_gain)
    .bind(&survey.sugar_craving)
    .bind(&survey.family_history)
    .bind(&survey.fertility)
    .bind(&survey.mood_swings)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET survey_completed = true WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(id)
}

/// The most recent submission is authoritative for all derived
/// computations; older rows are retained but never consulted.
pub async fn latest_survey(pool: &PgPool, user_id: Uuid) -> Result<Option<SurveyResponse>> {
    let survey = sqlx::query_as::<_, SurveyResponse>(
        r#"
        SELECT id, user_id, submitted_at, age, last_period_date, period_duration,
               cycle_length_band, period_regularity, hair_growth, acne,
               hair_thinning, weight_gain, sugar_craving, family_history,
               fertility, mood_swings
        FROM survey_responses
        WHERE user_id = $1
        ORDER BY submitted_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(survey)
}

/// Record a new period start/end on the latest survey row, creating a
/// bare row when the user has never submitted one.
pub async fn update_period_dates(
    pool: &PgPool,
    user_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<()> {
    let duration_days = (end_date - start_date).num_days() + 1;
    let duration = format!("{duration_days} days");

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE survey_responses
        SET last_period_date = $2, period_duration = $3
        WHERE id = (
            SELECT id FROM survey_responses
            WHERE user_id = $1
            ORDER BY submitted_at DESC
            LIMIT 1
        )
        "#,
    )
    .bind(user_id)
    .bind(start_date)
    .bind(&duration)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        sqlx::query(
            r#"
            INSERT INTO survey_responses (user_id, last_period_date, period_duration)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(start_date)
        .bind(&duration)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// One row per (user, entry_date); a second write for the same day
/// overwrites in place.
pub async fn upsert_symptom_entry(
    pool: &PgPool,
    user_id: Uuid,
    entry_date: NaiveDate,
    flow_level: Option<&str>,
    mood: Option<&str>,
    pain_level: Option<i16>,
    notes: Option<&str>,
) -> Result<SymptomEntry> {
    let entry = sqlx::query_as::<_, SymptomEntry>(
        r#"
        INSERT INTO symptom_entries (user_id, entry_date, flow_level, mood, pain_level, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, entry_date) DO UPDATE
        SET flow_level = EXCLUDED.flow_level,
            mood = EXCLUDED.mood,
            pain_level = EXCLUDED.pain_level,
            notes = EXCLUDED.notes,
            updated_at = now()
        RETURNING id, user_id, entry_date, flow_level, mood, pain_level, notes,
                  created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(entry_date)
    .bind(flow_level)
    .bind(mood)
    .bind(pain_level)
    .bind(notes)
    .fetch_one(pool)
    .await?;
    Ok(entry)
}

pub async fn get_symptom_entry(
    pool: &PgPool,
    user_id: Uuid,
    entry_date: NaiveDate,
) -> Result<Option<SymptomEntry>> {
    let entry = sqlx::query_as::<_, SymptomEntry>(
        r#"
        SELECT id, user_id, entry_date, flow_level, mood, pain_level, notes,
               created_at, updated_at
        FROM symptom_entries
        WHERE user_id = $1 AND entry_date = $2
        "#,
    )
    .bind(user_id)
    .bind(entry_date)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

pub async fn list_symptom_entries(pool: &PgPool, user_id: Uuid) -> Result<Vec<SymptomEntry>> {
    let entries = sqlx::query_as::<_, SymptomEntry>(
        r#"
        SELECT id, user_id, entry_date, flow_level, mood, pain_level, notes,
               created_at, updated_at
        FROM symptom_entries
        WHERE user_id = $1
        ORDER BY entry_date ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// First login event of the day creates the row; later calls (and
/// racing duplicates, resolved by the unique constraint) read it back
/// unchanged.
pub async fn record_login(pool: &PgPool, user_id: Uuid, date: NaiveDate) -> Result<LoginOutcome> {
    let inserted = sqlx::query_as::<_, DailyCheckIn>(
        r#"
        INSERT INTO daily_checkins (user_id, check_date, login_time, is_checked_in)
        VALUES ($1, $2, now(), false)
        ON CONFLICT (user_id, check_date) DO NOTHING
        RETURNING id, user_id, check_date, login_time, checkin_time, is_checked_in, created_at
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    if let Some(checkin) = inserted {
        return Ok(LoginOutcome {
            checkin,
            is_new_login: true,
        });
    }

    let existing = get_checkin(pool, user_id, date)
        .await?
        .ok_or_else(|| anyhow::anyhow!("check-in row missing for user {user_id} on {date}"))?;
    Ok(LoginOutcome {
        checkin: existing,
        is_new_login: false,
    })
}

/// Complete today's check-in. Creates the row first when it is missing
/// (an implicit login). The conditional UPDATE lets exactly one caller
/// observe the false→true transition; everyone else gets the original
/// record back.
pub async fn record_checkin(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<CheckinOutcome> {
    sqlx::query(
        r#"
        INSERT INTO daily_checkins (user_id, check_date, login_time, is_checked_in)
        VALUES ($1, $2, now(), false)
        ON CONFLICT (user_id, check_date) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(date)
    .execute(pool)
    .await?;

    let transitioned = sqlx::query_as::<_, DailyCheckIn>(
        r#"
        UPDATE daily_checkins
        SET is_checked_in = true, checkin_time = now()
        WHERE user_id = $1 AND check_date = $2 AND is_checked_in = false
        RETURNING id, user_id, check_date, login_time, checkin_time, is_checked_in, created_at
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    if let Some(checkin) = transitioned {
        return Ok(CheckinOutcome::Completed(checkin));
    }

    let existing = get_checkin(pool, user_id, date)
        .await?
        .ok_or_else(|| anyhow::anyhow!("check-in row missing for user {user_id} on {date}"))?;
    Ok(CheckinOutcome::AlreadyCheckedIn(existing))
}

pub async fn get_checkin(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DailyCheckIn>> {
    let checkin = sqlx::query_as::<_, DailyCheckIn>(
        r#"
        SELECT id, user_id, check_date, login_time, checkin_time, is_checked_in, created_at
        FROM daily_checkins
        WHERE user_id = $1 AND check_date = $2
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(checkin)
}

pub async fn get_checkins_between(
    pool: &PgPool,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyCheckIn>> {
    let checkins = sqlx::query_as::<_, DailyCheckIn>(
        r#"
        SELECT id, user_id, check_date, login_time, checkin_time, is_checked_in, created_at
        FROM daily_checkins
        WHERE user_id = $1 AND check_date >= $2 AND check_date <= $3
        ORDER BY check_date ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(checkins)
}

pub async fn count_logins(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_checkins WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

const STREAK_PAGE_SIZE: i64 = 366;

/// Consecutive checked-in days ending at `today`. Reads in pages and
/// only fetches another page while the previous one was fully
/// consecutive, so the work stays bounded by the streak length and a
/// streak longer than one page is never truncated.
pub async fn current_streak(pool: &PgPool, user_id: Uuid, today: NaiveDate) -> Result<u32> {
    current_streak_paged(pool, user_id, today, STREAK_PAGE_SIZE).await
}

async fn current_streak_paged(
    pool: &PgPool,
    user_id: Uuid,
    today: NaiveDate,
    page_size: i64,
) -> Result<u32> {
    let mut total = 0u32;
    let mut cursor = today;
    loop {
        let page = checked_in_dates_desc(pool, user_id, cursor, page_size).await?;
        let gained = streak::current_streak(cursor, &page);
        total += gained;
        // A partial run means a gap or exhausted history.
        if (gained as i64) < page_size {
            return Ok(total);
        }
        cursor -= Duration::days(gained as i64);
    }
}

/// Checked-in dates up to `upto`, newest first, feeding the backward
/// streak scan.
async fn checked_in_dates_desc(
    pool: &PgPool,
    user_id: Uuid,
    upto: NaiveDate,
    limit: i64,
) -> Result<Vec<NaiveDate>> {
    let dates: Vec<NaiveDate> = sqlx::query_scalar(
        r#"
        SELECT check_date
        FROM daily_checkins
        WHERE user_id = $1 AND check_date <= $2 AND is_checked_in = true
        ORDER BY check_date DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(upto)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_user(pool: &PgPool) -> Uuid {
        sqlx::query_scalar("INSERT INTO users (email, full_name) VALUES ($1, $2) RETURNING id")
            .bind(format!("{}@example.com", Uuid::new_v4()))
            .bind("Test User")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn check_in_on(pool: &PgPool, user_id: Uuid, dates: &[NaiveDate]) {
        for &date in dates {
            sqlx::query(
                r#"
                INSERT INTO daily_checkins (user_id, check_date, is_checked_in, checkin_time)
                VALUES ($1, $2, true, now())
                "#,
            )
            .bind(user_id)
            .bind(date)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[sqlx::test]
    async fn second_login_reports_existing_record_unchanged(pool: PgPool) {
        let user_id = create_user(&pool).await;
        let date = d(2024, 5, 10);

        let first = record_login(&pool, user_id, date).await.unwrap();
        assert!(first.is_new_login);
        assert!(!first.checkin.is_checked_in);

        let second = record_login(&pool, user_id, date).await.unwrap();
        assert!(!second.is_new_login);
        assert_eq!(second.checkin.login_time, first.checkin.login_time);
        assert_eq!(second.checkin.id, first.checkin.id);
    }

    #[sqlx::test]
    async fn repeat_checkin_keeps_the_original_time(pool: PgPool) {
        let user_id = create_user(&pool).await;
        let date = d(2024, 5, 10);

        let first = match record_checkin(&pool, user_id, date).await.unwrap() {
            CheckinOutcome::Completed(checkin) => checkin,
            CheckinOutcome::AlreadyCheckedIn(_) => panic!("first check-in must complete"),
        };
        assert!(first.is_checked_in);
        assert!(first.checkin_time.is_some());

        let second = match record_checkin(&pool, user_id, date).await.unwrap() {
            CheckinOutcome::AlreadyCheckedIn(checkin) => checkin,
            CheckinOutcome::Completed(_) => panic!("second check-in must not transition again"),
        };
        assert_eq!(second.checkin_time, first.checkin_time);
    }

    #[sqlx::test]
    async fn checkin_without_prior_login_creates_the_row(pool: PgPool) {
        let user_id = create_user(&pool).await;
        let date = d(2024, 5, 10);

        let outcome = record_checkin(&pool, user_id, date).await.unwrap();
        let checkin = match outcome {
            CheckinOutcome::Completed(checkin) => checkin,
            CheckinOutcome::AlreadyCheckedIn(_) => panic!("fresh day must complete"),
        };
        assert!(checkin.is_checked_in);

        // The implicit login is visible to a later explicit login.
        let login = record_login(&pool, user_id, date).await.unwrap();
        assert!(!login.is_new_login);
    }

    #[sqlx::test]
    async fn login_alone_does_not_extend_the_streak(pool: PgPool) {
        let user_id = create_user(&pool).await;
        let today = d(2024, 5, 10);

        check_in_on(&pool, user_id, &[d(2024, 5, 9), d(2024, 5, 8)]).await;
        record_login(&pool, user_id, today).await.unwrap();

        // Today is logged in but not checked in, so it does not count.
        assert_eq!(current_streak(&pool, user_id, today).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn streak_spans_page_boundaries(pool: PgPool) {
        let user_id = create_user(&pool).await;
        let today = d(2024, 5, 20);

        let run: Vec<NaiveDate> = (0..20).map(|i| today - Duration::days(i)).collect();
        check_in_on(&pool, user_id, &run).await;

        // A page smaller than the run must not truncate it.
        assert_eq!(
            current_streak_paged(&pool, user_id, today, 7).await.unwrap(),
            20
        );
    }

    #[sqlx::test]
    async fn paged_streak_stops_at_a_gap(pool: PgPool) {
        let user_id = create_user(&pool).await;
        let today = d(2024, 5, 20);

        // 2024-05-13 missing: the run before it must not count.
        let mut run: Vec<NaiveDate> = (0..7).map(|i| today - Duration::days(i)).collect();
        run.extend((8..12).map(|i| today - Duration::days(i)));
        check_in_on(&pool, user_id, &run).await;

        assert_eq!(
            current_streak_paged(&pool, user_id, today, 7).await.unwrap(),
            7
        );
    }
}
