//! Backfills an employee's attendance over a date range as leave days.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    service::validation::validate_date_range,
};

/// Storage seam for the per-day upsert.
#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    /// Id of the (employee, day) record, if any.
    async fn find_day(&self, employee_id: u64, day: NaiveDate) -> sqlx::Result<Option<u64>>;

    async fn insert_leave_day(&self, employee_id: u64, day: NaiveDate) -> sqlx::Result<()>;

    async fn mark_leave_day(&self, attendance_id: u64) -> sqlx::Result<()>;
}

impl AttendanceStore for MySqlPool {
    async fn find_day(&self, employee_id: u64, day: NaiveDate) -> sqlx::Result<Option<u64>> {
        sqlx::query_scalar::<_, u64>(
            "SELECT id FROM attendance WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(day)
        .fetch_optional(self)
        .await
    }

    async fn insert_leave_day(&self, employee_id: u64, day: NaiveDate) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, is_present, is_leave)
            VALUES (?, ?, FALSE, TRUE)
            "#,
        )
        .bind(employee_id)
        .bind(day)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn mark_leave_day(&self, attendance_id: u64) -> sqlx::Result<()> {
        sqlx::query("UPDATE attendance SET is_present = FALSE, is_leave = TRUE WHERE id = ?")
            .bind(attendance_id)
            .execute(self)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct RangeOutcome {
    pub created: u32,
    pub updated: u32,
}

/// Longest range accepted in one request.
pub const MAX_RANGE_DAYS: i64 = 366;

/// One upsert per calendar day in `[start, end]`; not atomic across days.
pub async fn apply_attendance_range<S: AttendanceStore>(
    store: &S,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<RangeOutcome> {
    validate_date_range(start, end)?;
    let span = (end - start).num_days() + 1;
    if span > MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "Attendance range may cover at most {MAX_RANGE_DAYS} days, got {span}"
        )));
    }

    let mut outcome = RangeOutcome::default();

    for day in start.iter_days().take_while(|d| *d <= end) {
        match store.find_day(employee_id, day).await? {
            Some(id) => {
                store.mark_leave_day(id).await?;
                outcome.updated += 1;
            }
            None => {
                store.insert_leave_day(employee_id, day).await?;
                outcome.created += 1;
            }
        }
    }

    tracing::debug!(
        employee_id,
        %start,
        %end,
        created = outcome.created,
        updated = outcome.updated,
        "Applied attendance range"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Row {
        id: u64,
        present: bool,
        leave: bool,
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<BTreeMap<(u64, NaiveDate), Row>>,
    }

    impl MemoryStore {
        fn seed(&self, employee_id: u64, day: NaiveDate, present: bool) {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as u64 + 1;
            rows.insert(
                (employee_id, day),
                Row {
                    id,
                    present,
                    leave: false,
                },
            );
        }
    }

    impl AttendanceStore for MemoryStore {
        async fn find_day(&self, employee_id: u64, day: NaiveDate) -> sqlx::Result<Option<u64>> {
            Ok(self.rows.lock().unwrap().get(&(employee_id, day)).map(|r| r.id))
        }

        async fn insert_leave_day(&self, employee_id: u64, day: NaiveDate) -> sqlx::Result<()> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as u64 + 1;
            // mirrors the (employee, date) unique key
            assert!(rows.get(&(employee_id, day)).is_none(), "duplicate day");
            rows.insert(
                (employee_id, day),
                Row {
                    id,
                    present: false,
                    leave: true,
                },
            );
            Ok(())
        }

        async fn mark_leave_day(&self, attendance_id: u64) -> sqlx::Result<()> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.values_mut().find(|r| r.id == attendance_id) {
                row.present = false;
                row.leave = true;
            }
            Ok(())
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[actix_web::test]
    async fn creates_one_record_per_day() {
        let store = MemoryStore::default();

        let outcome = apply_attendance_range(&store, 7, date(2), date(6)).await.unwrap();

        assert_eq!(outcome.created, 5);
        assert_eq!(outcome.updated, 0);
        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.values().all(|r| r.leave && !r.present));
    }

    #[actix_web::test]
    async fn overwrites_existing_days_without_duplicating() {
        let store = MemoryStore::default();
        store.seed(7, date(3), true);
        store.seed(7, date(4), false);
        // another employee's day is left alone
        store.seed(8, date(3), true);

        let outcome = apply_attendance_range(&store, 7, date(2), date(5)).await.unwrap();

        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.updated, 2);
        let rows = store.rows.lock().unwrap();
        let mine: Vec<_> = rows.iter().filter(|((e, _), _)| *e == 7).collect();
        assert_eq!(mine.len(), 4);
        assert!(mine.iter().all(|(_, r)| r.leave && !r.present));
        assert!(rows[&(8, date(3))].present);
    }

    #[actix_web::test]
    async fn single_day_range_touches_one_day() {
        let store = MemoryStore::default();
        let outcome = apply_attendance_range(&store, 1, date(9), date(9)).await.unwrap();
        assert_eq!(outcome.created + outcome.updated, 1);
    }

    #[actix_web::test]
    async fn oversized_range_is_rejected_before_any_write() {
        let store = MemoryStore::default();
        let start = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();

        let err = apply_attendance_range(&store, 1, start, end).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn a_full_leap_year_fits_the_limit() {
        let store = MemoryStore::default();
        let start = NaiveDate::from_ymd_opt(2028, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2028, 12, 31).unwrap();

        let outcome = apply_attendance_range(&store, 1, start, end).await.unwrap();
        assert_eq!(outcome.created, 366);
    }

    #[actix_web::test]
    async fn reversed_range_writes_nothing() {
        let store = MemoryStore::default();
        assert!(apply_attendance_range(&store, 1, date(9), date(8)).await.is_err());
        assert!(store.rows.lock().unwrap().is_empty());
    }
}
