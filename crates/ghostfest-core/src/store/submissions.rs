//! Submission table queries.

use super::{conversion_error, format_ts, parse_ts, Database};
use crate::error::{GhostfestError, Result};
use crate::models::{BoatChoice, NewSubmission, PaymentMethod, SpiritEntry, Submission};
use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

const SUBMISSION_COLUMNS: &str = "id, order_id, date, boat, gender, name_cn, name_en, phone, \
     payment_method, count, total, paid, entries, payment_amount, remarks";

#[derive(Debug)]
struct UnknownPaymentMethod(String);

impl std::fmt::Display for UnknownPaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown payment method: {}", self.0)
    }
}

impl std::error::Error for UnknownPaymentMethod {}

fn row_to_submission(row: &Row<'_>) -> rusqlite::Result<Submission> {
    let date: String = row.get(2)?;
    let boat: String = row.get(3)?;
    let payment_method: String = row.get(8)?;
    let entries_json: String = row.get(12)?;
    let id: i64 = row.get(0)?;

    let payment_method = PaymentMethod::parse(&payment_method)
        .ok_or_else(|| conversion_error(8, UnknownPaymentMethod(payment_method.clone())))?;

    // A damaged entries blob should not hide the rest of the record.
    let entries: Vec<SpiritEntry> = serde_json::from_str(&entries_json).unwrap_or_else(|e| {
        warn!("Submission {} has unreadable entries: {}", id, e);
        Vec::new()
    });

    Ok(Submission {
        id,
        order_id: row.get(1)?,
        date: parse_ts(2, &date)?,
        boat: BoatChoice::parse(&boat),
        gender: row.get(4)?,
        name_cn: row.get(5)?,
        name_en: row.get(6)?,
        phone: row.get(7)?,
        payment_method,
        count: row.get(9)?,
        total: row.get(10)?,
        paid: row.get(11)?,
        entries,
        payment_amount: row.get(13)?,
        remarks: row.get(14)?,
    })
}

impl Database {
    /// Insert a new submission and return the stored row.
    pub fn insert_submission(&self, new: NewSubmission) -> Result<Submission> {
        let entries_json = serde_json::to_string(&new.entries)?;
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO submissions
            (order_id, date, boat, gender, name_cn, name_en, phone, payment_method,
             count, total, paid, entries, payment_amount, remarks)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, 0, '')
            "#,
            params![
                new.order_id,
                format_ts(&new.date),
                new.boat.as_str(),
                new.gender,
                new.name_cn,
                new.name_en,
                new.phone,
                new.payment_method.as_str(),
                new.entries.len() as i64,
                new.total,
                entries_json,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Submission::from_new(id, new))
    }

    /// Overwrite every column of an existing row.
    pub fn update_submission(&self, submission: &Submission) -> Result<()> {
        let entries_json = serde_json::to_string(&submission.entries)?;
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE submissions SET
                order_id = ?2, date = ?3, boat = ?4, gender = ?5, name_cn = ?6,
                name_en = ?7, phone = ?8, payment_method = ?9, count = ?10,
                total = ?11, paid = ?12, entries = ?13, payment_amount = ?14,
                remarks = ?15
            WHERE id = ?1
            "#,
            params![
                submission.id,
                submission.order_id,
                format_ts(&submission.date),
                submission.boat.as_str(),
                submission.gender,
                submission.name_cn,
                submission.name_en,
                submission.phone,
                submission.payment_method.as_str(),
                submission.count,
                submission.total,
                submission.paid,
                entries_json,
                submission.payment_amount,
                submission.remarks,
            ],
        )?;
        if changed == 0 {
            return Err(GhostfestError::SubmissionNotFound(format!(
                "id {}",
                submission.id
            )));
        }
        Ok(())
    }

    /// Re-insert a previously deleted row under its original id.
    pub fn restore_submission(&self, submission: &Submission) -> Result<()> {
        let entries_json = serde_json::to_string(&submission.entries)?;
        let conn = self.lock_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO submissions ({SUBMISSION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                submission.id,
                submission.order_id,
                format_ts(&submission.date),
                submission.boat.as_str(),
                submission.gender,
                submission.name_cn,
                submission.name_en,
                submission.phone,
                submission.payment_method.as_str(),
                submission.count,
                submission.total,
                submission.paid,
                entries_json,
                submission.payment_amount,
                submission.remarks,
            ],
        )?;
        Ok(())
    }

    /// Delete a row. Returns false when it did not exist.
    pub fn delete_submission(&self, id: i64) -> Result<bool> {
        let conn = self.lock_conn()?;
        let deleted = conn.execute("DELETE FROM submissions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn get_submission(&self, id: i64) -> Result<Option<Submission>> {
        let conn = self.lock_conn()?;
        let submission = conn
            .query_row(
                &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1"),
                params![id],
                row_to_submission,
            )
            .optional()?;
        Ok(submission)
    }

    /// Fetch a row or fail with `SubmissionNotFound`.
    pub fn require_submission(&self, id: i64) -> Result<Submission> {
        self.get_submission(id)?
            .ok_or_else(|| GhostfestError::SubmissionNotFound(format!("id {id}")))
    }

    /// Every submission, newest first.
    pub fn list_submissions(&self) -> Result<Vec<Submission>> {
        self.query_submissions(
            &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions ORDER BY date DESC, id DESC"),
            params![],
        )
    }

    /// Rows with this Chinese name, oldest first.
    pub fn find_by_name_cn(&self, name_cn: &str) -> Result<Vec<Submission>> {
        self.query_submissions(
            &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE name_cn = ?1 ORDER BY id"),
            params![name_cn],
        )
    }

    /// Rows sharing a 4-digit order code, oldest first.
    pub fn find_by_order_code(&self, order_id: &str) -> Result<Vec<Submission>> {
        self.query_submissions(
            &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE order_id = ?1 ORDER BY id"),
            params![order_id],
        )
    }

    pub fn find_by_order_and_phone(&self, order_id: &str, phone: &str) -> Result<Option<Submission>> {
        Ok(self
            .query_submissions(
                &format!(
                    "SELECT {SUBMISSION_COLUMNS} FROM submissions \
                     WHERE order_id = ?1 AND phone = ?2 ORDER BY id LIMIT 1"
                ),
                params![order_id, phone],
            )?
            .into_iter()
            .next())
    }

    pub fn find_by_name_and_phone(&self, name_cn: &str, phone: &str) -> Result<Option<Submission>> {
        Ok(self
            .query_submissions(
                &format!(
                    "SELECT {SUBMISSION_COLUMNS} FROM submissions \
                     WHERE name_cn = ?1 AND phone = ?2 ORDER BY id LIMIT 1"
                ),
                params![name_cn, phone],
            )?
            .into_iter()
            .next())
    }

    /// Sum of recorded payments on paid rows.
    pub fn total_paid(&self) -> Result<i64> {
        let conn = self.lock_conn()?;
        Ok(conn.query_row(
            "SELECT COALESCE(SUM(payment_amount), 0) FROM submissions WHERE paid = 1",
            [],
            |row| row.get(0),
        )?)
    }

    fn query_submissions(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Submission>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, row_to_submission)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
