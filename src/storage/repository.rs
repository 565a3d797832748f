use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::date_util::{parse_date, parse_timestamp};
use crate::model::{Person, Recognition, Submission, Task};
use crate::query::period::PeriodToken;

/// Rows decoded from one table, plus how many rows could not be decoded.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub malformed: u64,
}

/// Run `sql` and decode each row with `decode`. Rows that fail to decode are
/// logged and counted instead of failing the whole read.
fn load_rows<T>(
    conn: &Connection,
    table: &str,
    sql: &str,
    params: impl rusqlite::Params,
    decode: impl Fn(&Row<'_>) -> rusqlite::Result<Result<T, String>>,
) -> Result<Loaded<T>, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut loaded = Loaded {
        rows: Vec::new(),
        malformed: 0,
    };
    while let Some(row) = rows.next()? {
        let reason = match decode(row) {
            Ok(Ok(value)) => {
                loaded.rows.push(value);
                continue;
            }
            Ok(Err(reason)) => reason,
            // A stored value of the wrong type spoils the row, not the load.
            Err(
                e @ (rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::IntegralValueOutOfRange(..)),
            ) => e.to_string(),
            Err(e) => return Err(e),
        };
        log::warn!("Skipping malformed {table} row: {reason}");
        loaded.malformed += 1;
    }
    Ok(loaded)
}

fn parse_field<T: std::str::FromStr>(id: &str, field: &str, raw: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| format!("{id}: bad {field} {raw:?} ({e})"))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

// ── Persons ────────────────────────────────────────────────────────

const PERSON_COLUMNS: &str = "person_id, email, first_name, last_name, role, dept_code,
    project_code, manager_email, is_admin";

fn decode_person(row: &Row<'_>) -> rusqlite::Result<Result<Person, String>> {
    let id: String = row.get(0)?;
    let email: String = row.get(1)?;
    let first_name: String = row.get(2)?;
    let last_name: String = row.get(3)?;
    let role: String = row.get(4)?;
    let dept_code: String = row.get(5)?;
    let project_code: String = row.get(6)?;
    let manager_email: Option<String> = row.get(7)?;
    let is_admin: i32 = row.get(8)?;
    Ok(parse_field(&id, "role", &role).map(|role| Person {
        id,
        email,
        first_name,
        last_name,
        role,
        dept_code,
        project_code,
        manager_email: non_empty(manager_email),
        is_admin: is_admin != 0,
    }))
}

pub fn list_persons(conn: &Connection) -> Result<Loaded<Person>, rusqlite::Error> {
    load_rows(
        conn,
        "persons",
        &format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY person_id"),
        [],
        decode_person,
    )
}

/// A single person by id; `None` when absent or malformed.
pub fn get_person(conn: &Connection, person_id: &str) -> Result<Option<Person>, rusqlite::Error> {
    let loaded = load_rows(
        conn,
        "persons",
        &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = ?1"),
        params![person_id],
        decode_person,
    )?;
    Ok(loaded.rows.into_iter().next())
}

// ── Submissions ────────────────────────────────────────────────────

const SUBMISSION_COLUMNS: &str = "submission_id, user_id, period, sat_score, mood_label,
    workload_level, work_life_balance, ai_sentiment, created_at";

fn decode_submission(row: &Row<'_>) -> rusqlite::Result<Result<Submission, String>> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let period: String = row.get(2)?;
    let sat_score: i64 = row.get(3)?;
    let mood: String = row.get(4)?;
    let workload_level: i64 = row.get(5)?;
    let work_life_balance: i64 = row.get(6)?;
    let ai_sentiment: Option<f64> = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok((|| -> Result<Submission, String> {
        let period = PeriodToken::parse(&period).map_err(|e| format!("{id}: {e}"))?;
        let mood_label = parse_field(&id, "mood_label", &mood)?;
        let created_at = parse_timestamp(&created_at)
            .ok_or_else(|| format!("{id}: bad created_at {created_at:?}"))?;
        Ok(Submission {
            id: id.clone(),
            user_id,
            period,
            sat_score,
            mood_label,
            workload_level,
            work_life_balance,
            ai_sentiment,
            created_at,
        })
    })())
}

pub fn list_submissions(conn: &Connection) -> Result<Loaded<Submission>, rusqlite::Error> {
    let mut loaded = load_rows(
        conn,
        "submissions",
        &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions"),
        [],
        decode_submission,
    )?;
    // Text ordering is only right for uniformly formatted timestamps.
    loaded
        .rows
        .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(loaded)
}

/// All submissions for one user, newest first.
pub fn list_submissions_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Loaded<Submission>, rusqlite::Error> {
    let mut loaded = load_rows(
        conn,
        "submissions",
        &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE user_id = ?1"),
        params![user_id],
        decode_submission,
    )?;
    loaded
        .rows
        .sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    Ok(loaded)
}

// ── Tasks ──────────────────────────────────────────────────────────

pub fn list_tasks(conn: &Connection) -> Result<Loaded<Task>, rusqlite::Error> {
    load_rows(
        conn,
        "tasks",
        "SELECT task_id, title, employee_email, manager_email, status, due_date, assigned_to
         FROM tasks
         ORDER BY task_id",
        [],
        |row| {
            let id: String = row.get(0)?;
            let title: String = row.get(1)?;
            let employee_email: String = row.get(2)?;
            let manager_email: String = row.get(3)?;
            let status: String = row.get(4)?;
            let due_date: Option<String> = non_empty(row.get(5)?);
            let assigned_to: String = row.get(6)?;

            Ok((|| -> Result<Task, String> {
                let status = parse_field(&id, "status", &status)?;
                let assigned_to = parse_field(&id, "assigned_to", &assigned_to)?;
                let due_date = match due_date {
                    Some(raw) => Some(
                        parse_date(&raw).ok_or_else(|| format!("{id}: bad due_date {raw:?}"))?,
                    ),
                    None => None,
                };
                Ok(Task {
                    id: id.clone(),
                    title,
                    employee_email,
                    manager_email,
                    status,
                    due_date,
                    assigned_to,
                })
            })())
        },
    )
}

// ── Recognitions ───────────────────────────────────────────────────

pub fn list_recognitions(conn: &Connection) -> Result<Loaded<Recognition>, rusqlite::Error> {
    load_rows(
        conn,
        "recognitions",
        "SELECT recognition_id, giver_user_id, receiver_user_id, value_tag, is_anonymous, created_at
         FROM recognitions
         ORDER BY created_at, recognition_id",
        [],
        |row| {
            let id: String = row.get(0)?;
            let created_at: String = row.get(5)?;
            let Some(created_at) = parse_timestamp(&created_at) else {
                return Ok(Err(format!("{id}: bad created_at {created_at:?}")));
            };
            Ok(Ok(Recognition {
                giver_user_id: row.get(1)?,
                receiver_user_id: row.get(2)?,
                value_tag: row.get(3)?,
                is_anonymous: row.get::<_, i32>(4)? != 0,
                created_at,
                id,
            }))
        },
    )
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Status ─────────────────────────────────────────────────────────

/// Row counts per table, for the CLI's status view.
pub fn table_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>, rusqlite::Error> {
    let mut counts = Vec::new();
    for table in ["persons", "submissions", "tasks", "recognitions"] {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        counts.push((table, n));
    }
    Ok(counts)
}
