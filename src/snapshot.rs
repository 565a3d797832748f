use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::model::{Person, Recognition, Submission, Task};
use crate::storage::repository;
use crate::storage::Database;

/// An immutable, consistent view of the store for one computation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub persons: Vec<Person>,
    pub submissions: Vec<Submission>,
    pub tasks: Vec<Task>,
    pub recognitions: Vec<Recognition>,
    /// Store rows that could not be decoded and were left out.
    pub malformed_rows: u64,
}

impl Snapshot {
    /// Read every table inside one transaction, so all rows come from the
    /// same database state.
    pub async fn load(db: &Database) -> Result<Self> {
        let snapshot = db
            .reader()
            .call(|conn| {
                let tx = conn.transaction()?;
                let persons = repository::list_persons(&tx)?;
                let submissions = repository::list_submissions(&tx)?;
                let tasks = repository::list_tasks(&tx)?;
                let recognitions = repository::list_recognitions(&tx)?;
                tx.commit()?;

                Ok::<Snapshot, rusqlite::Error>(Snapshot {
                    malformed_rows: persons.malformed
                        + submissions.malformed
                        + tasks.malformed
                        + recognitions.malformed,
                    persons: persons.rows,
                    submissions: submissions.rows,
                    tasks: tasks.rows,
                    recognitions: recognitions.rows,
                })
            })
            .await?;

        log::info!(
            "Loaded snapshot: {} persons, {} submissions, {} tasks, {} recognitions ({} malformed rows skipped)",
            snapshot.persons.len(),
            snapshot.submissions.len(),
            snapshot.tasks.len(),
            snapshot.recognitions.len(),
            snapshot.malformed_rows
        );
        Ok(snapshot)
    }

    /// Index persons by id for joins.
    pub fn persons_by_id(&self) -> HashMap<&str, &Person> {
        self.persons.iter().map(|p| (p.id.as_str(), p)).collect()
    }

    /// Index persons by lowercased email for joins.
    pub fn persons_by_email(&self) -> HashMap<String, &Person> {
        self.persons
            .iter()
            .map(|p| (p.email.to_ascii_lowercase(), p))
            .collect()
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::fixtures;

    #[tokio::test]
    async fn test_load_snapshot() {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| {
                fixtures::person(conn, "u1", ("Ann", "Lee"), "employee", "ENG", "APOLLO", None)?;
                fixtures::submission(conn, "s1", "u1", "Jan-2026", 8, Some(0.7), "2026-01-03T10:00:00Z")?;
                fixtures::submission(conn, "s2", "u1", "Janvier-2026", 8, Some(0.7), "2026-01-03T10:00:00Z")?;
                fixtures::task(conn, "t1", "u1@example.com", "m1@example.com", "pending", None, "employee")?;
                fixtures::recognition(conn, "r1", "u2", "u1", "craft", false, "2026-01-04T10:00:00Z")?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        let snapshot = Snapshot::load(&db).await.unwrap();
        assert_eq!(snapshot.persons.len(), 1);
        assert_eq!(snapshot.submissions.len(), 1);
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.recognitions.len(), 1);
        assert_eq!(snapshot.malformed_rows, 1);

        assert!(snapshot.person("u1").is_some());
        assert!(snapshot.person("nobody").is_none());
        assert!(snapshot.persons_by_email().contains_key("u1@example.com"));
        assert_eq!(snapshot.persons_by_id()["u1"].first_name, "Ann");
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let db = Database::open_memory().await.unwrap();
        let snapshot = Snapshot::load(&db).await.unwrap();
        assert!(snapshot.persons.is_empty());
        assert_eq!(snapshot.malformed_rows, 0);
    }

    #[tokio::test]
    async fn test_load_survives_mistyped_values() {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| {
                fixtures::submission(conn, "s1", "u1", "Jan-2026", 8, Some(0.7), "2026-01-03T10:00:00Z")?;
                conn.execute_batch(
                    "INSERT INTO submissions VALUES
                        ('s2', 'u1', 'Jan-2026', 'seven', 'neutral', 3, 3, 'n/a', '2026-01-04T10:00:00Z');
                     INSERT INTO recognitions VALUES
                        ('r1', 'u2', 'u1', 'craft', 'yes', '2026-01-04T10:00:00Z');",
                )
            })
            .await
            .unwrap();

        let snapshot = Snapshot::load(&db).await.unwrap();
        assert_eq!(snapshot.submissions.len(), 1);
        assert!(snapshot.recognitions.is_empty());
        assert_eq!(snapshot.malformed_rows, 2);
    }
}
