//! The admin's manual attendance ledger.
//!
//! Toggles on the roster screen build up a local draft per day; nothing
//! touches the backend until the draft is saved. The exceptions are unmark,
//! which also removes an already-persisted record straight away, and reset,
//! which wipes the whole day. A day in the past is locked for editing.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use store::models::attendance::{self, AttendanceRecord, Status};
use store::{Document, DocumentStore, Query, unique_id};

use crate::clock::MarkClock;
use crate::error::LedgerError;
use crate::geo::Coordinates;
use crate::session::UserSession;

/// Session ID shared by every record saved from one day's manual draft.
pub fn manual_session_id(day: NaiveDate) -> String {
    format!("attendance_{day}")
}

pub struct AttendanceLedger {
    admin: UserSession,
    clock: MarkClock,
    drafts: HashMap<NaiveDate, BTreeSet<String>>,
}

impl AttendanceLedger {
    pub fn new(admin: UserSession) -> Self {
        Self::with_clock(admin, MarkClock::from_env())
    }

    pub fn with_clock(admin: UserSession, clock: MarkClock) -> Self {
        Self {
            admin,
            clock,
            drafts: HashMap::new(),
        }
    }

    /// Whether `day` can still be edited. Past days are read-only.
    pub fn day_editable(&self, day: NaiveDate) -> bool {
        !self.clock.is_past(day)
    }

    /// Student IDs currently drafted for `day`, sorted.
    pub fn marked_for(&self, day: NaiveDate) -> Vec<String> {
        self.drafts
            .get(&day)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_marked(&self, day: NaiveDate, student_id: &str) -> bool {
        self.drafts
            .get(&day)
            .is_some_and(|set| set.contains(student_id))
    }

    /// Adds a student to the day's draft. Local only; [`Self::commit`]
    /// persists.
    pub fn mark_present(
        &mut self,
        day: NaiveDate,
        student_id: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.ensure_editable(day)?;
        self.drafts.entry(day).or_default().insert(student_id.into());
        Ok(())
    }

    pub fn mark_all_present<I>(&mut self, day: NaiveDate, student_ids: I) -> Result<(), LedgerError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.ensure_editable(day)?;
        let draft = self.drafts.entry(day).or_default();
        for student_id in student_ids {
            draft.insert(student_id.into());
        }
        Ok(())
    }

    /// Removes a student from the day's draft and, best effort, deletes the
    /// student's persisted record for that day. A missing backend record is
    /// a no-op; a failed delete is logged and swallowed, the unmark stands.
    pub async fn unmark_present<S: DocumentStore>(
        &mut self,
        store: &S,
        day: NaiveDate,
        student_id: &str,
    ) -> Result<(), LedgerError> {
        self.ensure_editable(day)?;
        if let Some(draft) = self.drafts.get_mut(&day) {
            draft.remove(student_id);
        }

        let bounds = self.clock.day_bounds(day);
        let mut queries = vec![Query::equal(attendance::fields::STUDENT_ID, student_id)];
        queries.extend(attendance::marked_between(&bounds.start, &bounds.end));

        let database = common::config::database_id();
        let collection = attendance::collection_id();
        match store.list_documents(&database, &collection, &queries).await {
            Ok(list) => {
                if let Some(doc) = list.documents.first() {
                    match store.delete_document(&database, &collection, &doc.id).await {
                        Ok(()) => {
                            tracing::info!(student_id, %day, "backend attendance record removed");
                        }
                        Err(error) if error.is_not_found() => {}
                        Err(error) => {
                            tracing::warn!(student_id, %error, "failed to delete backend record");
                        }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(student_id, %error, "failed to look up backend record for unmark");
            }
        }
        Ok(())
    }

    /// Persisted records for `day`, decoded. Rows that fail to decode are
    /// skipped with a warning rather than failing the whole view.
    pub async fn backend_marked<S: DocumentStore>(
        &self,
        store: &S,
        day: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let docs = self.day_documents(store, day).await?;
        let mut records = Vec::with_capacity(docs.len());
        for doc in &docs {
            match AttendanceRecord::from_document(doc) {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::warn!(document_id = %doc.id, %error, "skipping undecodable record")
                }
            }
        }
        Ok(records)
    }

    /// Folds the students already persisted for `day` into the draft, so the
    /// roster shows one merged picture. Returns the merged set.
    pub async fn sync_day<S: DocumentStore>(
        &mut self,
        store: &S,
        day: NaiveDate,
    ) -> Result<Vec<String>, LedgerError> {
        let docs = self.day_documents(store, day).await?;
        let draft = self.drafts.entry(day).or_default();
        for doc in &docs {
            if let Some(student_id) = doc.reference_field(attendance::fields::STUDENT_ID) {
                draft.insert(student_id.to_string());
            }
        }
        Ok(draft.iter().cloned().collect())
    }

    /// Saves the day's draft: one record per drafted student that has none
    /// yet, stamped at the day's local midnight and signed with the admin's
    /// name. Already-persisted students are left untouched. Returns how many
    /// records were created.
    ///
    /// A create failure stops the batch; records created before it stay.
    pub async fn commit<S: DocumentStore>(
        &mut self,
        store: &S,
        day: NaiveDate,
        course_id: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<usize, LedgerError> {
        self.ensure_editable(day)?;

        let existing: HashSet<String> = self
            .day_documents(store, day)
            .await?
            .iter()
            .filter_map(|doc| {
                doc.reference_field(attendance::fields::STUDENT_ID)
                    .map(String::from)
            })
            .collect();
        let drafted = self.drafts.get(&day).cloned().unwrap_or_default();
        let session_id = manual_session_id(day);

        let database = common::config::database_id();
        let collection = attendance::collection_id();
        let mut created = 0;
        for student_id in drafted {
            if existing.contains(&student_id) {
                continue;
            }
            let record = AttendanceRecord {
                student_id,
                course_id: course_id.to_string(),
                status: Status::Present,
                marked_at: self.clock.day_start(day),
                marked_by: self.admin.name.clone(),
                session_id: session_id.clone(),
                latitude: coordinates.map(|c| c.latitude),
                longitude: coordinates.map(|c| c.longitude),
            };
            store
                .create_document(&database, &collection, &unique_id(), record.to_data())
                .await
                .map_err(|error| {
                    tracing::error!(%error, student_id = %record.student_id, "saving draft failed");
                    LedgerError::Backend(error)
                })?;
            created += 1;
        }

        tracing::info!(%day, course_id, created, "manual attendance saved");
        Ok(created)
    }

    /// Deletes every persisted record for `day`, across courses, then clears
    /// the draft. A failed delete stops the reset and leaves the draft in
    /// place; there is no rollback of deletes already done. Returns how many
    /// records were removed.
    pub async fn reset_day<S: DocumentStore>(
        &mut self,
        store: &S,
        day: NaiveDate,
    ) -> Result<usize, LedgerError> {
        self.ensure_editable(day)?;

        let database = common::config::database_id();
        let collection = attendance::collection_id();
        let mut deleted = 0;
        for doc in self.day_documents(store, day).await? {
            match store.delete_document(&database, &collection, &doc.id).await {
                Ok(()) => deleted += 1,
                Err(error) if error.is_not_found() => {}
                Err(error) => {
                    tracing::error!(document_id = %doc.id, %error, "reset stopped mid-day");
                    return Err(LedgerError::Backend(error));
                }
            }
        }

        self.drafts.remove(&day);
        tracing::info!(%day, deleted, "attendance day reset");
        Ok(deleted)
    }

    async fn day_documents<S: DocumentStore>(
        &self,
        store: &S,
        day: NaiveDate,
    ) -> Result<Vec<Document>, LedgerError> {
        let bounds = self.clock.day_bounds(day);
        let queries = attendance::marked_between(&bounds.start, &bounds.end);
        let list = store
            .list_documents(
                &common::config::database_id(),
                &attendance::collection_id(),
                &queries,
            )
            .await?;
        Ok(list.documents)
    }

    fn ensure_editable(&self, day: NaiveDate) -> Result<(), LedgerError> {
        if self.clock.is_past(day) {
            return Err(LedgerError::PastDayLocked(day));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::session::Role;

    use super::*;

    fn ledger() -> AttendanceLedger {
        AttendanceLedger::with_clock(
            UserSession::new("admin-1", "Dr. Rao", Role::Admin),
            MarkClock::with_offset_minutes(330),
        )
    }

    #[test]
    fn drafts_are_per_day_sets() {
        let mut ledger = ledger();
        let today = ledger.clock.today();

        ledger.mark_present(today, "stu-1").unwrap();
        ledger.mark_present(today, "stu-2").unwrap();
        ledger.mark_present(today, "stu-1").unwrap();

        assert_eq!(ledger.marked_for(today), vec!["stu-1", "stu-2"]);
        assert!(ledger.is_marked(today, "stu-2"));
        assert!(!ledger.is_marked(today, "stu-3"));
    }

    #[test]
    fn mark_all_merges_into_the_draft() {
        let mut ledger = ledger();
        let today = ledger.clock.today();

        ledger.mark_present(today, "stu-2").unwrap();
        ledger
            .mark_all_present(today, ["stu-1", "stu-2", "stu-3"])
            .unwrap();

        assert_eq!(ledger.marked_for(today), vec!["stu-1", "stu-2", "stu-3"]);
    }

    #[test]
    fn past_days_are_locked() {
        let mut ledger = ledger();
        let yesterday = ledger.clock.today().pred_opt().unwrap();

        assert!(!ledger.day_editable(yesterday));
        assert!(matches!(
            ledger.mark_present(yesterday, "stu-1"),
            Err(LedgerError::PastDayLocked(day)) if day == yesterday
        ));
        assert!(ledger.marked_for(yesterday).is_empty());
    }

    #[test]
    fn future_days_are_editable() {
        let mut ledger = ledger();
        let tomorrow = ledger.clock.today().succ_opt().unwrap();

        assert!(ledger.day_editable(tomorrow));
        ledger.mark_present(tomorrow, "stu-1").unwrap();
        assert_eq!(ledger.marked_for(tomorrow), vec!["stu-1"]);
    }

    #[test]
    fn manual_session_ids_embed_the_day() {
        let day: NaiveDate = "2025-03-14".parse().unwrap();
        assert_eq!(manual_session_id(day), "attendance_2025-03-14");
    }
}
