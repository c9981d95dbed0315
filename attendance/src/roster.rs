//! Admin-facing catalog and roster management: courses, students, and the
//! auth accounts provisioned for students.
//!
//! Account provisioning runs through the deployment's serverless functions
//! and is deliberately best effort. A student whose account could not be
//! created still lands on the roster, just without a linked `userId`.

use serde_json::json;
use store::models::course::{self, Course};
use store::models::student::{self, Student};
use store::{CreateUserRequest, DocumentStore, Functions, Query, Stored, unique_id};

use crate::error::RosterError;

/// Initial password for provisioned student accounts. Students are told to
/// change it on first login.
pub const DEFAULT_PASSWORD: &str = "student123";

pub struct RosterService;

impl RosterService {
    /// Every course in the catalog. Undecodable rows are skipped with a
    /// warning.
    pub async fn courses<S: DocumentStore>(store: &S) -> Result<Vec<Stored<Course>>, RosterError> {
        let list = store
            .list_documents(&common::config::database_id(), &course::collection_id(), &[])
            .await?;

        let mut courses = Vec::with_capacity(list.documents.len());
        for doc in &list.documents {
            match Course::from_document(doc) {
                Ok(record) => courses.push(Stored::new(doc.id.clone(), record)),
                Err(error) => tracing::warn!(document_id = %doc.id, %error, "skipping course"),
            }
        }
        Ok(courses)
    }

    /// Adds a course, refusing a duplicate of an existing programme with the
    /// same duration.
    pub async fn add_course<S: DocumentStore>(
        store: &S,
        new_course: Course,
    ) -> Result<Stored<Course>, RosterError> {
        if Self::course_conflicts(store, &new_course, None).await? {
            return Err(RosterError::DuplicateCourse);
        }
        let doc = store
            .create_document(
                &common::config::database_id(),
                &course::collection_id(),
                &unique_id(),
                new_course.to_data()?,
            )
            .await?;
        tracing::info!(course_id = %doc.id, programme = %new_course.programme, "course added");
        Ok(Stored::new(doc.id, new_course))
    }

    pub async fn update_course<S: DocumentStore>(
        store: &S,
        course_id: &str,
        updated: Course,
    ) -> Result<(), RosterError> {
        if Self::course_conflicts(store, &updated, Some(course_id)).await? {
            return Err(RosterError::DuplicateCourse);
        }
        store
            .update_document(
                &common::config::database_id(),
                &course::collection_id(),
                course_id,
                updated.to_data()?,
            )
            .await?;
        Ok(())
    }

    pub async fn delete_course<S: DocumentStore>(
        store: &S,
        course_id: &str,
    ) -> Result<(), RosterError> {
        store
            .delete_document(
                &common::config::database_id(),
                &course::collection_id(),
                course_id,
            )
            .await?;
        tracing::info!(course_id, "course deleted");
        Ok(())
    }

    /// Every student on the roster. Undecodable rows are skipped with a
    /// warning.
    pub async fn students<S: DocumentStore>(
        store: &S,
    ) -> Result<Vec<Stored<Student>>, RosterError> {
        let list = store
            .list_documents(
                &common::config::database_id(),
                &student::collection_id(),
                &[],
            )
            .await?;

        let mut students = Vec::with_capacity(list.documents.len());
        for doc in &list.documents {
            match Student::from_document(doc) {
                Ok(record) => students.push(Stored::new(doc.id.clone(), record)),
                Err(error) => tracing::warn!(document_id = %doc.id, %error, "skipping student"),
            }
        }
        Ok(students)
    }

    /// True when some roster entry already uses this email or ABC ID. Both
    /// lookups run concurrently.
    pub async fn student_exists<S: DocumentStore>(
        store: &S,
        email: &str,
        abc_id: i64,
    ) -> Result<bool, RosterError> {
        let database = common::config::database_id();
        let collection = student::collection_id();
        let email_query = [Query::equal("Email", email)];
        let abc_id_query = [Query::equal("ABC_ID", abc_id)];
        let by_email = store.list_documents(&database, &collection, &email_query);
        let by_abc_id = store.list_documents(&database, &collection, &abc_id_query);

        let (by_email, by_abc_id) = tokio::join!(by_email, by_abc_id);
        Ok(by_email?.total > 0 || by_abc_id?.total > 0)
    }

    /// Adds a student and provisions an auth account for them.
    ///
    /// The account step is best effort: when the provisioning function
    /// fails, the roster entry is kept with no `userId` link and the failure
    /// is logged. Duplicate email or ABC ID refuses the whole add.
    pub async fn add_student<S: DocumentStore, F: Functions>(
        store: &S,
        functions: &F,
        mut new_student: Student,
    ) -> Result<Stored<Student>, RosterError> {
        if Self::student_exists(store, &new_student.email, new_student.abc_id).await? {
            tracing::warn!(
                email = %new_student.email,
                abc_id = new_student.abc_id,
                "student already exists, skipping add"
            );
            return Err(RosterError::DuplicateStudent);
        }

        let database = common::config::database_id();
        let collection = student::collection_id();
        new_student.user_id = None;
        let doc = store
            .create_document(&database, &collection, &unique_id(), new_student.to_data()?)
            .await?;

        let request = CreateUserRequest {
            email: new_student.email.clone(),
            name: new_student.name.clone(),
            password: DEFAULT_PASSWORD.to_string(),
            user_id: unique_id(),
        };
        match functions.create_user(request).await {
            Ok(user_id) => {
                let link = store
                    .update_document(
                        &database,
                        &collection,
                        &doc.id,
                        json!({ "userId": user_id }),
                    )
                    .await;
                match link {
                    Ok(_) => new_student.user_id = Some(user_id),
                    Err(error) => {
                        tracing::warn!(document_id = %doc.id, %error, "failed to link auth user")
                    }
                }
            }
            Err(error) => {
                tracing::error!(
                    email = %new_student.email,
                    %error,
                    "auth account creation failed, student kept without login"
                );
            }
        }

        tracing::info!(document_id = %doc.id, email = %new_student.email, "student added");
        Ok(Stored::new(doc.id, new_student))
    }

    /// Deletes a student and, best effort, the auth account linked to their
    /// email.
    pub async fn remove_student<S: DocumentStore, F: Functions>(
        store: &S,
        functions: &F,
        student_id: &str,
    ) -> Result<(), RosterError> {
        let database = common::config::database_id();
        let collection = student::collection_id();
        let doc = store.get_document(&database, &collection, student_id).await?;

        if let Some(email) = doc.str_field("Email") {
            if let Err(error) = functions.delete_user_by_email(email).await {
                tracing::warn!(email, %error, "failed to delete auth user, removing roster entry anyway");
            }
        }

        store
            .delete_document(&database, &collection, student_id)
            .await?;
        tracing::info!(student_id, "student removed");
        Ok(())
    }

    /// The roster entry linked to an auth user, `None` when the account has
    /// no student document.
    pub async fn student_by_user<S: DocumentStore>(
        store: &S,
        user_id: &str,
    ) -> Result<Option<Stored<Student>>, RosterError> {
        let list = store
            .list_documents(
                &common::config::database_id(),
                &student::collection_id(),
                &[Query::equal("userId", user_id)],
            )
            .await?;

        match list.documents.first() {
            Some(doc) => Ok(Some(Stored::new(doc.id.clone(), Student::from_document(doc)?))),
            None => Ok(None),
        }
    }

    async fn course_conflicts<S: DocumentStore>(
        store: &S,
        candidate: &Course,
        exclude_id: Option<&str>,
    ) -> Result<bool, RosterError> {
        let target = canonical_programme(&candidate.programme);
        for existing in Self::courses(store).await? {
            if exclude_id == Some(existing.id.as_str()) {
                continue;
            }
            if canonical_programme(&existing.record.programme) == target
                && existing.record.duration == candidate.duration
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Programme names compare with whitespace stripped, case-insensitively.
fn canonical_programme(programme: &str) -> String {
    programme
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
