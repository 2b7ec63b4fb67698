use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Assessment, RankedTutor, Recommendation, TagWeight, TutorProfile, TutorSkill},
};

/// Storage abstraction for the recommendation engine
///
/// The engine only speaks to this trait, so the scoring logic can be
/// exercised against the in-memory implementation in tests while production
/// runs against Postgres.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TutorRepository: Send + Sync {
    /// Loads a single assessment by id
    async fn get_assessment(&self, id: Uuid) -> AppResult<Option<Assessment>>;

    /// Loads every (tag, weight) row attached to an assessment
    async fn get_assessment_tags(&self, assessment_id: Uuid) -> AppResult<Vec<TagWeight>>;

    /// Loads every tutor whose profile is flagged active
    async fn get_active_tutors(&self) -> AppResult<Vec<TutorProfile>>;

    /// Loads the skill rows for the given candidate tutors
    async fn get_tutor_skills(&self, tutor_emails: &[String]) -> AppResult<Vec<TutorSkill>>;

    /// Replaces the stored recommendation set for an assessment
    ///
    /// Every existing row for the assessment id is deleted and the new
    /// ranked set inserted as one atomic operation. Concurrent replacements
    /// for the same assessment resolve to last-writer-wins.
    async fn replace_recommendations(
        &self,
        assessment_id: Uuid,
        model_version: &str,
        ranked: &[RankedTutor],
    ) -> AppResult<()>;

    /// Reads back the stored recommendation set, highest score first
    async fn get_recommendations(&self, assessment_id: Uuid) -> AppResult<Vec<Recommendation>>;
}
