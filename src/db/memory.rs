use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::TutorRepository,
    error::AppResult,
    models::{Assessment, RankedTutor, Recommendation, TagWeight, TutorProfile, TutorSkill},
};

/// In-memory repository used by tests and local development
///
/// Holds the same entities as the Postgres schema behind a single lock.
/// `replace_recommendations` swaps the whole set under the write lock, which
/// matches the transactional semantics of the Postgres implementation.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    assessments: HashMap<Uuid, Assessment>,
    assessment_tags: HashMap<Uuid, Vec<TagWeight>>,
    tutors: Vec<TutorProfile>,
    skills: Vec<TutorSkill>,
    recommendations: HashMap<Uuid, Vec<Recommendation>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_assessment(&self, assessment: Assessment) {
        let mut inner = self.inner.write().await;
        inner.assessments.insert(assessment.id, assessment);
    }

    pub async fn insert_assessment_tags(&self, assessment_id: Uuid, tags: Vec<TagWeight>) {
        let mut inner = self.inner.write().await;
        inner.assessment_tags.insert(assessment_id, tags);
    }

    /// Registers a tutor together with their skill rows
    pub async fn insert_tutor(&self, profile: TutorProfile, skills: Vec<(i64, Option<f64>)>) {
        let mut inner = self.inner.write().await;
        for (tag_id, weight) in skills {
            inner.skills.push(TutorSkill {
                tutor_email: profile.email.clone(),
                tag_id,
                weight,
            });
        }
        inner.tutors.push(profile);
    }
}

#[async_trait]
impl TutorRepository for InMemoryRepository {
    async fn get_assessment(&self, id: Uuid) -> AppResult<Option<Assessment>> {
        let inner = self.inner.read().await;
        Ok(inner.assessments.get(&id).cloned())
    }

    async fn get_assessment_tags(&self, assessment_id: Uuid) -> AppResult<Vec<TagWeight>> {
        let inner = self.inner.read().await;
        Ok(inner
            .assessment_tags
            .get(&assessment_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_active_tutors(&self) -> AppResult<Vec<TutorProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.tutors.iter().filter(|t| t.active).cloned().collect())
    }

    async fn get_tutor_skills(&self, tutor_emails: &[String]) -> AppResult<Vec<TutorSkill>> {
        let inner = self.inner.read().await;
        Ok(inner
            .skills
            .iter()
            .filter(|s| tutor_emails.contains(&s.tutor_email))
            .cloned()
            .collect())
    }

    async fn replace_recommendations(
        &self,
        assessment_id: Uuid,
        model_version: &str,
        ranked: &[RankedTutor],
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.recommendations.remove(&assessment_id);

        if !ranked.is_empty() {
            let rows = ranked
                .iter()
                .map(|entry| Recommendation {
                    assessment_id,
                    tutor_email: entry.tutor_email.clone(),
                    score: entry.score,
                    model_version: model_version.to_string(),
                    created_at: Utc::now(),
                })
                .collect();
            inner.recommendations.insert(assessment_id, rows);
        }

        Ok(())
    }

    async fn get_recommendations(&self, assessment_id: Uuid) -> AppResult<Vec<Recommendation>> {
        let inner = self.inner.read().await;
        let mut rows = inner
            .recommendations
            .get(&assessment_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(rows)
    }
}
