use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::Config,
    db::TutorRepository,
    error::{AppError, AppResult},
    models::{Assessment, RankedTutor, TutorProfile, TutorSkill},
};

/// Sparse tag vector keyed by tag id
pub type TagVector = HashMap<i64, f64>;

/// Engine knobs resolved from configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Maximum number of recommendations persisted per assessment
    pub limit: usize,
    /// Version label stamped on stored rows
    pub model_version: String,
    /// When true, tutors without declared rates fail the budget filter
    pub strict_budget_filter: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            limit: 12,
            model_version: "tags-cosine-v1".to_string(),
            strict_budget_filter: false,
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            limit: config.recommendation_limit,
            model_version: config.model_version.clone(),
            strict_budget_filter: config.strict_budget_filter,
        }
    }
}

/// Outcome of one recommendation run
#[derive(Debug, Serialize)]
pub struct RecommendationOutcome {
    /// Number of rows stored for the assessment
    pub saved: usize,
    /// The ranked set, highest score first
    pub top: Vec<RankedTutor>,
    /// Present when the run legitimately produced nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Computes and persists tutor recommendations for one assessment
///
/// Loads the student's weighted tag vector and the pool of active tutors'
/// skill vectors, scores every eligible tutor by cosine similarity with hard
/// modality and budget filters, ranks, truncates, and replaces the stored
/// set for the assessment. Returns the ranked list so the caller can render
/// feedback without a second read.
pub async fn generate_recommendations(
    repo: &dyn TutorRepository,
    settings: &EngineSettings,
    assessment_id: Uuid,
) -> AppResult<RecommendationOutcome> {
    let assessment = repo
        .get_assessment(assessment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {} not found", assessment_id)))?;

    let tag_rows = repo.get_assessment_tags(assessment_id).await?;
    let student_vector = build_tag_vector(tag_rows.iter().map(|t| (t.tag_id, t.weight)));

    if student_vector.is_empty() {
        return Err(AppError::invalid_input_with_hint(
            format!("Assessment {} has no tag weights", assessment_id),
            "Populate assessment_tags for this assessment before requesting recommendations",
        ));
    }

    let tutors = repo.get_active_tutors().await?;
    if tutors.is_empty() {
        tracing::info!(assessment_id = %assessment_id, "No active tutors to rank");
        return Ok(RecommendationOutcome {
            saved: 0,
            top: Vec::new(),
            reason: Some("no active tutors".to_string()),
        });
    }

    let emails: Vec<String> = tutors.iter().map(|t| t.email.clone()).collect();
    let skill_rows = repo.get_tutor_skills(&emails).await?;
    let skills_by_tutor = group_skills(skill_rows);

    let ranked = rank_candidates(
        &assessment,
        &tutors,
        &skills_by_tutor,
        &student_vector,
        settings,
    );

    let top: Vec<RankedTutor> = ranked.into_iter().take(settings.limit).collect();

    repo.replace_recommendations(assessment_id, &settings.model_version, &top)
        .await?;

    tracing::info!(
        assessment_id = %assessment_id,
        candidates = tutors.len(),
        saved = top.len(),
        "Recommendations stored"
    );

    let reason = if top.is_empty() {
        Some("no compatible tutors".to_string())
    } else {
        None
    };

    Ok(RecommendationOutcome {
        saved: top.len(),
        top,
        reason,
    })
}

/// Collapses (tag, weight) rows into a sparse vector
///
/// Rows without a stored weight default to 1. Empty input yields an empty
/// vector.
pub fn build_tag_vector(rows: impl IntoIterator<Item = (i64, Option<f64>)>) -> TagVector {
    rows.into_iter()
        .map(|(tag_id, weight)| (tag_id, weight.unwrap_or(1.0)))
        .collect()
}

/// Cosine similarity of two sparse vectors
///
/// The dot product runs over tag ids present in both vectors. A zero norm on
/// either side yields 0 rather than dividing by zero.
pub fn cosine_similarity(a: &TagVector, b: &TagVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Iterate the smaller vector for the intersection
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(tag_id, weight)| large.get(tag_id).map(|other| weight * other))
        .sum();

    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Groups skill rows into one vector per tutor
///
/// Tutors with no rows simply never appear in the map, which excludes them
/// from scoring.
fn group_skills(rows: Vec<TutorSkill>) -> HashMap<String, TagVector> {
    let mut by_tutor: HashMap<String, TagVector> = HashMap::new();
    for row in rows {
        by_tutor
            .entry(row.tutor_email)
            .or_default()
            .insert(row.tag_id, row.weight.unwrap_or(1.0));
    }
    by_tutor
}

/// Budget compatibility between an assessment and a tutor's declared rates
///
/// Only evaluated when the assessment names a budget bound. A tutor with no
/// declared rates passes unless `strict` excludes unknown pricing; a tutor
/// with one declared rate is checked on the bound that applies.
fn budget_compatible(assessment: &Assessment, tutor: &TutorProfile, strict: bool) -> bool {
    if !assessment.has_budget() {
        return true;
    }

    if tutor.hourly_rate_min.is_none() && tutor.hourly_rate_max.is_none() {
        return !strict;
    }

    if let (Some(rate_min), Some(budget_max)) = (tutor.hourly_rate_min, assessment.budget_max) {
        if rate_min > budget_max {
            return false;
        }
    }

    if let (Some(rate_max), Some(budget_min)) = (tutor.hourly_rate_max, assessment.budget_min) {
        if rate_max < budget_min {
            return false;
        }
    }

    true
}

/// Filters, scores and sorts the candidate pool
///
/// Tutors must pass the modality filter, then the budget filter, and must
/// have a non-empty skill vector. Only strictly positive similarity scores
/// survive. The sort is stable, so equal scores keep input order.
fn rank_candidates(
    assessment: &Assessment,
    tutors: &[TutorProfile],
    skills_by_tutor: &HashMap<String, TagVector>,
    student_vector: &TagVector,
    settings: &EngineSettings,
) -> Vec<RankedTutor> {
    let mut scored: Vec<RankedTutor> = tutors
        .iter()
        .filter(|tutor| assessment.modality.compatible_with(tutor.modality))
        .filter(|tutor| budget_compatible(assessment, tutor, settings.strict_budget_filter))
        .filter_map(|tutor| {
            let skills = skills_by_tutor.get(&tutor.email)?;
            let score = cosine_similarity(student_vector, skills);
            if score > 0.0 {
                Some(RankedTutor {
                    tutor_email: tutor.email.clone(),
                    score,
                })
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}
