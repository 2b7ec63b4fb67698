use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    db::TutorRepository,
    error::{AppError, AppResult},
    models::{Assessment, Modality, RankedTutor, Recommendation, TagWeight, TutorProfile, TutorSkill},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Postgres-backed repository over the MatchStudy tables
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Row shapes as stored. Converted to domain types at this boundary so the
// rest of the crate never sees raw column values.

#[derive(FromRow)]
struct AssessmentRow {
    id: Uuid,
    student_email: String,
    modality: String,
    budget_min: Option<f64>,
    budget_max: Option<f64>,
}

impl TryFrom<AssessmentRow> for Assessment {
    type Error = AppError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        let modality = Modality::parse(&row.modality).ok_or_else(|| {
            AppError::StoreRead(format!(
                "assessment {} has unknown modality {:?}",
                row.id, row.modality
            ))
        })?;

        Ok(Assessment {
            id: row.id,
            student_email: row.student_email,
            modality,
            budget_min: row.budget_min,
            budget_max: row.budget_max,
        })
    }
}

#[derive(FromRow)]
struct TagWeightRow {
    tag_id: i64,
    weight: Option<f64>,
}

#[derive(FromRow)]
struct TutorProfileRow {
    email: String,
    active: bool,
    modality: String,
    hourly_rate_min: Option<f64>,
    hourly_rate_max: Option<f64>,
}

impl TryFrom<TutorProfileRow> for TutorProfile {
    type Error = AppError;

    fn try_from(row: TutorProfileRow) -> Result<Self, Self::Error> {
        let modality = Modality::parse(&row.modality).ok_or_else(|| {
            AppError::StoreRead(format!(
                "tutor {} has unknown modality {:?}",
                row.email, row.modality
            ))
        })?;

        Ok(TutorProfile {
            email: row.email,
            active: row.active,
            modality,
            hourly_rate_min: row.hourly_rate_min,
            hourly_rate_max: row.hourly_rate_max,
        })
    }
}

#[derive(FromRow)]
struct TutorSkillRow {
    tutor_email: String,
    tag_id: i64,
    weight: Option<f64>,
}

#[derive(FromRow)]
struct RecommendationRow {
    assessment_id: Uuid,
    tutor_email: String,
    score: f64,
    model_version: String,
    created_at: DateTime<Utc>,
}

impl From<RecommendationRow> for Recommendation {
    fn from(row: RecommendationRow) -> Self {
        Recommendation {
            assessment_id: row.assessment_id,
            tutor_email: row.tutor_email,
            score: row.score,
            model_version: row.model_version,
            created_at: row.created_at,
        }
    }
}

fn store_read(e: sqlx::Error) -> AppError {
    AppError::StoreRead(e.to_string())
}

fn store_write(e: sqlx::Error) -> AppError {
    AppError::StoreWrite(e.to_string())
}

#[async_trait]
impl TutorRepository for PostgresRepository {
    async fn get_assessment(&self, id: Uuid) -> AppResult<Option<Assessment>> {
        let row = sqlx::query_as::<_, AssessmentRow>(
            r#"
            SELECT id, student_email, modality, budget_min, budget_max
            FROM assessments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_read)?;

        row.map(Assessment::try_from).transpose()
    }

    async fn get_assessment_tags(&self, assessment_id: Uuid) -> AppResult<Vec<TagWeight>> {
        let rows = sqlx::query_as::<_, TagWeightRow>(
            r#"
            SELECT tag_id, weight
            FROM assessment_tags
            WHERE assessment_id = $1
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_read)?;

        Ok(rows
            .into_iter()
            .map(|row| TagWeight {
                tag_id: row.tag_id,
                weight: row.weight,
            })
            .collect())
    }

    async fn get_active_tutors(&self) -> AppResult<Vec<TutorProfile>> {
        let rows = sqlx::query_as::<_, TutorProfileRow>(
            r#"
            SELECT email, active, modality, hourly_rate_min, hourly_rate_max
            FROM tutor_profiles
            WHERE active = true
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_read)?;

        rows.into_iter().map(TutorProfile::try_from).collect()
    }

    async fn get_tutor_skills(&self, tutor_emails: &[String]) -> AppResult<Vec<TutorSkill>> {
        let rows = sqlx::query_as::<_, TutorSkillRow>(
            r#"
            SELECT tutor_email, tag_id, weight
            FROM tutor_skills
            WHERE tutor_email = ANY($1)
            "#,
        )
        .bind(tutor_emails)
        .fetch_all(&self.pool)
        .await
        .map_err(store_read)?;

        Ok(rows
            .into_iter()
            .map(|row| TutorSkill {
                tutor_email: row.tutor_email,
                tag_id: row.tag_id,
                weight: row.weight,
            })
            .collect())
    }

    async fn replace_recommendations(
        &self,
        assessment_id: Uuid,
        model_version: &str,
        ranked: &[RankedTutor],
    ) -> AppResult<()> {
        // Delete and insert in one transaction so a reader never observes a
        // half-replaced set. Overlapping runs resolve to last-writer-wins.
        let mut tx = self.pool.begin().await.map_err(store_write)?;

        sqlx::query("DELETE FROM tutor_recommendations WHERE assessment_id = $1")
            .bind(assessment_id)
            .execute(&mut *tx)
            .await
            .map_err(store_write)?;

        for entry in ranked {
            sqlx::query(
                r#"
                INSERT INTO tutor_recommendations (assessment_id, tutor_email, score, model_version)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(assessment_id)
            .bind(&entry.tutor_email)
            .bind(entry.score)
            .bind(model_version)
            .execute(&mut *tx)
            .await
            .map_err(store_write)?;
        }

        tx.commit().await.map_err(store_write)?;

        Ok(())
    }

    async fn get_recommendations(&self, assessment_id: Uuid) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            r#"
            SELECT assessment_id, tutor_email, score, model_version, created_at
            FROM tutor_recommendations
            WHERE assessment_id = $1
            ORDER BY score DESC
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_read)?;

        Ok(rows.into_iter().map(Recommendation::from).collect())
    }
}
