use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Delivery mode of a tutoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Online,
    Presencial,
    Ambos,
}

impl Modality {
    /// Parses a stored `modality` column value.
    ///
    /// Matching is case-sensitive on the stored strings; anything outside the
    /// three known values is rejected at the store boundary.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(Modality::Online),
            "presencial" => Some(Modality::Presencial),
            "ambos" => Some(Modality::Ambos),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Online => "online",
            Modality::Presencial => "presencial",
            Modality::Ambos => "ambos",
        }
    }

    /// Two modalities are compatible when either side accepts both modes
    /// or both name the same mode.
    pub fn compatible_with(self, other: Modality) -> bool {
        self == Modality::Ambos || other == Modality::Ambos || self == other
    }
}

impl Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student's submitted questionnaire
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub id: Uuid,
    pub student_email: String,
    pub modality: Modality,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
}

impl Assessment {
    /// Whether the student declared any budget bound
    pub fn has_budget(&self) -> bool {
        self.budget_min.is_some() || self.budget_max.is_some()
    }
}

/// One (tag, weight) row attached to an assessment
#[derive(Debug, Clone)]
pub struct TagWeight {
    pub tag_id: i64,
    /// Missing weight defaults to 1 when the vector is built
    pub weight: Option<f64>,
}

/// A tutor profile as stored
#[derive(Debug, Clone, Serialize)]
pub struct TutorProfile {
    pub email: String,
    pub active: bool,
    pub modality: Modality,
    pub hourly_rate_min: Option<f64>,
    pub hourly_rate_max: Option<f64>,
}

/// One skill row declared by a tutor
#[derive(Debug, Clone)]
pub struct TutorSkill {
    pub tutor_email: String,
    pub tag_id: i64,
    pub weight: Option<f64>,
}

/// A persisted recommendation row
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub assessment_id: Uuid,
    pub tutor_email: String,
    pub score: f64,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

/// One ranked result as returned to the caller
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedTutor {
    pub tutor_email: String,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_parse_known_values() {
        assert_eq!(Modality::parse("online"), Some(Modality::Online));
        assert_eq!(Modality::parse("presencial"), Some(Modality::Presencial));
        assert_eq!(Modality::parse("ambos"), Some(Modality::Ambos));
    }

    #[test]
    fn test_modality_parse_is_case_sensitive() {
        assert_eq!(Modality::parse("Online"), None);
        assert_eq!(Modality::parse("AMBOS"), None);
        assert_eq!(Modality::parse(""), None);
        assert_eq!(Modality::parse("hybrid"), None);
    }

    #[test]
    fn test_modality_compatibility() {
        assert!(Modality::Online.compatible_with(Modality::Online));
        assert!(Modality::Ambos.compatible_with(Modality::Presencial));
        assert!(Modality::Presencial.compatible_with(Modality::Ambos));
        assert!(!Modality::Online.compatible_with(Modality::Presencial));
        assert!(!Modality::Presencial.compatible_with(Modality::Online));
    }

    #[test]
    fn test_modality_serde_lowercase() {
        let json = serde_json::to_string(&Modality::Presencial).unwrap();
        assert_eq!(json, r#""presencial""#);

        let parsed: Modality = serde_json::from_str(r#""ambos""#).unwrap();
        assert_eq!(parsed, Modality::Ambos);
    }

    #[test]
    fn test_assessment_has_budget() {
        let mut assessment = Assessment {
            id: Uuid::new_v4(),
            student_email: "student@example.com".to_string(),
            modality: Modality::Online,
            budget_min: None,
            budget_max: None,
        };
        assert!(!assessment.has_budget());

        assessment.budget_max = Some(30.0);
        assert!(assessment.has_budget());

        assessment.budget_max = None;
        assessment.budget_min = Some(10.0);
        assert!(assessment.has_budget());
    }
}
