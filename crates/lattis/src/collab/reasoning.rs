//! Reasoning collaborator: skill and career inference over chat text.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};

use lattis_protocol::agent::AgentKind;

use super::profile::ProfileContext;

/// Structured inference produced from one chat turn.
#[derive(Debug, Clone, Default)]
pub struct ReasoningOutcome {
    /// Skills evidenced by the text or the profile.
    pub skills: Vec<String>,
    /// Plausible next roles for the detected current role.
    pub career_paths: Vec<String>,
    /// Expected skills for the detected role that show no evidence yet.
    pub gaps: Vec<String>,
    /// Extra signals for the handler's analysis payload.
    pub extras: HashMap<String, Value>,
    pub confidence: f64,
}

/// Produces a [`ReasoningOutcome`] for a chat turn.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn analyze(
        &self,
        agent: AgentKind,
        text: &str,
        profile: &ProfileContext,
    ) -> anyhow::Result<ReasoningOutcome>;
}

/// Skills a role is expected to carry.
const ROLE_SKILLS: &[(&str, &[&str])] = &[
    (
        "software engineer",
        &["Programming", "Problem Solving", "System Design", "Testing"],
    ),
    (
        "data scientist",
        &["Statistics", "Machine Learning", "Python", "Data Visualization"],
    ),
    (
        "data analyst",
        &["SQL", "Statistics", "Data Visualization", "Reporting"],
    ),
    (
        "product manager",
        &["Roadmapping", "Stakeholder Management", "Analytics", "Communication"],
    ),
    (
        "engineering manager",
        &["Leadership", "Mentoring", "Planning", "System Design"],
    ),
];

/// Typical next steps from a current role.
const CAREER_PATHS: &[(&str, &[&str])] = &[
    (
        "junior developer",
        &["Software Engineer", "Senior Developer", "Tech Lead"],
    ),
    (
        "software engineer",
        &["Senior Engineer", "Staff Engineer", "Engineering Manager"],
    ),
    (
        "data analyst",
        &["Data Scientist", "Senior Data Analyst", "Analytics Lead"],
    ),
    (
        "data scientist",
        &["Senior Data Scientist", "ML Engineer", "Head of Data"],
    ),
    (
        "product manager",
        &["Senior Product Manager", "Director of Product", "VP of Product"],
    ),
];

/// Keyword -> canonical skill name.
const SKILL_KEYWORDS: &[(&str, &str)] = &[
    ("python", "Python"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("rust", "Rust"),
    ("sql", "SQL"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("react", "React"),
    ("aws", "AWS"),
    ("machine learning", "Machine Learning"),
    ("statistics", "Statistics"),
    ("leadership", "Leadership"),
    ("communication", "Communication"),
    ("mentoring", "Mentoring"),
    ("negotiation", "Negotiation"),
    ("public speaking", "Public Speaking"),
];

/// Bundled reasoner backed by a static professional taxonomy.
///
/// Deliberately deterministic: the same text and profile always yield the
/// same outcome, which keeps the chat path testable end to end.
#[derive(Default)]
pub struct TaxonomyReasoner;

impl TaxonomyReasoner {
    pub fn new() -> Self {
        Self
    }

    fn detect_role(text: &str, profile: &ProfileContext) -> Option<String> {
        let from_profile = profile
            .get("current_role")
            .and_then(Value::as_str)
            .map(str::to_lowercase);
        for (role, _) in CAREER_PATHS {
            if text.contains(role) || from_profile.as_deref() == Some(role) {
                return Some((*role).to_string());
            }
        }
        for (role, _) in ROLE_SKILLS {
            if text.contains(role) || from_profile.as_deref() == Some(role) {
                return Some((*role).to_string());
            }
        }
        None
    }

    fn extract_skills(text: &str, profile: &ProfileContext) -> Vec<String> {
        let mut skills: Vec<String> = SKILL_KEYWORDS
            .iter()
            .filter(|(keyword, _)| text.contains(keyword))
            .map(|(_, canonical)| (*canonical).to_string())
            .collect();
        if let Some(listed) = profile.get("skills").and_then(Value::as_array) {
            for skill in listed.iter().filter_map(Value::as_str) {
                if !skills.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
                    skills.push(skill.to_string());
                }
            }
        }
        skills
    }
}

#[async_trait]
impl ReasoningService for TaxonomyReasoner {
    async fn analyze(
        &self,
        agent: AgentKind,
        text: &str,
        profile: &ProfileContext,
    ) -> anyhow::Result<ReasoningOutcome> {
        let text = text.to_lowercase();
        let skills = Self::extract_skills(&text, profile);
        let role = Self::detect_role(&text, profile);

        let career_paths = role
            .as_deref()
            .and_then(|r| {
                CAREER_PATHS
                    .iter()
                    .find(|(known, _)| *known == r)
                    .map(|(_, paths)| paths.iter().map(|p| (*p).to_string()).collect())
            })
            .unwrap_or_default();

        let gaps: Vec<String> = role
            .as_deref()
            .and_then(|r| {
                ROLE_SKILLS
                    .iter()
                    .find(|(known, _)| *known == r)
                    .map(|(_, expected)| {
                        expected
                            .iter()
                            .filter(|e| !skills.iter().any(|s| s.eq_ignore_ascii_case(e)))
                            .map(|e| (*e).to_string())
                            .collect()
                    })
            })
            .unwrap_or_default();

        // Confidence grows with the amount of corroborating evidence.
        let mut confidence: f64 = 0.35;
        if !skills.is_empty() {
            confidence += 0.2;
        }
        if role.is_some() {
            confidence += 0.25;
        }
        if !profile.is_empty() {
            confidence += 0.1;
        }
        let confidence = confidence.min(0.95);

        let mut extras = HashMap::new();
        extras.insert("agent".to_string(), json!(agent.as_str()));
        if let Some(role) = &role {
            extras.insert("detected_role".to_string(), json!(role));
        }
        extras.insert("profile_fields".to_string(), json!(profile.len()));

        Ok(ReasoningOutcome {
            skills,
            career_paths,
            gaps,
            extras,
            confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn extracts_skills_and_paths_from_text() {
        let reasoner = TaxonomyReasoner::new();
        let outcome = reasoner
            .analyze(
                AgentKind::SkillsAnalyzer,
                "I'm a data analyst who knows SQL and some Python",
                &ProfileContext::new(),
            )
            .await
            .unwrap();

        assert!(outcome.skills.contains(&"SQL".to_string()));
        assert!(outcome.skills.contains(&"Python".to_string()));
        assert!(outcome.career_paths.contains(&"Data Scientist".to_string()));
        assert!(outcome.confidence > 0.5);
        assert!(outcome.confidence <= 1.0);
    }

    #[tokio::test]
    async fn role_gaps_exclude_evidenced_skills() {
        let reasoner = TaxonomyReasoner::new();
        let outcome = reasoner
            .analyze(
                AgentKind::CareerAdvisor,
                "as a data analyst I use sql every day",
                &ProfileContext::new(),
            )
            .await
            .unwrap();

        assert!(!outcome.gaps.contains(&"SQL".to_string()));
        assert!(outcome.gaps.contains(&"Statistics".to_string()));
    }

    #[tokio::test]
    async fn profile_supplies_role_and_skills() {
        let reasoner = TaxonomyReasoner::new();
        let mut profile = ProfileContext::new();
        profile.insert("current_role".into(), json!("software engineer"));
        profile.insert("skills".into(), json!(["Go", "Rust"]));

        let outcome = reasoner
            .analyze(AgentKind::CareerAdvisor, "what should I learn next?", &profile)
            .await
            .unwrap();

        assert_eq!(outcome.extras["detected_role"], json!("software engineer"));
        assert!(outcome.skills.contains(&"Go".to_string()));
        assert!(outcome.career_paths.contains(&"Staff Engineer".to_string()));
    }

    #[tokio::test]
    async fn empty_evidence_still_yields_outcome() {
        let reasoner = TaxonomyReasoner::new();
        let outcome = reasoner
            .analyze(AgentKind::NetworkConnector, "hi", &ProfileContext::new())
            .await
            .unwrap();
        assert!(outcome.skills.is_empty());
        assert!(outcome.career_paths.is_empty());
        assert!(outcome.confidence >= 0.3);
    }
}
