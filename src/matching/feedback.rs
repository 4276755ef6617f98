// src/matching/feedback.rs
//! Natural-language feedback for shortlisted candidates.
//!
//! Feedback is an enrichment: any failure of the text-generation call is
//! logged and swallowed, never surfaced to the pipeline.

use tracing::warn;

use crate::services::TextGenerator;

pub fn build_feedback_prompt(
    resume_text: &str,
    job_role: &str,
    company_name: &str,
    job_description: &str,
) -> String {
    format!(
        r#"
You are an AI assistant evaluating a resume for the role of {job_role} at {company_name}.

Below is the applicant's resume:
"""
{resume_text}
"""

And here's the job description for reference:
"""
{job_description}
"""

In 2-3 concise sentences, provide a brief evaluation of the applicant. Highlight their key strengths and relevant experiences, mention any noticeable gaps or weaknesses in relation to the job description, and identify relevant skills or qualifications.
"#
    )
}

/// Generate a short evaluation of a shortlisted applicant, or `None` when
/// the model call fails or produces nothing usable
pub async fn generate_feedback(
    generator: &dyn TextGenerator,
    resume_text: &str,
    job_role: &str,
    company_name: &str,
    job_description: &str,
) -> Option<String> {
    let prompt = build_feedback_prompt(resume_text, job_role, company_name, job_description);

    match generator.generate(&prompt).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "Feedback generation failed, omitting feedback");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CohereError;
    use async_trait::async_trait;

    struct CannedGenerator(Result<&'static str, ()>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, CohereError> {
            self.0
                .map(|s| s.to_string())
                .map_err(|_| CohereError::RequestFailed("boom".to_string()))
        }
    }

    #[test]
    fn test_prompt_includes_all_context() {
        let prompt = build_feedback_prompt("resume body", "Backend Engineer", "Acme", "job desc");
        assert!(prompt.contains("role of Backend Engineer at Acme"));
        assert!(prompt.contains("resume body"));
        assert!(prompt.contains("job desc"));
    }

    #[tokio::test]
    async fn test_feedback_failure_yields_none() {
        let generator = CannedGenerator(Err(()));
        let feedback = generate_feedback(&generator, "r", "role", "co", "desc").await;
        assert!(feedback.is_none());
    }

    #[tokio::test]
    async fn test_feedback_success_passes_through() {
        let generator = CannedGenerator(Ok("Strong candidate."));
        let feedback = generate_feedback(&generator, "r", "role", "co", "desc").await;
        assert_eq!(feedback.as_deref(), Some("Strong candidate."));
    }
}
