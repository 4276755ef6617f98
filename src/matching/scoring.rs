// src/matching/scoring.rs
//! Signal scorers and the score aggregator.
//!
//! Four independent, side-effect-free signals feed one composite match
//! score: semantic similarity between job and resume embeddings, keyword
//! overlap with the required-skills set, experience-year fit, and role-title
//! fit. Every cap, bonus band and threshold lives in [`ScoringConfig`] so
//! tuning is a config change, not a code change.

use regex::Regex;
use std::sync::OnceLock;

/// All scoring weights, caps, bands and thresholds in one place
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Upper bound applied to raw cosine similarity before aggregation
    pub similarity_cap: f64,
    /// Maximum bonus from required-skill keyword overlap
    pub keyword_max: f64,
    /// Experience bonus when candidate years >= required
    pub experience_full: f64,
    /// Experience bonus when candidate years >= 75% of required
    pub experience_partial: f64,
    /// Experience bonus when candidate years >= 50% of required
    pub experience_half: f64,
    /// Role-similarity band floors
    pub role_strong_min: f64,
    pub role_acceptable_min: f64,
    pub role_weak_min: f64,
    /// Role bonuses/penalties per band
    pub role_strong_bonus: f64,
    pub role_weak_penalty: f64,
    pub role_mismatch_penalty: f64,
    /// Aggregate score above which an applicant is auto-shortlisted
    pub shortlist_threshold: f64,
    /// Minimum resume length (chars) worth sending to the feedback model
    pub feedback_min_resume_len: usize,
    /// Bound on concurrent extraction/embedding calls per run
    pub fetch_concurrency: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_cap: 0.8,
            keyword_max: 0.03,
            experience_full: 0.03,
            experience_partial: 0.02,
            experience_half: 0.01,
            role_strong_min: 0.85,
            role_acceptable_min: 0.70,
            role_weak_min: 0.50,
            role_strong_bonus: 0.05,
            role_weak_penalty: -0.05,
            role_mismatch_penalty: -0.10,
            shortlist_threshold: 0.5,
            feedback_min_resume_len: 300,
            fetch_concurrency: 4,
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the vectors differ in dimensionality or either has zero
/// magnitude - a data-integrity guard, not an expected case.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += (*x as f64) * (*y as f64);
    }

    let mag_a = a.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a > 0.0 && mag_b > 0.0 {
        dot / (mag_a * mag_b)
    } else {
        0.0
    }
}

/// Cosine similarity capped so a single signal cannot dominate the composite
pub fn semantic_similarity(config: &ScoringConfig, job: &[f32], resume: &[f32]) -> f64 {
    cosine_similarity(job, resume).min(config.similarity_cap)
}

/// Fraction of required skills appearing in the resume text, scaled into a
/// small bonus band
pub fn keyword_bonus(config: &ScoringConfig, resume_text: &str, skills: &[String]) -> f64 {
    if resume_text.is_empty() || skills.is_empty() {
        return 0.0;
    }

    let lower_text = resume_text.to_lowercase();
    let matched = skills
        .iter()
        .filter(|skill| lower_text.contains(&skill.to_lowercase()))
        .count();

    let proportion = matched as f64 / skills.len() as f64;
    (proportion * config.keyword_max).clamp(0.0, config.keyword_max)
}

fn required_years_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\+?\s*(years|yrs)").expect("valid regex"))
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*-\s*(\d+)").expect("valid regex"))
}

fn single_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)").expect("valid regex"))
}

/// Required years of experience parsed out of free-text job description
/// ("5+ years", "3 yrs")
pub fn parse_required_years(job_description: &str) -> Option<u32> {
    required_years_re()
        .captures(job_description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|years| *years > 0)
}

/// Candidate years: upper bound of a "low-high" range, else the first number
pub fn parse_candidate_years(experience_years: &str) -> Option<u32> {
    let years = if let Some(caps) = range_re().captures(experience_years) {
        caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok())
    } else {
        single_number_re()
            .captures(experience_years)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
    };
    years.filter(|y| *y > 0)
}

/// Tiered experience-fit bonus. Absence of a parseable figure on either side
/// yields 0, never an error.
pub fn experience_bonus(
    config: &ScoringConfig,
    job_description: &str,
    experience_years: Option<&str>,
) -> f64 {
    let required = match parse_required_years(job_description) {
        Some(years) => years,
        None => return 0.0,
    };
    let candidate = match experience_years.and_then(parse_candidate_years) {
        Some(years) => years,
        None => return 0.0,
    };

    let required = required as f64;
    let candidate = candidate as f64;

    if candidate >= required {
        config.experience_full
    } else if candidate >= required * 0.75 {
        config.experience_partial
    } else if candidate >= required * 0.5 {
        config.experience_half
    } else {
        0.0
    }
}

/// Signed role-fit bonus from profession/role embedding similarity.
/// The only signal that can pull the aggregate below the raw similarity.
pub fn role_bonus_from_similarity(config: &ScoringConfig, similarity: f64) -> f64 {
    if similarity >= config.role_strong_min {
        config.role_strong_bonus
    } else if similarity >= config.role_acceptable_min {
        0.0
    } else if similarity >= config.role_weak_min {
        config.role_weak_penalty
    } else {
        config.role_mismatch_penalty
    }
}

/// Sum the four signals and clamp into [0, 1]. The keyword contribution is
/// clamped non-negative before summing; each signal carries its own cap.
pub fn aggregate(
    similarity: f64,
    keyword_bonus: f64,
    experience_bonus: f64,
    role_bonus: f64,
) -> f64 {
    let total = similarity + keyword_bonus.max(0.0) + experience_bonus + role_bonus;
    total.clamp(0.0, 1.0)
}
