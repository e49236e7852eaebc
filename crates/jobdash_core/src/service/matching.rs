//! Resume-to-job match scoring seam.
//!
//! Real scoring heuristics live outside core; workflows only need a
//! deterministic `score` to run the `recalculate-match` cascade.

use crate::model::job::Job;
use crate::model::resume::Resume;
use std::collections::BTreeSet;

pub trait MatchScorer {
    /// Returns a 0..=100 match percentage.
    fn score(&self, resume: &Resume, job: &Job) -> u8;
}

/// Share of the job's skills listed on the resume, case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillOverlapScorer;

impl MatchScorer for SkillOverlapScorer {
    fn score(&self, resume: &Resume, job: &Job) -> u8 {
        let wanted: BTreeSet<String> = job.skills.iter().map(|s| normalize(s)).collect();
        if wanted.is_empty() {
            return 0;
        }
        let offered: BTreeSet<String> = resume.skills.iter().map(|s| normalize(s)).collect();
        let hits = wanted.intersection(&offered).count();
        u8::try_from(hits * 100 / wanted.len()).unwrap_or(100)
    }
}

fn normalize(skill: &str) -> String {
    skill.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{MatchScorer, SkillOverlapScorer};
    use crate::model::job::Job;
    use crate::model::resume::Resume;

    #[test]
    fn scores_share_of_job_skills() {
        let resume = Resume::new("cv", "").with_skills(["Rust", " sql ", "Go"]);
        let job = Job::new("Acme", "Engineer").with_skills(["rust", "SQL", "kubernetes", "aws"]);
        assert_eq!(SkillOverlapScorer.score(&resume, &job), 50);
    }

    #[test]
    fn job_without_skills_scores_zero() {
        let resume = Resume::new("cv", "").with_skills(["rust"]);
        let job = Job::new("Acme", "Engineer");
        assert_eq!(SkillOverlapScorer.score(&resume, &job), 0);
    }
}
