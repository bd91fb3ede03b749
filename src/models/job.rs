use serde::{Deserialize, Serialize};

use super::profile::InstitutionSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Temporary => "temporary",
            JobType::Internship => "internship",
        }
    }
}

/// Vaga publicada por uma instituição (collection "jobs")
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning institution's user id
    pub institution_id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub location: String,
    pub job_type: JobType,
    #[serde(default)]
    pub experience_required: u32,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_vacancies")]
    pub vacancies: u32,
    pub is_active: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    #[serde(rename = "applicationscount", default)]
    pub applications_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_vacancies() -> u32 {
    1
}

impl Job {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// Visible on the public board.
    pub fn is_open(&self, now: i64) -> bool {
        self.is_active && !self.is_deleted && !self.is_expired(now)
    }
}

/// Job with its institution populated, as returned by detail endpoints.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub institution: Option<InstitutionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSort {
    #[default]
    Newest,
    Salary,
}

/// Filtros da busca pública de vagas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobQuery {
    pub q: Option<String>,
    pub subject: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub min_salary: Option<i64>,
    #[serde(default)]
    pub sort: JobSort,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl JobQuery {
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const MAX_LIMIT: u64 = 50;

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn skip(&self) -> u64 {
        (self.page() - 1) * self.limit()
    }

    fn term(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_lowercase)
    }

    pub fn text(&self) -> Option<String> {
        Self::term(&self.q)
    }

    pub fn subject_term(&self) -> Option<String> {
        Self::term(&self.subject)
    }

    pub fn location_term(&self) -> Option<String> {
        Self::term(&self.location)
    }

    /// In-process evaluation of the same filter the Mongo backend builds.
    pub fn matches(&self, job: &Job, now: i64) -> bool {
        if !job.is_open(now) {
            return false;
        }
        if let Some(text) = self.text() {
            let hit = [&job.title, &job.description, &job.subject]
                .iter()
                .any(|field| field.to_lowercase().contains(&text));
            if !hit {
                return false;
            }
        }
        if let Some(subject) = self.subject_term() {
            if !job.subject.to_lowercase().contains(&subject) {
                return false;
            }
        }
        if let Some(location) = self.location_term() {
            if !job.location.to_lowercase().contains(&location) {
                return false;
            }
        }
        if let Some(job_type) = self.job_type {
            if job.job_type != job_type {
                return false;
            }
        }
        if let Some(min_salary) = self.min_salary {
            if job.salary_max.map_or(true, |max| max < min_salary) {
                return false;
            }
        }
        true
    }

    /// Ordering applied after filtering; ties break on id for stable pages.
    pub fn sort_jobs(&self, jobs: &mut [Job]) {
        match self.sort {
            JobSort::Newest => jobs.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
            }),
            JobSort::Salary => jobs.sort_by(|a, b| {
                b.salary_max
                    .unwrap_or(0)
                    .cmp(&a.salary_max.unwrap_or(0))
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
    }
}

/// Pagination block returned with list endpoints.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Pagination {
            page,
            limit,
            total,
            pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_job;

    #[test]
    fn test_query_filters_closed_jobs() {
        let now = 1_700_000_000;
        let query = JobQuery::default();

        let mut job = sample_job("j1", "i1", now);
        assert!(query.matches(&job, now));

        job.expires_at = now - 1;
        assert!(!query.matches(&job, now));

        let mut job = sample_job("j2", "i1", now);
        job.is_deleted = true;
        assert!(!query.matches(&job, now));
    }

    #[test]
    fn test_query_text_and_salary_filters() {
        let now = 1_700_000_000;
        let job = sample_job("j1", "i1", now);

        let query = JobQuery {
            q: Some("  MATHEMATICS ".into()),
            location: Some("chennai".into()),
            ..Default::default()
        };
        assert!(query.matches(&job, now));

        let query = JobQuery {
            q: Some("physics".into()),
            ..Default::default()
        };
        assert!(!query.matches(&job, now));

        let query = JobQuery {
            min_salary: Some(60_000),
            ..Default::default()
        };
        assert!(!query.matches(&job, now));

        let query = JobQuery {
            job_type: Some(JobType::PartTime),
            ..Default::default()
        };
        assert!(!query.matches(&job, now));
    }

    #[test]
    fn test_paging_bounds() {
        let query = JobQuery {
            page: Some(0),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), JobQuery::MAX_LIMIT);
        assert_eq!(Pagination::new(3, 10, 21).pages, 3);
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
    }
}
