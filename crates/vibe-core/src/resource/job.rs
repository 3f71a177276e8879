use serde::{Deserialize, Serialize};

/// A scheduled automation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_duration_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// One past execution of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    pub id: String,
    pub job_name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobHistory {
    #[serde(default)]
    pub history: Vec<JobRun>,
}

/// Body of the job update endpoint: toggles a job or triggers it immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobUpdateRequest {
    pub job_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_now: Option<bool>,
}

impl JobUpdateRequest {
    pub fn set_enabled(job_name: impl Into<String>, enabled: bool) -> Self {
        Self {
            job_name: job_name.into(),
            enabled: Some(enabled),
            run_now: None,
        }
    }

    pub fn run_now(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            enabled: None,
            run_now: Some(true),
        }
    }
}
