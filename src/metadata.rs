//! CI build metadata (service name, job id, build number, pull request).

use std::sync::LazyLock;

use regex::Regex;

use crate::model::CoverageMetadata;
use crate::ports::Environment;

/// `refs/pull/<number>/merge` or `refs/pull/<number>/head`.
static PULL_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^refs/pull/(\d+)/").expect("valid regex"));

/// Values given explicitly on the command line. Each one wins over what the
/// CI environment reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOverrides {
    pub service_name: Option<String>,
    pub job_id: Option<String>,
    pub build_number: Option<String>,
    pub pull_request_id: Option<String>,
    pub parallel: bool,
}

/// Detect the CI system from `env` and fill in its build identifiers, then
/// apply `overrides` field by field.
pub fn resolve_metadata(env: &dyn Environment, overrides: &MetadataOverrides) -> CoverageMetadata {
    let mut metadata = detect(env).unwrap_or_default();

    if let Some(name) = &overrides.service_name {
        metadata.service_name = name.clone();
    }
    if overrides.job_id.is_some() {
        metadata.service_job_id = overrides.job_id.clone();
    }
    if overrides.build_number.is_some() {
        metadata.service_build_number = overrides.build_number.clone();
    }
    if overrides.pull_request_id.is_some() {
        metadata.pull_request_id = overrides.pull_request_id.clone();
    }
    metadata.parallel = overrides.parallel || is_true(env, "COVERALLS_PARALLEL");

    metadata
}

fn is_true(env: &dyn Environment, name: &str) -> bool {
    env.var(name)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn detect(env: &dyn Environment) -> Option<CoverageMetadata> {
    if is_true(env, "APPVEYOR") {
        return Some(CoverageMetadata {
            service_name: "appveyor".to_string(),
            service_job_id: env.non_blank("APPVEYOR_JOB_ID"),
            service_build_number: env.non_blank("APPVEYOR_BUILD_NUMBER"),
            pull_request_id: env.non_blank("APPVEYOR_PULL_REQUEST_NUMBER"),
            parallel: false,
        });
    }
    if env.non_blank("TEAMCITY_VERSION").is_some() {
        return Some(CoverageMetadata {
            service_name: "teamcity".to_string(),
            service_job_id: None,
            service_build_number: env.non_blank("BUILD_NUMBER"),
            pull_request_id: None,
            parallel: false,
        });
    }
    if is_true(env, "GITHUB_ACTIONS") {
        return Some(CoverageMetadata {
            service_name: "github".to_string(),
            service_job_id: env.non_blank("GITHUB_RUN_ID"),
            service_build_number: env.non_blank("GITHUB_RUN_NUMBER"),
            pull_request_id: env
                .non_blank("GITHUB_REF")
                .and_then(|r| pull_request_from_ref(&r)),
            parallel: false,
        });
    }
    if env.non_blank("JENKINS_URL").is_some() {
        return Some(CoverageMetadata {
            service_name: "jenkins".to_string(),
            service_job_id: env.non_blank("BUILD_ID"),
            service_build_number: env.non_blank("BUILD_NUMBER"),
            pull_request_id: env.non_blank("CHANGE_ID"),
            parallel: false,
        });
    }
    None
}

/// Extract the PR number from a GitHub ref (e.g. "refs/pull/42/merge" → "42").
fn pull_request_from_ref(git_ref: &str) -> Option<String> {
    PULL_REF_RE
        .captures(git_ref)
        .map(|caps| caps[1].to_string())
}
