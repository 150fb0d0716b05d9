//! Git provenance resolution.
//!
//! Each CI integration is a `GitDataResolver`. Resolvers are consulted in a
//! fixed priority order and the first one that says it applies supplies the
//! provenance, even when it then finds nothing to report. Whether a resolver
//! produces full `GitData` or a bare `CommitSha` depends only on what its own
//! environment exposes.

use tracing::debug;

use crate::model::{CommitSha, GitData, GitHead, GitRemote, Provenance};
use crate::ports::{Console, Environment};

pub trait GitDataResolver {
    /// Short display name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether this resolver's environment is present. Must not have side
    /// effects and must not touch a repository.
    fn can_provide_data(&self) -> bool;

    fn generate_data(&self) -> Option<Provenance>;
}

/// Walk `resolvers` in order and return what the first applicable one
/// generates. `None` when no resolver applies or the applicable one has no
/// data.
pub fn resolve_provenance(resolvers: &[Box<dyn GitDataResolver + '_>]) -> Option<Provenance> {
    for resolver in resolvers {
        if !resolver.can_provide_data() {
            debug!(resolver = resolver.name(), "git data resolver not applicable");
            continue;
        }
        let data = resolver.generate_data();
        debug!(
            resolver = resolver.name(),
            found = data.is_some(),
            "git data resolved"
        );
        return data;
    }
    debug!("no git data resolver applicable");
    None
}

/// The built-in resolvers in priority order: explicit command-line values
/// first, then each supported CI system.
pub fn default_resolvers<'a>(
    overrides: &'a GitOverrides,
    env: &'a dyn Environment,
    console: &'a dyn Console,
) -> Vec<Box<dyn GitDataResolver + 'a>> {
    vec![
        Box::new(CommandLineGitDataResolver::new(overrides)),
        Box::new(AppVeyorGitDataResolver::new(env, console)),
        Box::new(TeamCityGitDataResolver::new(env, console)),
        Box::new(GitHubActionsGitDataResolver::new(env, console)),
        Box::new(JenkinsGitDataResolver::new(env, console)),
    ]
}

/// Git details given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOverrides {
    pub commit_id: Option<String>,
    pub branch: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub remote_name: Option<String>,
    pub remote_url: Option<String>,
}

impl GitOverrides {
    /// True when nothing beyond (at most) a commit id was given. A remote
    /// name only counts together with a remote url.
    fn only_commit_id(&self) -> bool {
        self.branch.is_none()
            && self.author.is_none()
            && self.email.is_none()
            && self.message.is_none()
            && self.remote_url.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.commit_id.is_none() && self.only_commit_id()
    }
}

pub struct CommandLineGitDataResolver<'a> {
    overrides: &'a GitOverrides,
}

impl<'a> CommandLineGitDataResolver<'a> {
    pub fn new(overrides: &'a GitOverrides) -> Self {
        Self { overrides }
    }
}

impl GitDataResolver for CommandLineGitDataResolver<'_> {
    fn name(&self) -> &'static str {
        "command line"
    }

    fn can_provide_data(&self) -> bool {
        !self.overrides.is_empty()
    }

    fn generate_data(&self) -> Option<Provenance> {
        let o = self.overrides;
        if o.only_commit_id() {
            return o.commit_id.clone().map(|sha| Provenance::CommitSha(CommitSha(sha)));
        }
        let remotes = o
            .remote_url
            .iter()
            .map(|url| GitRemote {
                name: o.remote_name.clone().unwrap_or_else(|| "origin".to_string()),
                url: url.clone(),
            })
            .collect();
        Some(Provenance::Git(git_data(
            o.branch.clone(),
            o.commit_id.clone(),
            o.author.clone(),
            o.email.clone(),
            o.message.clone(),
            remotes,
        )))
    }
}

pub struct AppVeyorGitDataResolver<'a> {
    env: &'a dyn Environment,
    console: &'a dyn Console,
}

impl<'a> AppVeyorGitDataResolver<'a> {
    pub fn new(env: &'a dyn Environment, console: &'a dyn Console) -> Self {
        Self { env, console }
    }
}

impl GitDataResolver for AppVeyorGitDataResolver<'_> {
    fn name(&self) -> &'static str {
        "AppVeyor"
    }

    fn can_provide_data(&self) -> bool {
        self.env
            .var("APPVEYOR")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    fn generate_data(&self) -> Option<Provenance> {
        self.console.write_line("Using AppVeyor Environment Variables");
        let env = self.env;
        Some(Provenance::Git(git_data(
            env.non_blank("APPVEYOR_REPO_BRANCH"),
            env.non_blank("APPVEYOR_REPO_COMMIT"),
            env.non_blank("APPVEYOR_REPO_COMMIT_AUTHOR"),
            env.non_blank("APPVEYOR_REPO_COMMIT_AUTHOR_EMAIL"),
            env.non_blank("APPVEYOR_REPO_COMMIT_MESSAGE"),
            Vec::new(),
        )))
    }
}

/// TeamCity exposes only `BUILD_VCS_NUMBER` out of the box. Builds that
/// define the `TEAMCITY_BUILD_*` parameters get full git data.
pub struct TeamCityGitDataResolver<'a> {
    env: &'a dyn Environment,
    console: &'a dyn Console,
}

impl<'a> TeamCityGitDataResolver<'a> {
    pub fn new(env: &'a dyn Environment, console: &'a dyn Console) -> Self {
        Self { env, console }
    }
}

impl GitDataResolver for TeamCityGitDataResolver<'_> {
    fn name(&self) -> &'static str {
        "TeamCity"
    }

    fn can_provide_data(&self) -> bool {
        self.env.non_blank("TEAMCITY_VERSION").is_some()
    }

    fn generate_data(&self) -> Option<Provenance> {
        self.console.write_line("Using TeamCity Environment Variables");
        let env = self.env;

        let branch = env.non_blank("TEAMCITY_BUILD_BRANCH");
        let commit = env.non_blank("TEAMCITY_BUILD_COMMIT");
        let vcs_number = env.non_blank("BUILD_VCS_NUMBER");

        if branch.is_none() && commit.is_none() {
            return vcs_number.map(|sha| Provenance::CommitSha(CommitSha(sha)));
        }

        let remotes = env
            .non_blank("TEAMCITY_BUILD_REPOSITORY")
            .map(|url| GitRemote {
                name: "origin".to_string(),
                url,
            })
            .into_iter()
            .collect();
        Some(Provenance::Git(git_data(
            branch,
            commit.or(vcs_number),
            env.non_blank("TEAMCITY_BUILD_COMMIT_AUTHOR"),
            env.non_blank("TEAMCITY_BUILD_COMMIT_EMAIL"),
            env.non_blank("TEAMCITY_BUILD_COMMIT_MESSAGE"),
            remotes,
        )))
    }
}

pub struct GitHubActionsGitDataResolver<'a> {
    env: &'a dyn Environment,
    console: &'a dyn Console,
}

impl<'a> GitHubActionsGitDataResolver<'a> {
    pub fn new(env: &'a dyn Environment, console: &'a dyn Console) -> Self {
        Self { env, console }
    }
}

impl GitDataResolver for GitHubActionsGitDataResolver<'_> {
    fn name(&self) -> &'static str {
        "GitHub Actions"
    }

    fn can_provide_data(&self) -> bool {
        self.env
            .var("GITHUB_ACTIONS")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    fn generate_data(&self) -> Option<Provenance> {
        self.console
            .write_line("Using GitHub Actions Environment Variables");
        let env = self.env;

        // On pull_request events GITHUB_REF_NAME is the merge ref; the head
        // branch is the useful one.
        let branch = env
            .non_blank("GITHUB_HEAD_REF")
            .or_else(|| env.non_blank("GITHUB_REF_NAME"));
        let sha = env.non_blank("GITHUB_SHA")?;

        Some(match branch {
            Some(branch) => {
                let server = env.non_blank("GITHUB_SERVER_URL");
                let repo = env.non_blank("GITHUB_REPOSITORY");
                let remotes = match (server, repo) {
                    (Some(server), Some(repo)) => vec![GitRemote {
                        name: "origin".to_string(),
                        url: format!("{}/{}.git", server.trim_end_matches('/'), repo),
                    }],
                    _ => Vec::new(),
                };
                Provenance::Git(git_data(
                    Some(branch),
                    Some(sha),
                    env.non_blank("GITHUB_ACTOR"),
                    None,
                    None,
                    remotes,
                ))
            }
            None => Provenance::CommitSha(CommitSha(sha)),
        })
    }
}

pub struct JenkinsGitDataResolver<'a> {
    env: &'a dyn Environment,
    console: &'a dyn Console,
}

impl<'a> JenkinsGitDataResolver<'a> {
    pub fn new(env: &'a dyn Environment, console: &'a dyn Console) -> Self {
        Self { env, console }
    }
}

impl GitDataResolver for JenkinsGitDataResolver<'_> {
    fn name(&self) -> &'static str {
        "Jenkins"
    }

    fn can_provide_data(&self) -> bool {
        self.env.non_blank("JENKINS_URL").is_some()
    }

    fn generate_data(&self) -> Option<Provenance> {
        self.console.write_line("Using Jenkins Environment Variables");
        let env = self.env;

        let sha = env.non_blank("GIT_COMMIT")?;
        Some(match env.non_blank("GIT_BRANCH") {
            Some(branch) => {
                let remotes = env
                    .non_blank("GIT_URL")
                    .map(|url| GitRemote {
                        name: "origin".to_string(),
                        url,
                    })
                    .into_iter()
                    .collect();
                Provenance::Git(git_data(
                    Some(branch),
                    Some(sha),
                    env.non_blank("GIT_AUTHOR_NAME"),
                    env.non_blank("GIT_AUTHOR_EMAIL"),
                    None,
                    remotes,
                ))
            }
            None => Provenance::CommitSha(CommitSha(sha)),
        })
    }
}

/// Assemble `GitData`. CI systems rarely distinguish author from committer,
/// so both get the same identity.
fn git_data(
    branch: Option<String>,
    commit_id: Option<String>,
    author: Option<String>,
    email: Option<String>,
    message: Option<String>,
    remotes: Vec<GitRemote>,
) -> GitData {
    let author = author.unwrap_or_default();
    let email = email.unwrap_or_default();
    GitData {
        head: GitHead {
            id: commit_id.unwrap_or_default(),
            committer_name: author.clone(),
            committer_email: email.clone(),
            author_name: author,
            author_email: email,
            message: message.unwrap_or_default(),
        },
        branch: branch.unwrap_or_default(),
        remotes,
    }
}
