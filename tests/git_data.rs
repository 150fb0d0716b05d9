mod common;

use common::{env, TestConsole};
use covpub::git_data::{
    default_resolvers, resolve_provenance, AppVeyorGitDataResolver, GitDataResolver,
    GitHubActionsGitDataResolver, GitOverrides, JenkinsGitDataResolver, TeamCityGitDataResolver,
};
use covpub::model::{GitData, Provenance};

fn expect_git(provenance: Option<Provenance>) -> GitData {
    match provenance {
        Some(Provenance::Git(git)) => git,
        other => panic!("expected git data, got {other:?}"),
    }
}

fn expect_sha(provenance: Option<Provenance>) -> String {
    match provenance {
        Some(Provenance::CommitSha(sha)) => sha.0,
        other => panic!("expected commit sha, got {other:?}"),
    }
}

#[test]
fn teamcity_without_version_does_not_apply() {
    let vars = env(&[("BUILD_VCS_NUMBER", "abc")]);
    let console = TestConsole::default();
    assert!(!TeamCityGitDataResolver::new(&vars, &console).can_provide_data());
}

#[test]
fn teamcity_blank_version_does_not_apply() {
    let vars = env(&[("TEAMCITY_VERSION", "  ")]);
    let console = TestConsole::default();
    assert!(!TeamCityGitDataResolver::new(&vars, &console).can_provide_data());
}

#[test]
fn teamcity_vcs_number_only_gives_commit_sha() {
    let vars = env(&[
        ("TEAMCITY_VERSION", "2023.05.4"),
        ("BUILD_VCS_NUMBER", "9f1c2e"),
    ]);
    let console = TestConsole::default();
    let resolver = TeamCityGitDataResolver::new(&vars, &console);

    assert!(resolver.can_provide_data());
    assert_eq!(expect_sha(resolver.generate_data()), "9f1c2e");
    assert_eq!(console.lines(), ["Using TeamCity Environment Variables"]);
}

#[test]
fn teamcity_without_commit_information_gives_nothing() {
    let vars = env(&[("TEAMCITY_VERSION", "2023.05.4")]);
    let console = TestConsole::default();
    let resolver = TeamCityGitDataResolver::new(&vars, &console);

    assert!(resolver.can_provide_data());
    assert!(resolver.generate_data().is_none());
}

#[test]
fn teamcity_build_parameters_give_git_data() {
    let vars = env(&[
        ("TEAMCITY_VERSION", "2023.05.4"),
        ("BUILD_VCS_NUMBER", "9f1c2e"),
        ("TEAMCITY_BUILD_BRANCH", "feature/x"),
        ("TEAMCITY_BUILD_COMMIT_AUTHOR", "Sam Doe"),
        ("TEAMCITY_BUILD_COMMIT_EMAIL", "sam@example.com"),
        ("TEAMCITY_BUILD_COMMIT_MESSAGE", "Add feature"),
        ("TEAMCITY_BUILD_REPOSITORY", "https://example.com/repo.git"),
    ]);
    let console = TestConsole::default();
    let git = expect_git(TeamCityGitDataResolver::new(&vars, &console).generate_data());

    assert_eq!(git.branch, "feature/x");
    assert_eq!(git.head.id, "9f1c2e");
    assert_eq!(git.head.author_name, "Sam Doe");
    assert_eq!(git.head.committer_email, "sam@example.com");
    assert_eq!(git.head.message, "Add feature");
    assert_eq!(git.remotes.len(), 1);
    assert_eq!(git.remotes[0].name, "origin");
    assert_eq!(git.remotes[0].url, "https://example.com/repo.git");
}

#[test]
fn teamcity_build_commit_wins_over_vcs_number() {
    let vars = env(&[
        ("TEAMCITY_VERSION", "2023.05.4"),
        ("BUILD_VCS_NUMBER", "old"),
        ("TEAMCITY_BUILD_COMMIT", "new"),
    ]);
    let console = TestConsole::default();
    let git = expect_git(TeamCityGitDataResolver::new(&vars, &console).generate_data());
    assert_eq!(git.head.id, "new");
    assert_eq!(git.branch, "");
    assert!(git.remotes.is_empty());
}

#[test]
fn appveyor_gives_git_data() {
    let vars = env(&[
        ("APPVEYOR", "True"),
        ("APPVEYOR_REPO_BRANCH", "master"),
        ("APPVEYOR_REPO_COMMIT", "c0ffee"),
        ("APPVEYOR_REPO_COMMIT_AUTHOR", "Alex"),
        ("APPVEYOR_REPO_COMMIT_AUTHOR_EMAIL", "alex@example.com"),
        ("APPVEYOR_REPO_COMMIT_MESSAGE", "Release"),
    ]);
    let console = TestConsole::default();
    let resolver = AppVeyorGitDataResolver::new(&vars, &console);

    assert!(resolver.can_provide_data());
    let git = expect_git(resolver.generate_data());
    assert_eq!(git.branch, "master");
    assert_eq!(git.head.id, "c0ffee");
    assert_eq!(git.head.author_email, "alex@example.com");
    assert!(console.contains("AppVeyor"));
}

#[test]
fn appveyor_false_does_not_apply() {
    let vars = env(&[("APPVEYOR", "false")]);
    let console = TestConsole::default();
    assert!(!AppVeyorGitDataResolver::new(&vars, &console).can_provide_data());
}

#[test]
fn github_actions_pull_request_uses_head_branch() {
    let vars = env(&[
        ("GITHUB_ACTIONS", "true"),
        ("GITHUB_SHA", "abc123"),
        ("GITHUB_REF_NAME", "7/merge"),
        ("GITHUB_HEAD_REF", "topic"),
        ("GITHUB_ACTOR", "octocat"),
        ("GITHUB_SERVER_URL", "https://github.com/"),
        ("GITHUB_REPOSITORY", "owner/repo"),
    ]);
    let console = TestConsole::default();
    let git = expect_git(GitHubActionsGitDataResolver::new(&vars, &console).generate_data());

    assert_eq!(git.branch, "topic");
    assert_eq!(git.head.id, "abc123");
    assert_eq!(git.head.author_name, "octocat");
    assert_eq!(git.remotes[0].url, "https://github.com/owner/repo.git");
}

#[test]
fn github_actions_sha_only() {
    let vars = env(&[("GITHUB_ACTIONS", "true"), ("GITHUB_SHA", "abc123")]);
    let console = TestConsole::default();
    assert_eq!(
        expect_sha(GitHubActionsGitDataResolver::new(&vars, &console).generate_data()),
        "abc123"
    );
}

#[test]
fn jenkins_branch_and_commit() {
    let vars = env(&[
        ("JENKINS_URL", "https://ci.example.com/"),
        ("GIT_COMMIT", "feed42"),
        ("GIT_BRANCH", "origin/main"),
        ("GIT_URL", "git@example.com:repo.git"),
    ]);
    let console = TestConsole::default();
    let git = expect_git(JenkinsGitDataResolver::new(&vars, &console).generate_data());

    assert_eq!(git.branch, "origin/main");
    assert_eq!(git.head.id, "feed42");
    assert_eq!(git.remotes[0].url, "git@example.com:repo.git");
}

#[test]
fn jenkins_without_commit_gives_nothing() {
    let vars = env(&[("JENKINS_URL", "https://ci.example.com/")]);
    let console = TestConsole::default();
    assert!(JenkinsGitDataResolver::new(&vars, &console)
        .generate_data()
        .is_none());
}

#[test]
fn chain_order_appveyor_before_teamcity() {
    let vars = env(&[
        ("APPVEYOR", "true"),
        ("APPVEYOR_REPO_COMMIT", "from-appveyor"),
        ("TEAMCITY_VERSION", "2023.05.4"),
        ("BUILD_VCS_NUMBER", "from-teamcity"),
    ]);
    let console = TestConsole::default();
    let overrides = GitOverrides::default();

    let git = expect_git(resolve_provenance(&default_resolvers(
        &overrides, &vars, &console,
    )));
    assert_eq!(git.head.id, "from-appveyor");
    assert_eq!(console.lines(), ["Using AppVeyor Environment Variables"]);
}

#[test]
fn chain_stops_at_applicable_resolver_without_data() {
    // TeamCity applies but has no commit; Jenkins is never consulted.
    let vars = env(&[
        ("TEAMCITY_VERSION", "2023.05.4"),
        ("JENKINS_URL", "https://ci.example.com/"),
        ("GIT_COMMIT", "feed42"),
    ]);
    let console = TestConsole::default();
    let overrides = GitOverrides::default();

    assert!(resolve_provenance(&default_resolvers(&overrides, &vars, &console)).is_none());
    assert!(!console.contains("Jenkins"));
}

#[test]
fn no_ci_environment_no_provenance() {
    let vars = env(&[]);
    let console = TestConsole::default();
    let overrides = GitOverrides::default();

    assert!(resolve_provenance(&default_resolvers(&overrides, &vars, &console)).is_none());
    assert!(console.lines().is_empty());
}
