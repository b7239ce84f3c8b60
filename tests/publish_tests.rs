//! End-to-end publish scenarios against the mock system

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {

use clap::Parser as _;
use feedpush::cli::Args;
use feedpush::operations::{TaskMessage, TaskStatus};
use feedpush::run_with_system;
use feedpush::system::{MockSystem, System};
use std::path::{Path, PathBuf};

const TEMP_DIR: &str = "/agent/_temp/NuGet_77";

fn args(extra: &[&str]) -> Args {
    let mut argv = vec!["feedpush"];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
}

/// A hosted agent with three packages under /work/out
fn hosted_agent() -> MockSystem {
    MockSystem::new()
        .with_current_dir("/work")
        .with_env("BUILD_BUILDID", "77")
        .with_env("SYSTEM_TEAMFOUNDATIONCOLLECTIONURI", "https://dev.azure.com/contoso/")
        .with_env("SYSTEM_ACCESSTOKEN", "system-token")
        .with_env("SYSTEM_SERVERTYPE", "Hosted")
        .with_env("AGENT_TEMPDIRECTORY", "/agent/_temp")
        .with_dir("/agent/_temp")
        .with_file("/work/out/a.nupkg", b"a")
        .with_file("/work/out/b.nupkg", b"b")
        .with_file("/work/out/c.nupkg", b"c")
        .with_tool("nuget", "/tools/nuget")
        .with_tool("VstsNuGetPush", "/tools/VstsNuGetPush")
}

fn pushed_files(system: &MockSystem, position: usize) -> Vec<String> {
    system
        .invocations()
        .iter()
        .map(|r| r.invocation.args[position].clone())
        .collect()
}

#[test]
fn hosted_internal_push_uses_bundled_tool_in_order() {
    let system = hosted_agent();

    let result = run_with_system(
        args(&["--search-pattern", "out/*.nupkg", "--feed", "my-feed"]),
        &system,
    );

    assert_eq!(result.status, TaskStatus::Succeeded);
    assert_eq!(result.message, TaskMessage::PackagesPublished { count: 3 });

    let invocations = system.invocations();
    assert_eq!(invocations.len(), 3);
    for recorded in &invocations {
        assert_eq!(recorded.invocation.program, PathBuf::from("/tools/VstsNuGetPush"));
        assert!(recorded.invocation.args.contains(
            &"https://pkgs.dev.azure.com/contoso/_packaging/my-feed/nuget/v3/index.json".to_owned()
        ));
        assert!(recorded.invocation.args.contains(&"system-token".to_owned()));

        // The temporary config exists while each push runs
        let config = recorded.nuget_config.as_ref().unwrap();
        assert!(config.contains("VssSessionToken"));
        assert!(config.contains("<clear />"));
    }
    assert_eq!(
        pushed_files(&system, 0),
        vec!["/work/out/a.nupkg", "/work/out/b.nupkg", "/work/out/c.nupkg"]
    );

    assert!(!system.exists(Path::new(TEMP_DIR)).unwrap());
}

#[test]
fn external_without_connection_reports_no_source() {
    let system = hosted_agent();

    let result = run_with_system(
        args(&["--search-pattern", "out/a.nupkg", "--feed-type", "external"]),
        &system,
    );

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.message.key(), "Error_NoSourceSpecifiedForPush");
    assert_eq!(result.exit_code, 3);
    assert!(system.invocations().is_empty());
    assert!(!system.exists(Path::new(TEMP_DIR)).unwrap());
}

#[test]
fn zero_matches_is_success_without_feed_resolution() {
    // No token or service URL: feed resolution would fail if it ran
    let system = MockSystem::new().with_current_dir("/work");

    let result = run_with_system(
        args(&["--search-pattern", "out/*.nupkg", "--feed-type", "bogus"]),
        &system,
    );

    assert!(result.is_success());
    assert_eq!(result.message, TaskMessage::NoPackagesMatched);
    assert!(system.invocations().is_empty());
}

#[test]
fn directory_match_fails_before_any_push() {
    let system = hosted_agent().with_dir("/work/out/nested.nupkg");

    let result = run_with_system(
        args(&["--search-pattern", "out/*.nupkg", "--feed", "my-feed"]),
        &system,
    );

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.message, TaskMessage::PackagesFailedToPublish);
    assert_eq!(result.exit_code, 2);
    assert!(system.invocations().is_empty());
}

#[test]
fn unknown_feed_type_is_an_input_error() {
    let system = hosted_agent();

    let result = run_with_system(
        args(&["--search-pattern", "out/a.nupkg", "--feed-type", "public"]),
        &system,
    );

    assert_eq!(result.exit_code, 1);
    assert!(system.invocations().is_empty());
}

#[test]
fn feed_type_is_case_insensitive() {
    for feed_type in ["Internal", "INTERNAL", "internal"] {
        let system = hosted_agent();
        let result = run_with_system(
            args(&[
                "--search-pattern",
                "out/a.nupkg",
                "--feed-type",
                feed_type,
                "--feed",
                "my-feed",
            ]),
            &system,
        );
        assert!(result.is_success(), "{feed_type} should publish");
        assert_eq!(system.invocations().len(), 1);
    }
}

#[test]
fn conflict_is_tolerated_only_when_allowed() {
    let system = hosted_agent().with_exit_codes("/tools/VstsNuGetPush", &[2]);
    let result = run_with_system(
        args(&[
            "--search-pattern",
            "out/*.nupkg",
            "--feed",
            "my-feed",
            "--allow-package-conflicts",
        ]),
        &system,
    );
    assert!(result.is_success());
    assert_eq!(system.invocations().len(), 3);

    let system = hosted_agent().with_exit_codes("/tools/VstsNuGetPush", &[2]);
    let result = run_with_system(
        args(&["--search-pattern", "out/*.nupkg", "--feed", "my-feed"]),
        &system,
    );
    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.exit_code, 4);
    assert_eq!(system.invocations().len(), 1);
}

#[test]
fn push_failure_stops_and_cleans_up() {
    let system = hosted_agent()
        .with_env("NUGET_FORCENUGETFORPUSH", "true")
        .with_exit_codes("/tools/nuget", &[0, 1]);

    let result = run_with_system(
        args(&["--search-pattern", "out/*.nupkg", "--feed", "my-feed"]),
        &system,
    );

    assert_eq!(result.exit_code, 4);
    assert_eq!(pushed_files(&system, 1), vec!["/work/out/a.nupkg", "/work/out/b.nupkg"]);
    assert!(!system.exists(Path::new(TEMP_DIR)).unwrap());
}

#[test]
fn unexpected_error_cleans_up_and_exits_five() {
    let system = hosted_agent()
        .with_env("BUILD_IDENTITY_DISPLAYNAME", "Build Service")
        .with_unstartable("/tools/VstsNuGetPush");

    let result = run_with_system(
        args(&["--search-pattern", "out/a.nupkg", "--feed", "my-feed"]),
        &system,
    );

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.message, TaskMessage::PackagesFailedToPublish);
    assert_eq!(result.exit_code, 5);
    assert!(!system.exists(Path::new(TEMP_DIR)).unwrap());
}

#[test]
fn forced_nuget_uses_config_file_and_sentinel_key() {
    let system = hosted_agent().with_env("NUGET_FORCENUGETFORPUSH", "true");

    let result = run_with_system(
        args(&[
            "--search-pattern",
            "out/a.nupkg",
            "--feed",
            "my-feed",
            "--verbosity",
            "Detailed",
        ]),
        &system,
    );
    assert!(result.is_success());

    let invocations = system.invocations();
    let invocation = &invocations[0].invocation;
    assert_eq!(invocation.program, PathBuf::from("/tools/nuget"));
    assert_eq!(
        invocation.args,
        vec![
            "push",
            "/work/out/a.nupkg",
            "-NonInteractive",
            "-Source",
            "https://pkgs.dev.azure.com/contoso/_packaging/my-feed/nuget/v3/index.json",
            "-ApiKey",
            "VSTS",
            "-ConfigFile",
            "/agent/_temp/NuGet_77/nuget.config",
            "-Verbosity",
            "Detailed",
        ]
    );
}

#[test]
fn on_premises_server_uses_direct_cli() {
    let system = hosted_agent()
        .with_env("SYSTEM_SERVERTYPE", "OnPremises")
        .with_env("NUGET_FORCEVSTSNUGETPUSHFORPUSH", "true");

    let result = run_with_system(
        args(&["--search-pattern", "out/a.nupkg", "--feed", "my-feed"]),
        &system,
    );

    assert!(result.is_success());
    assert_eq!(system.invocations()[0].invocation.program, PathBuf::from("/tools/nuget"));
}

#[test]
fn forced_bundled_tool_on_hosted_internal_feed() {
    let system = hosted_agent().with_env("NUGET_FORCEVSTSNUGETPUSHFORPUSH", "true");

    let result = run_with_system(
        args(&["--search-pattern", "out/a.nupkg", "--feed", "my-feed"]),
        &system,
    );

    assert!(result.is_success());
    assert_eq!(
        system.invocations()[0].invocation.program,
        PathBuf::from("/tools/VstsNuGetPush")
    );
}

#[test]
fn missing_bundled_tool_falls_back_to_nuget() {
    let system = MockSystem::new()
        .with_current_dir("/work")
        .with_env("BUILD_BUILDID", "77")
        .with_env("SYSTEM_TEAMFOUNDATIONCOLLECTIONURI", "https://dev.azure.com/contoso/")
        .with_env("SYSTEM_ACCESSTOKEN", "system-token")
        .with_env("SYSTEM_SERVERTYPE", "Hosted")
        .with_file("/work/out/a.nupkg", b"a")
        .with_tool("nuget", "/tools/nuget");

    let result = run_with_system(
        args(&["--search-pattern", "out/a.nupkg", "--feed", "my-feed"]),
        &system,
    );

    assert!(result.is_success());
    let invocations = system.invocations();
    assert_eq!(invocations[0].invocation.program, PathBuf::from("/tools/nuget"));
    assert_eq!(invocations[0].invocation.cwd, Some(PathBuf::from("/tmp/NuGet_77")));
}

#[test]
fn external_api_key_with_dotnet() {
    let system = hosted_agent().with_tool("dotnet", "/usr/bin/dotnet");

    let result = run_with_system(
        args(&[
            "--search-pattern",
            "out/a.nupkg",
            "--feed-type",
            "external",
            "--external-endpoint",
            "nuget.org=https://api.nuget.org/v3/index.json",
            "--external-api-key",
            "oy2-key",
            "--tool",
            "dotnet",
        ]),
        &system,
    );
    assert!(result.is_success());

    let invocations = system.invocations();
    let recorded = &invocations[0];
    assert_eq!(recorded.invocation.program, PathBuf::from("/usr/bin/dotnet"));
    assert_eq!(
        recorded.invocation.args,
        vec![
            "nuget",
            "push",
            "/work/out/a.nupkg",
            "--source",
            "https://api.nuget.org/v3/index.json",
            "--api-key",
            "oy2-key",
        ]
    );
    assert_eq!(recorded.invocation.cwd, Some(PathBuf::from(TEMP_DIR)));
    assert!(recorded.nuget_config.as_ref().unwrap().contains("nuget.org"));
}

#[test]
fn external_username_password_uses_required_key() {
    let system = hosted_agent();

    let result = run_with_system(
        args(&[
            "--search-pattern",
            "out/a.nupkg",
            "--feed-type",
            "External",
            "--external-endpoint",
            "myget=https://myget.org/F/x/api/v3/index.json",
            "--external-username",
            "me",
            "--external-password",
            "hunter2",
        ]),
        &system,
    );
    assert!(result.is_success());

    let invocations = system.invocations();
    let recorded = &invocations[0];
    assert_eq!(recorded.invocation.program, PathBuf::from("/tools/nuget"));
    assert!(recorded.invocation.args.contains(&"RequiredApiKey".to_owned()));

    let config = recorded.nuget_config.as_ref().unwrap();
    assert!(config.contains("<add key=\"Username\" value=\"me\" />"));
    assert!(config.contains("<add key=\"ClearTextPassword\" value=\"hunter2\" />"));
}

#[test]
fn credential_provider_skips_config_file() {
    let system = hosted_agent()
        .with_env("NUGET_FORCENUGETFORPUSH", "true")
        .with_env("NUGET_CREDENTIALPROVIDER_FOLDER", "/cp")
        .with_dir("/cp");

    let result = run_with_system(
        args(&[
            "--search-pattern",
            "out/a.nupkg",
            "--feed",
            "my-feed",
            "--use-credential-provider",
        ]),
        &system,
    );
    assert!(result.is_success());

    let invocations = system.invocations();
    let invocation = &invocations[0].invocation;
    assert!(!invocation.args.iter().any(|a| a == "-ConfigFile"));
    assert!(invocation.cwd.is_none());
    assert!(invocation
        .env
        .contains(&("VSS_NUGET_ACCESSTOKEN".to_owned(), "system-token".to_owned())));
    assert!(!system.exists(Path::new(TEMP_DIR)).unwrap());
}

#[test]
fn dry_run_pushes_nothing() {
    let system = hosted_agent();

    let result = run_with_system(
        args(&["--search-pattern", "out/*.nupkg", "--feed", "my-feed", "--dry-run"]),
        &system,
    );

    assert!(result.is_success());
    assert_eq!(result.message, TaskMessage::DryRunCompleted { count: 3 });
    assert!(system.invocations().is_empty());
    assert!(!system.exists(Path::new(TEMP_DIR)).unwrap());
}

#[test]
fn yaml_config_is_merged_with_cli() {
    let system = hosted_agent().with_file(
        "/work/feedpush.yaml",
        br#"
searchPattern: "out/a.nupkg"
feedType: external
externalEndpoints:
  - name: private
    url: https://packages.example.com/v3/index.json
    auth:
      type: token
      token: pat-123
"#,
    );

    let result = run_with_system(args(&["--config", "/work/feedpush.yaml"]), &system);
    assert!(result.is_success());

    let invocations = system.invocations();
    let recorded = &invocations[0];
    assert!(recorded.invocation.args.contains(&"RequiredApiKey".to_owned()));
    let config = recorded.nuget_config.as_ref().unwrap();
    assert!(config.contains("CustomUsername"));
    assert!(config.contains("pat-123"));
}

}
