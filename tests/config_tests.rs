//! Configuration parsing and validation tests

use feedpush::auth::ExternalAuthKind;
use feedpush::config::{Config, PushTool};
use feedpush::system::RealSystem;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_valid_full_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("feedpush.yaml");

    let config_content = r#"
searchPattern: |
  **/*.nupkg
  !**/*.symbols.nupkg
feedType: External
verbosity: Normal
allowPackageConflicts: true
tool: dotnet
externalEndpoints:
  - name: nuget.org
    url: https://api.nuget.org/v3/index.json
    auth:
      type: apiKey
      apiKey: oy2-secret
"#;

    fs::write(&config_path, config_content).unwrap();

    let system = RealSystem::new();
    let config = Config::load_from_file(&system, config_path.to_str().unwrap()).unwrap();

    assert_eq!(config.feed_type.as_deref(), Some("External"));
    assert_eq!(config.tool, PushTool::Dotnet);
    assert!(config.allow_package_conflicts);
    assert_eq!(config.external_endpoints.len(), 1);
    assert_eq!(
        config.external_endpoints[0].auth,
        ExternalAuthKind::ApiKey {
            api_key: "oy2-secret".to_owned()
        }
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_unknown_key_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("feedpush.yaml");
    fs::write(&config_path, "searchPattern: '*.nupkg'\nrepository: nope\n").unwrap();

    let system = RealSystem::new();
    let err = Config::load_from_file(&system, config_path.to_str().unwrap()).unwrap_err();
    assert!(format!("{err:#}").contains("Configuration validation failed"));
}

#[test]
fn test_invalid_endpoint_url_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("feedpush.yaml");
    fs::write(
        &config_path,
        "searchPattern: '*.nupkg'\nexternalEndpoints:\n  - name: bad\n    url: not a url\n",
    )
    .unwrap();

    let system = RealSystem::new();
    let config = Config::load_from_file(&system, config_path.to_str().unwrap()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_auth_kind_parses() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("feedpush.yaml");
    fs::write(
        &config_path,
        "searchPattern: '*.nupkg'\nexternalEndpoints:\n  - name: odd\n    url: https://odd.example/\n    auth:\n      type: kerberos\n",
    )
    .unwrap();

    let system = RealSystem::new();
    let config = Config::load_from_file(&system, config_path.to_str().unwrap()).unwrap();
    assert_eq!(config.external_endpoints[0].auth, ExternalAuthKind::Unknown);
}
