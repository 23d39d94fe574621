use rk_core::config::{Config, Credentials, RepositorySpec};
use rk_core::types::TargetState;

#[test]
fn default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.github.api_url, "https://api.github.com");
    assert_eq!(cfg.github.token_env, "GITHUB_TOKEN");
    assert_eq!(cfg.github.password_env, "GITHUB_PASSWORD");
    assert!(cfg.github.user.is_none());
    assert_eq!(cfg.logging.level, "info");
    assert!(!cfg.logging.json);
    assert_eq!(cfg.repository, RepositorySpec::default());
    cfg.validate().expect("default config validates");
}

#[test]
fn config_roundtrip() {
    let cfg = Config::default();
    let toml_str = cfg.to_toml().expect("serialize to toml");
    assert!(toml_str.contains("api.github.com"));

    let parsed: Config = toml::from_str(&toml_str).expect("parse toml back");
    assert_eq!(parsed.github.api_url, cfg.github.api_url);
    assert_eq!(parsed.logging.level, cfg.logging.level);
    parsed.validate().expect("config validates");
}

#[test]
fn config_partial_toml() {
    let partial = r#"
[github]
api_url = "https://ghe.example.com/api/v3"

[repository]
owner = "acme"
repository = "widgets"
state = "absent"
force = true
owner_is_organization = true
"#;
    let cfg: Config = toml::from_str(partial).expect("parse partial");
    assert_eq!(cfg.github.api_url, "https://ghe.example.com/api/v3");
    // defaults should fill in the rest
    assert_eq!(cfg.github.token_env, "GITHUB_TOKEN");
    assert_eq!(cfg.logging.level, "info");

    let desired = cfg.repository.validate().expect("repository validates");
    assert_eq!(desired.owner, "acme");
    assert_eq!(desired.target, TargetState::Absent);
    assert!(desired.force);
    assert!(desired.owner_is_organization);
    assert_eq!(desired.private, None);
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[logging]\nlevel = \"debug\"\njson = true\n\n[repository]\nowner = \"acme\"\nprivate = false\n",
    )
    .expect("write config");

    let cfg = Config::load_from(&path).expect("load");
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.json);
    assert_eq!(cfg.repository.owner.as_deref(), Some("acme"));
    assert_eq!(cfg.repository.private, Some(false));
}

#[test]
fn load_from_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Config::load_from(dir.path().join("nope.toml")).expect_err("should fail");
    assert!(err.to_string().starts_with("io:"));
}

#[test]
fn invalid_api_url_fails_validation() {
    let mut cfg = Config::default();
    cfg.github.api_url = "ftp://example.com".to_string();
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("api_url"));
}

#[test]
fn empty_log_level_fails_validation() {
    let mut cfg = Config::default();
    cfg.logging.level = "  ".to_string();
    let err = cfg.validate().expect_err("validation should fail");
    assert!(err.to_string().contains("logging.level"));
}

#[test]
fn repository_spec_defaults() {
    let spec = RepositorySpec {
        owner: Some("octocat".into()),
        repository: Some("hello".into()),
        ..Default::default()
    };
    let desired = spec.validate().expect("validates");
    assert_eq!(desired.target, TargetState::Present);
    assert!(!desired.force);
    assert!(!desired.owner_is_organization);
    assert_eq!(desired.private, None);
}

#[test]
fn repository_spec_requires_owner_and_name() {
    let err = RepositorySpec {
        repository: Some("hello".into()),
        ..Default::default()
    }
    .validate()
    .expect_err("owner missing");
    assert!(err.to_string().contains("owner"));

    let err = RepositorySpec {
        owner: Some("octocat".into()),
        repository: Some("   ".into()),
        ..Default::default()
    }
    .validate()
    .expect_err("blank repository");
    assert!(err.to_string().contains("repository"));
}

#[test]
fn repository_spec_rejects_padded_names() {
    let err = RepositorySpec {
        owner: Some("octocat".into()),
        repository: Some(" widgets".into()),
        ..Default::default()
    }
    .validate()
    .expect_err("padded repository");
    assert_eq!(
        err.to_string(),
        "validation: repository must not have leading or trailing whitespace: \" widgets\""
    );

    let err = RepositorySpec {
        owner: Some("acme\n".into()),
        repository: Some("widgets".into()),
        ..Default::default()
    }
    .validate()
    .expect_err("padded owner");
    assert!(err.to_string().contains("owner must not have"));
}

#[test]
fn credentials_token() {
    let creds = Credentials::resolve(None, Some("ghp_x".into()), None).expect("token");
    assert_eq!(creds, Credentials::Token("ghp_x".into()));
}

#[test]
fn credentials_password_needs_user() {
    let err = Credentials::resolve(None, None, Some("pw".into())).expect_err("no user");
    assert!(err.to_string().contains("user is required"));

    let creds = Credentials::resolve(Some("octocat".into()), None, Some("pw".into()))
        .expect("basic");
    assert_eq!(
        creds,
        Credentials::Basic {
            user: "octocat".into(),
            password: "pw".into()
        }
    );
}

#[test]
fn credentials_are_mutually_exclusive() {
    let err = Credentials::resolve(Some("octocat".into()), Some("t".into()), Some("p".into()))
        .expect_err("both given");
    assert!(err.to_string().contains("mutually exclusive"));
}

#[test]
fn credentials_one_is_required() {
    let err = Credentials::resolve(Some("octocat".into()), None, Some("".into()))
        .expect_err("none given");
    assert!(err.to_string().contains("one of the following is required"));
}
