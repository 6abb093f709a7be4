use super::*;
use pretty_assertions::assert_eq;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hyrank-cli-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_flag_wins_over_env() {
    let src = resolve_source(
        Some(Path::new("/tmp/explicit.toml")),
        Some("/tmp/from_env.toml".into()),
        Path::new("/nonexistent"),
    );
    assert_eq!(src, ConfigSource::Flag(PathBuf::from("/tmp/explicit.toml")));
}

#[test]
fn test_env_used_when_no_flag() {
    let src = resolve_source(None, Some("/tmp/from_env.yaml".into()), Path::new("/nonexistent"));
    assert_eq!(src, ConfigSource::Env(PathBuf::from("/tmp/from_env.yaml")));
}

#[test]
fn test_blank_env_ignored() {
    let src = resolve_source(None, Some("  ".into()), Path::new("/nonexistent"));
    assert_eq!(src, ConfigSource::Defaults);
}

#[test]
fn test_working_dir_file_picked_up() {
    let dir = scratch_dir("cwd");
    let file = dir.join(DEFAULT_CONFIG_FILE);
    std::fs::write(&file, "[selection]\ntop_k = 5\n").unwrap();

    assert_eq!(resolve_source(None, None, &dir), ConfigSource::WorkingDir(file.clone()));
    let parsed = RankingConfig::load(&file).unwrap();
    assert_eq!(parsed.selection.top_k, 5);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_rendered_defaults_parse_back() {
    let config = RankingConfig::default();

    let toml_text = render(&config, ConfigFormat::Toml).unwrap();
    let from_toml: RankingConfig = toml::from_str(&toml_text).unwrap();
    assert!(from_toml.validate().is_ok());
    assert_eq!(from_toml.composites.len(), 2);
    assert_eq!(from_toml.composites, config.composites);

    let yaml_text = render(&config, ConfigFormat::Yaml).unwrap();
    let from_yaml: RankingConfig = serde_yaml::from_str(&yaml_text).unwrap();
    assert_eq!(from_yaml.selection.top_k, config.selection.top_k);
    assert_eq!(from_yaml.composites, config.composites);
}

#[test]
fn test_missing_explicit_path_is_an_error() {
    let err = load(Some(Path::new("/nonexistent/hyrank.toml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}
