use std::path::PathBuf;

use nuscan_core::config::{
    InspectionSettings, SettingsFile, SettingsOverrides, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS,
};

#[test]
fn defaults_when_nothing_is_set() {
    let settings = InspectionSettings::merge(
        PathBuf::from("app.sln"),
        SettingsFile::default(),
        SettingsOverrides::default(),
    );
    assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    assert!(settings.registry_urls.is_empty());
    assert!(!settings.ignore_failure);
    assert_eq!(settings.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
}

#[test]
fn settings_file_beats_defaults() {
    let file: SettingsFile = toml::from_str(
        r#"
output-dir = "out"
registry-urls = ["https://nuget.example.com/v3"]
ignore-failure = true
request-timeout-secs = 5
"#,
    )
    .unwrap();

    let settings = InspectionSettings::merge(
        PathBuf::from("app.sln"),
        file,
        SettingsOverrides::default(),
    );
    assert_eq!(settings.output_dir, PathBuf::from("out"));
    assert_eq!(settings.registry_urls.len(), 1);
    assert!(settings.ignore_failure);
    assert_eq!(settings.request_timeout_secs, 5);
}

#[test]
fn cli_beats_settings_file() {
    let file: SettingsFile = toml::from_str(r#"output-dir = "from-file""#).unwrap();
    let cli = SettingsOverrides {
        output_dir: Some(PathBuf::from("from-cli")),
        ignore_failure: Some(true),
        ..Default::default()
    };

    let settings = InspectionSettings::merge(PathBuf::from("app.sln"), file, cli);
    assert_eq!(settings.output_dir, PathBuf::from("from-cli"));
    assert!(settings.ignore_failure);
}

#[test]
fn missing_settings_file_is_defaults() {
    let loaded = SettingsFile::load(std::path::Path::new("/definitely/not/here.toml")).unwrap();
    assert!(loaded.output_dir.is_none());
}

#[test]
fn split_list_trims_and_drops_empties() {
    let urls = InspectionSettings::split_list("https://a/v3, https://b/v3 ,,");
    assert_eq!(urls, vec!["https://a/v3", "https://b/v3"]);
}
