use super::*;

use std::collections::HashMap;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\parish.db"),
        "sqlite://data/parish.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("   "),
        Settings::default().database_url
    );
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
        database_url = "sqlite://./parish.db"
        guide = "father-luis"
        durations = "short, standard, extended"
        track_seconds = "12"
        "#,
    );

    assert_eq!(settings.database_url, "sqlite://./parish.db");
    assert_eq!(settings.guide, "father-luis");
    assert_eq!(settings.duration, "standard");
    assert_eq!(settings.durations, vec!["short", "standard", "extended"]);
    assert_eq!(settings.track_seconds, 12);
}

#[test]
fn bare_integers_and_arrays_do_not_drop_other_file_values() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
        guide = "father-luis"
        database_url = "sqlite://./parish.db"
        track_seconds = 12
        dispatch_batch = 50
        durations = ["short", " extended "]
        "#,
    );

    assert_eq!(settings.guide, "father-luis");
    assert_eq!(settings.database_url, "sqlite://./parish.db");
    assert_eq!(settings.track_seconds, 12);
    assert_eq!(settings.dispatch_batch, 50);
    assert_eq!(settings.durations, vec!["short", "extended"]);
}

#[test]
fn negative_number_is_ignored_without_losing_the_rest() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "guide = \"sister-maria\"\ntrack_seconds = -4\n");

    assert_eq!(settings.guide, "sister-maria");
    assert_eq!(settings.track_seconds, Settings::default().track_seconds);
}

#[test]
fn unreadable_file_keeps_defaults() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "this is = = not toml");
    assert_eq!(settings, Settings::default());
}

#[test]
fn environment_overrides_file_and_app_prefix_wins() {
    let mut settings = Settings::default();
    apply_file(&mut settings, r#"database_url = "sqlite://./file.db""#);

    let env: HashMap<&str, &str> = HashMap::from([
        ("ROSARY_DATABASE_URL", "sqlite://./rosary.db"),
        ("APP__DATABASE_URL", "sqlite://./app.db"),
        ("ROSARY_DURATION", "short"),
        ("APP__DISPATCH_BATCH", "25"),
        ("APP__TRACK_SECONDS", "soon"),
    ]);
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.database_url, "sqlite://./app.db");
    assert_eq!(settings.duration, "short");
    assert_eq!(settings.dispatch_batch, 25);
    assert_eq!(settings.track_seconds, Settings::default().track_seconds);
}

#[test]
fn load_settings_reads_file_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rosary.toml");
    std::fs::write(&path, "guide = \"sister-maria\"\ndatabase_url = \"./local.db\"\n")
        .expect("write config");

    let settings = load_settings(&path);
    assert_eq!(settings.guide, "sister-maria");
    assert!(settings.database_url.starts_with("sqlite://"));
}
