use std::path::PathBuf;

use mermedit::config::{ConfigFlags, HighlightMode, load_config_flags, parse_flag_tokens};
use mermedit::diagram::{Background, ExportConfig, ThemeId};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mermeditrc");
    let content = r"
# comment
--no-images

--theme forest

--render-debug-log=render.log
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_images);
    assert_eq!(flags.theme, Some(ThemeId::Forest));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mermeditrc");
    let content = "--no-images\n--theme neutral\n--width 1024\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "mermedit".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--force-half-cell".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_images, "file flags should remain enabled");
    assert!(effective.force_half_cell, "cli flags should be applied");
    assert_eq!(effective.theme, Some(ThemeId::Dark), "cli should override theme");
    assert_eq!(effective.export_config().width, Some(1024));
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "mermedit".to_string(),
        "--highlight=dark".to_string(),
        "--background=white".to_string(),
        "--template=Gantt".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.highlight, Some(HighlightMode::Dark));
    assert_eq!(flags.background, Some(Background::White));
    assert_eq!(flags.template.as_deref(), Some("Gantt"));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        no_images: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        perf: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.no_images);
    assert!(merged.perf);
    assert!(!merged.force_half_cell);
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
    assert_eq!(flags.export_config(), ExportConfig::default());
}
