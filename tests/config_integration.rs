use std::path::PathBuf;

use mathpad::config::{ConfigFlags, ThemeMode, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mathpadrc");
    let content = r"
# comment
--no-preview

--theme light

--render-debug-log=render.log
--engine npx tex2svg --inline
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.no_preview);
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.render_debug_log, Some(PathBuf::from("render.log")));
    assert_eq!(flags.engine.as_deref(), Some("npx tex2svg --inline"));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mathpadrc");
    let content = "--no-preview\n--theme light\n--debounce-ms 800\n--render-debug-log file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "mathpad".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--debounce-ms".to_string(),
        "200".to_string(),
        "--force-half-cell".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_preview, "file flags should remain enabled");
    assert!(effective.force_half_cell, "cli flags should be applied");
    assert_eq!(effective.theme, Some(ThemeMode::Dark), "cli should override theme");
    assert_eq!(effective.debounce_ms, Some(200));
    assert_eq!(
        effective.render_debug_log,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "mathpad".to_string(),
        "--theme=dark".to_string(),
        "--example=Euler".to_string(),
        "--export-dir=out/formulas".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.theme, Some(ThemeMode::Dark));
    assert_eq!(flags.example.as_deref(), Some("Euler"));
    assert_eq!(flags.export_dir, Some(PathBuf::from("out/formulas")));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        no_preview: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        perf: true,
        force_half_cell: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.no_preview);
    assert!(merged.perf);
    assert!(merged.force_half_cell);
}
