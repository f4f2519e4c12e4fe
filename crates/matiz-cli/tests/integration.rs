//! Integration tests for matiz-cli.
//!
//! Tests cover binary invocation, catalog listing, dry runs, and
//! end-to-end apply/batch flows against shell-backed effects defined in a
//! project layer. Every invocation gets an isolated HOME so real user
//! config never leaks in.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to get the `matiz` binary with an isolated home and cwd.
fn matiz_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_matiz"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .current_dir(home);
    cmd
}

/// Write a project layer with shell-backed test effects into `home`.
fn write_project_layer(home: &Path) {
    fs::write(
        home.join("matiz.toml"),
        r#"
[effects.effects.passthrough]
description = "Copy bytes through"
command = 'cp "$INPUT" "$OUTPUT"'

[effects.effects.broken]
description = "Always fails"
command = 'echo no dice >&2; exit 2'
"#,
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// CLI binary tests -- help and version
// ---------------------------------------------------------------------------

#[test]
fn cli_help_works() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .arg("--help")
        .output()
        .expect("failed to run matiz --help");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Matiz wallpaper effects CLI"));
    for subcommand in ["apply", "batch", "effects", "presets"] {
        assert!(stdout.contains(subcommand), "help should list '{subcommand}'");
    }
}

#[test]
fn cli_version_works() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .arg("--version")
        .output()
        .expect("failed to run matiz --version");

    assert!(output.status.success());
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `matiz effects`
// ---------------------------------------------------------------------------

#[test]
fn cli_effects_lists_bundled_catalog() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .arg("effects")
        .output()
        .expect("failed to run matiz effects");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Available Effects"));
    for effect in ["blur", "brightness", "grayscale", "sepia", "vignette", "dim"] {
        assert!(stdout.contains(effect), "listing should contain '{effect}'");
    }
}

#[test]
fn cli_effects_detail_shows_parameters() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args(["effects", "blur"])
        .output()
        .expect("failed to run matiz effects blur");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Parameters"));
    assert!(stdout.contains("blur_geometry"));
    assert!(stdout.contains("0x8"), "type default should show");
    assert!(stdout.contains("$BLUR"), "command template should show");
}

#[test]
fn cli_effects_unknown_effect_fails() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args(["effects", "nonexistent_effect_xyz"])
        .output()
        .expect("failed to run matiz");

    assert!(!output.status.success(), "should fail for unknown effect");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown effect") || stderr.contains("nonexistent_effect_xyz"),
        "error should mention unknown effect, got: {stderr}"
    );
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `matiz presets`
// ---------------------------------------------------------------------------

#[test]
fn cli_presets_lists_presets_and_composites() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .arg("presets")
        .output()
        .expect("failed to run matiz presets");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Presets:"));
    assert!(stdout.contains("Composites:"));
    assert!(stdout.contains("lockscreen"));
    assert!(stdout.contains("vintage"));
}

#[test]
fn cli_presets_detail_shows_chain_steps() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args(["presets", "lockscreen_soft"])
        .output()
        .expect("failed to run matiz presets lockscreen_soft");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Chain:"));
    assert!(stdout.contains("1. dim"));
    assert!(stdout.contains("2. blur"));
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `matiz apply`
// ---------------------------------------------------------------------------

#[test]
fn cli_apply_dry_run_prints_substituted_command() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args(["apply", "wall.png", "out.png", "--effect", "blur", "--dry-run"])
        .output()
        .expect("failed to run matiz apply --dry-run");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-blur"));
    assert!(stdout.contains("0x8"), "type default should substitute");
    assert!(!stdout.contains("$BLUR"), "no placeholder may remain");
}

#[test]
fn cli_apply_dry_run_honors_set_overrides() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args([
            "apply",
            "wall.png",
            "out.png",
            "--effect",
            "blur",
            "--dry-run",
            "--set",
            "effects.effects.blur.parameters.blur.default=0x99",
        ])
        .output()
        .expect("failed to run matiz apply --set");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0x99"), "got: {stdout}");
}

#[test]
fn cli_apply_dry_run_composite_prints_numbered_plan() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args([
            "apply",
            "wall.png",
            "out.png",
            "--composite",
            "lockscreen_soft",
            "--dry-run",
        ])
        .output()
        .expect("failed to run matiz apply --composite --dry-run");

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1. "));
    assert!(stdout.contains("2. "));
    assert!(stdout.contains("<tmp>/step-1.png"), "got: {stdout}");
}

#[test]
fn cli_apply_executes_project_effect() {
    let home = TempDir::new().unwrap();
    write_project_layer(home.path());
    fs::write(home.path().join("wall.png"), "pretend pixels").unwrap();

    let output = matiz_bin(home.path())
        .args(["apply", "wall.png", "out.png", "--effect", "passthrough"])
        .output()
        .expect("failed to run matiz apply");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        fs::read(home.path().join("out.png")).unwrap(),
        b"pretend pixels"
    );
}

#[test]
fn cli_apply_failure_exits_nonzero_with_stderr() {
    let home = TempDir::new().unwrap();
    write_project_layer(home.path());
    fs::write(home.path().join("wall.png"), "pretend pixels").unwrap();

    let output = matiz_bin(home.path())
        .args(["apply", "wall.png", "out.png", "--effect", "broken"])
        .output()
        .expect("failed to run matiz apply");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no dice"), "got: {stderr}");
}

#[test]
fn cli_apply_requires_exactly_one_selection() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args(["apply", "wall.png", "out.png"])
        .output()
        .expect("failed to run matiz apply");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exactly one"), "got: {stderr}");
}

#[test]
fn cli_apply_rejects_invalid_parameter_value() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args([
            "apply",
            "wall.png",
            "out.png",
            "--effect",
            "blur",
            "--param",
            "blur=sideways",
            "--dry-run",
        ])
        .output()
        .expect("failed to run matiz apply");

    assert!(!output.status.success(), "pattern mismatch should fail fast");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pattern"), "got: {stderr}");
}

// ---------------------------------------------------------------------------
// CLI binary tests -- `matiz batch`
// ---------------------------------------------------------------------------

#[test]
fn cli_batch_applies_items_under_output_dir() {
    let home = TempDir::new().unwrap();
    write_project_layer(home.path());
    fs::write(home.path().join("wall.png"), "pretend pixels").unwrap();

    let output = matiz_bin(home.path())
        .args(["batch", "wall.png", "shots", "--effect", "passthrough"])
        .output()
        .expect("failed to run matiz batch");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 succeeded, 0 failed"), "got: {stdout}");
    assert!(home
        .path()
        .join("shots/wall/effects/passthrough.png")
        .is_file());
}

#[test]
fn cli_batch_flat_layout_drops_kind_subdir() {
    let home = TempDir::new().unwrap();
    write_project_layer(home.path());
    fs::write(home.path().join("wall.png"), "pretend pixels").unwrap();

    let output = matiz_bin(home.path())
        .args(["batch", "wall.png", "shots", "--effect", "passthrough", "--flat"])
        .output()
        .expect("failed to run matiz batch --flat");

    assert!(output.status.success());
    assert!(home.path().join("shots/wall/passthrough.png").is_file());
}

#[test]
fn cli_batch_reports_failures_and_exits_nonzero() {
    let home = TempDir::new().unwrap();
    write_project_layer(home.path());
    fs::write(home.path().join("wall.png"), "pretend pixels").unwrap();

    let output = matiz_bin(home.path())
        .args([
            "batch",
            "wall.png",
            "shots",
            "--effect",
            "passthrough",
            "--effect",
            "broken",
        ])
        .output()
        .expect("failed to run matiz batch");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 succeeded, 1 failed"), "got: {stdout}");
    assert!(stdout.contains("broken:"), "failures are itemized: {stdout}");
}

#[test]
fn cli_batch_without_items_fails_fast() {
    let home = TempDir::new().unwrap();
    let output = matiz_bin(home.path())
        .args(["batch", "wall.png", "shots"])
        .output()
        .expect("failed to run matiz batch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Nothing to run"), "got: {stderr}");
}

// ---------------------------------------------------------------------------
// CLI binary tests -- container dry paths
// ---------------------------------------------------------------------------

#[test]
fn cli_apply_explicit_config_flag_loads_layer() {
    let home = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("custom.toml");
    fs::write(
        &config,
        r#"
[effects.effects.echo_note]
description = "Echo a note"
command = "printf '%s' \"$NOTE\" > \"$OUTPUT\""
[effects.effects.echo_note.parameters.note]
type = "string"
default = "from custom config"
"#,
    )
    .unwrap();
    fs::write(home.path().join("wall.png"), "pretend pixels").unwrap();

    let output = matiz_bin(home.path())
        .args(["apply", "wall.png", "out.png", "--effect", "echo_note"])
        .arg("--config")
        .arg(&config)
        .output()
        .expect("failed to run matiz apply --config");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(
        fs::read_to_string(home.path().join("out.png")).unwrap(),
        "from custom config"
    );
}
