//! Command substitution and external-process execution.
//!
//! An effect command is a template string with `$INPUT`, `$OUTPUT`, and
//! upper-cased parameter placeholders. The executor substitutes resolved
//! values into the template and runs the result as one shell-interpreted
//! command, folding every failure mode into an [`ExecutionResult`]. It
//! never raises across the caller boundary.

use serde_json::Value;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use matiz_config::ParamMap;

use crate::container::ContainerRelay;

/// Outcome of one external-process invocation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the process exited with code 0.
    pub success: bool,
    /// The fully substituted string actually run (or a synthetic
    /// description for chain results).
    pub command: String,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, or the failure explanation.
    pub stderr: String,
    /// Process exit code; -1 is reserved for failures outside the child
    /// process (launch errors, structural errors).
    pub return_code: i32,
    /// Elapsed wall-clock seconds, 0 when not measured.
    pub duration: f64,
}

impl ExecutionResult {
    /// A failure that never reached a child process.
    pub fn failure(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            command: command.into(),
            stdout: String::new(),
            stderr: message.into(),
            return_code: -1,
            duration: 0.0,
        }
    }
}

/// Stringify a parameter value for substitution.
///
/// Strings substitute bare (no quotes); numbers and booleans use their
/// canonical text form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute `$INPUT`, `$OUTPUT`, and upper-cased parameter placeholders
/// into a command template.
///
/// For each key the quoted form `"$KEY"` is replaced before the bare form
/// `$KEY`, so a value containing `$` cannot be re-substituted. Keys are
/// applied longest-first; a key never clobbers a longer key it prefixes,
/// and the order is deterministic for a given params map.
pub fn substitute(template: &str, input: &Path, output: &Path, params: &ParamMap) -> String {
    let mut entries: Vec<(String, String)> = vec![
        ("INPUT".to_string(), input.display().to_string()),
        ("OUTPUT".to_string(), output.display().to_string()),
    ];
    for (name, value) in params {
        entries.push((name.to_uppercase(), stringify(value)));
    }
    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    let mut command = template.to_string();
    for (key, value) in &entries {
        command = command.replace(&format!("\"${key}\""), &format!("\"{value}\""));
        command = command.replace(&format!("${key}"), value);
    }
    command
}

/// Runs substituted effect commands, optionally relayed through a
/// container engine.
#[derive(Debug, Default)]
pub struct CommandExecutor {
    relay: Option<ContainerRelay>,
}

impl CommandExecutor {
    /// An executor that runs commands directly on the host.
    pub fn new() -> Self {
        Self { relay: None }
    }

    /// An executor that re-expresses every command through a container
    /// relay before running it.
    pub fn with_relay(relay: ContainerRelay) -> Self {
        Self { relay: Some(relay) }
    }

    /// Substitute `params` into `template` and run the result.
    ///
    /// The output path's parent directory is created first. Launch
    /// failures (missing shell, OS errors) are captured as a result with
    /// `return_code == -1`; this method never returns an error.
    pub fn execute(
        &self,
        template: &str,
        input: &Path,
        output: &Path,
        params: &ParamMap,
    ) -> ExecutionResult {
        let substituted = substitute(template, input, output, params);
        let command = match &self.relay {
            Some(relay) => relay.relay(&substituted, input, output),
            None => substituted,
        };

        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            return ExecutionResult::failure(
                command,
                format!("failed to create output directory '{}': {e}", parent.display()),
            );
        }

        tracing::debug!("exec: {command}");
        let start = Instant::now();
        match Command::new("sh").arg("-c").arg(&command).output() {
            Ok(output) => {
                let duration = start.elapsed().as_secs_f64();
                ExecutionResult {
                    success: output.status.success(),
                    command,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    return_code: output.status.code().unwrap_or(-1),
                    duration,
                }
            }
            Err(e) => ExecutionResult {
                success: false,
                command,
                stdout: String::new(),
                stderr: e.to_string(),
                return_code: -1,
                duration: start.elapsed().as_secs_f64(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn params(pairs: &[(&str, Value)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn substitutes_input_output_and_params() {
        let command = substitute(
            "magick \"$INPUT\" -blur \"$BLUR\" \"$OUTPUT\"",
            Path::new("/wall/in.png"),
            Path::new("/wall/out.png"),
            &params(&[("blur", json!("0x5"))]),
        );
        assert_eq!(command, "magick \"/wall/in.png\" -blur \"0x5\" \"/wall/out.png\"");
        assert!(!command.contains("$BLUR"));
    }

    #[test]
    fn numbers_and_booleans_substitute_bare() {
        let command = substitute(
            "magick \"$INPUT\" -modulate $BRIGHTNESS -flag $ON \"$OUTPUT\"",
            Path::new("in"),
            Path::new("out"),
            &params(&[("brightness", json!(80)), ("on", json!(true))]),
        );
        assert!(command.contains("-modulate 80"));
        assert!(command.contains("-flag true"));
    }

    #[test]
    fn quoted_form_replaced_before_bare_form() {
        // a value containing '$' must not be re-substituted
        let command = substitute(
            "convert \"$LABEL\" $LABEL",
            Path::new("in"),
            Path::new("out"),
            &params(&[("label", json!("$5 bill"))]),
        );
        assert_eq!(command, "convert \"$5 bill\" $5 bill");
    }

    #[test]
    fn longer_keys_substitute_before_their_prefixes() {
        let command = substitute(
            "x $BLUR_RADIUS $BLUR",
            Path::new("in"),
            Path::new("out"),
            &params(&[("blur", json!("A")), ("blur_radius", json!("B"))]),
        );
        assert_eq!(command, "x B A");
    }

    #[test]
    fn execute_captures_stdout_and_exit_code() {
        let executor = CommandExecutor::new();
        let result = executor.execute(
            "printf 'hello from $INPUT'",
            Path::new("in.png"),
            Path::new("out.png"),
            &ParamMap::new(),
        );
        assert!(result.success);
        assert_eq!(result.return_code, 0);
        assert_eq!(result.stdout, "hello from in.png");
        assert!(result.duration >= 0.0);
    }

    #[test]
    fn execute_reports_nonzero_exit() {
        let executor = CommandExecutor::new();
        let result = executor.execute(
            "exit 3",
            Path::new("in.png"),
            Path::new("out.png"),
            &ParamMap::new(),
        );
        assert!(!result.success);
        assert_eq!(result.return_code, 3);
    }

    #[test]
    fn execute_captures_stderr_of_missing_binary() {
        let executor = CommandExecutor::new();
        let result = executor.execute(
            "definitely_not_a_real_binary_xyz \"$INPUT\"",
            Path::new("in.png"),
            Path::new("out.png"),
            &ParamMap::new(),
        );
        assert!(!result.success);
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn execute_creates_output_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "pixels").unwrap();
        let output = dir.path().join("a/b/c/out.txt");

        let executor = CommandExecutor::new();
        let result = executor.execute("cp \"$INPUT\" \"$OUTPUT\"", &input, &output, &ParamMap::new());

        assert!(result.success, "stderr: {}", result.stderr);
        assert!(output.is_file());
    }

    #[test]
    fn failure_constructor_reserves_minus_one() {
        let result = ExecutionResult::failure("cmd", "boom");
        assert!(!result.success);
        assert_eq!(result.return_code, -1);
        assert_eq!(result.stderr, "boom");
        assert_eq!(result.duration, 0.0);
    }

    #[test]
    fn substitution_is_deterministic() {
        let p = params(&[("a", json!("1")), ("b", json!("2")), ("c", json!("3"))]);
        let first = substitute("$A $B $C", Path::new("i"), Path::new("o"), &p);
        let second = substitute("$A $B $C", Path::new("i"), Path::new("o"), &p);
        assert_eq!(first, second);
        assert_eq!(first, "1 2 3");
    }

    #[test]
    fn relative_output_without_parent_is_accepted() {
        let executor = CommandExecutor::new();
        let result = executor.execute("true", Path::new("in"), &PathBuf::from("out.png"), &ParamMap::new());
        assert!(result.success);
    }
}
