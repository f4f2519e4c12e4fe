//! Ordered composite-chain execution.
//!
//! A chain runs its steps strictly in order, piping the output artifact of
//! each step into the next through a temp directory scoped to one
//! invocation. The directory is removed on every exit path; files already
//! written to the final output location are not rolled back (chain
//! execution is not transactional).

use std::path::{Path, PathBuf};

use matiz_config::{ChainStep, EffectsConfig};

use crate::executor::{CommandExecutor, ExecutionResult};
use crate::resolver::resolve_params;

/// Execute an ordered chain of steps from `input` to `output`.
///
/// Failure semantics:
/// - empty chain → error result, no process spawned;
/// - unknown step effect → error result naming it, previously completed
///   steps keep whatever they wrote;
/// - step failure → error result naming the 1-based step index and effect,
///   carrying the underlying stderr and the duration accumulated so far.
///
/// On success the result's `command` is a synthetic description of the
/// chain (not an executable string) and `duration` sums all step durations.
pub fn execute_chain(
    catalog: &EffectsConfig,
    executor: &CommandExecutor,
    chain: &[ChainStep],
    input: &Path,
    output: &Path,
) -> ExecutionResult {
    let description = chain_description(chain, input, output);
    if chain.is_empty() {
        return ExecutionResult::failure(description, "empty chain: nothing to execute");
    }

    let workdir = match tempfile::TempDir::new() {
        Ok(dir) => dir,
        Err(e) => {
            return ExecutionResult::failure(
                description,
                format!("failed to create chain workspace: {e}"),
            );
        }
    };

    // intermediates keep the output suffix so the image tool infers the
    // same format at every step
    let extension = output
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");

    let total = chain.len();
    let mut current_input: PathBuf = input.to_path_buf();
    let mut total_duration = 0.0_f64;
    let mut last_stdout = String::new();

    for (index, step) in chain.iter().enumerate() {
        let step_number = index + 1;
        let Some(effect) = catalog.effect(&step.effect) else {
            return ExecutionResult {
                success: false,
                command: description,
                stdout: String::new(),
                stderr: format!(
                    "step {step_number}/{total} references unknown effect '{}'",
                    step.effect
                ),
                return_code: -1,
                duration: total_duration,
            };
        };

        let step_output = if step_number == total {
            output.to_path_buf()
        } else {
            workdir.path().join(format!("step-{step_number}.{extension}"))
        };

        tracing::debug!(
            "chain step {step_number}/{total}: {} ({} -> {})",
            step.effect,
            current_input.display(),
            step_output.display()
        );

        let params = resolve_params(catalog, &step.effect, &step.params);
        let result = executor.execute(&effect.command, &current_input, &step_output, &params);
        total_duration += result.duration;

        if !result.success {
            return ExecutionResult {
                success: false,
                command: result.command,
                stdout: result.stdout,
                stderr: format!(
                    "step {step_number}/{total} ({}) failed: {}",
                    step.effect, result.stderr
                ),
                return_code: result.return_code,
                duration: total_duration,
            };
        }

        last_stdout = result.stdout;
        current_input = step_output;
    }

    ExecutionResult {
        success: true,
        command: description,
        stdout: last_stdout,
        stderr: String::new(),
        return_code: 0,
        duration: total_duration,
    }
}

/// Human-readable synthetic description of a chain invocation.
fn chain_description(chain: &[ChainStep], input: &Path, output: &Path) -> String {
    let steps: Vec<&str> = chain.iter().map(|step| step.effect.as_str()).collect();
    format!(
        "chain({}): {} -> {}",
        steps.join(" | "),
        input.display(),
        output.display()
    )
}
