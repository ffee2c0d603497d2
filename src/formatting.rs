use std::fmt::Write as FmtWrite;
use std::io::IsTerminal;
use std::process::ExitCode;

use pagesnap_lib::{CaptureError, Disposition, SnapOutput, StrategyOutcome};

use crate::cli::OutputFormat;

/// Print the report for a finished run.
pub fn write_output(body: &SnapOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            println!("{content}");
        }
        OutputFormat::Pretty => {
            let colorize = std::io::stdout().is_terminal();
            print!("{}", format_pretty(body, colorize));
        }
    }
}

/// Render a fatal error and return the exit code for it.
pub fn render_error(err: CaptureError, format: OutputFormat) -> ExitCode {
    tracing::debug!(error = ?err, "fatal error");
    let body = SnapOutput::Error(err.to_info().into());
    match format {
        OutputFormat::Json => write_output(&body, format),
        OutputFormat::Pretty => {
            let colorize = std::io::stderr().is_terminal();
            eprint!("{}", format_pretty(&body, colorize));
        }
    }
    ExitCode::from(1)
}

/// Exit code for a run that reached the keep-or-discard decision.
pub fn exit_code_for_capture(any_succeeded: bool) -> ExitCode {
    if any_succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &SnapOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        SnapOutput::Capture(out) => {
            let result = &out.result;
            writeln!(buf, "Target: {}", result.target.normalized_url()).ok();
            for outcome in result.outcomes() {
                write_outcome(&mut buf, outcome, colorize);
            }
            match result.disposition {
                Disposition::Retained => {
                    writeln!(buf, "Saved to {}", result.session_dir.display()).ok();
                }
                Disposition::Discarded => {
                    let line = format!(
                        "No result saved; both strategies failed and {} was removed",
                        result.session_dir.display()
                    );
                    writeln!(buf, "{}", color(&line, "31", colorize)).ok();
                }
            }
        }
        SnapOutput::Error(out) => {
            writeln!(
                buf,
                "{} [{}] {}",
                color("Error", "31", colorize),
                category_label(out),
                out.error.message
            )
            .ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {remediation}").ok();
            }
        }
    }
    buf
}

fn write_outcome(buf: &mut String, outcome: &StrategyOutcome, colorize: bool) {
    let status = if outcome.succeeded() {
        color("OK  ", "32", colorize)
    } else {
        color("FAIL", "31", colorize)
    };
    writeln!(buf, "  {status} {}", outcome.strategy()).ok();
    if let Some(error) = outcome.error() {
        writeln!(buf, "       {}", error.message).ok();
    }
    for artifact in outcome.artifacts() {
        writeln!(buf, "       -> {}", artifact.path.display()).ok();
    }
}

fn category_label(out: &pagesnap_lib::ErrorOutput) -> String {
    serde_json::to_value(out.error.category)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "error".to_string())
}

/// Wrap text in ANSI color codes if colorize is enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesnap_lib::{
        normalize, ArtifactKind, ArtifactPath, CaptureResult, StrategyName, StrategyOutcome,
    };
    use std::path::PathBuf;
    use std::time::Duration;

    fn result(disposition: Disposition, static_ok: bool) -> CaptureResult {
        let dir = PathBuf::from("outputs/2024-03-09_14-05-07_example_com");
        let static_outcome = if static_ok {
            StrategyOutcome::success(
                StrategyName::Static,
                [ArtifactPath {
                    kind: ArtifactKind::StaticHtml,
                    path: dir.join("2024-03-09_14-05-07_example_com_static.html"),
                }],
            )
        } else {
            StrategyOutcome::failure(
                StrategyName::Static,
                &CaptureError::Render("unused".into()),
                [],
            )
        };
        CaptureResult {
            target: normalize("example.com").unwrap(),
            session_dir: dir,
            static_outcome,
            rendered_outcome: StrategyOutcome::failure(
                StrategyName::Rendered,
                &CaptureError::Timeout(Duration::from_secs(120)),
                [],
            ),
            disposition,
        }
    }

    #[test]
    fn pretty_lists_each_strategy_and_saved_location() {
        let body = SnapOutput::Capture(result(Disposition::Retained, true).into());
        let text = format_pretty(&body, false);

        assert!(text.contains("Target: https://example.com"));
        assert!(text.contains("OK   static"));
        assert!(text.contains("FAIL rendered"));
        assert!(text.contains("_static.html"));
        assert!(text.contains("Saved to outputs/2024-03-09_14-05-07_example_com"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn pretty_states_nothing_was_saved_when_discarded() {
        let body = SnapOutput::Capture(result(Disposition::Discarded, false).into());
        let text = format_pretty(&body, false);
        assert!(text.contains("No result saved"));
        assert!(text.contains("was removed"));
    }

    #[test]
    fn pretty_error_includes_category_and_hint() {
        let info = CaptureError::invalid_url("http://", "URL has no host").to_info();
        let text = format_pretty(&SnapOutput::Error(info.into()), false);
        assert!(text.starts_with("Error [config]"));
        assert!(text.contains("Hint: "));
    }

    #[test]
    fn colorize_wraps_status() {
        let body = SnapOutput::Capture(result(Disposition::Retained, true).into());
        assert!(format_pretty(&body, true).contains("\x1b[32m"));
    }
}
