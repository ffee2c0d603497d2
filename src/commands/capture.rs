use std::process::ExitCode;

use pagesnap_lib::{Capturer, SnapOutput};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::formatting::{exit_code_for_capture, render_error, write_output};
use crate::settings::resolve_config;

pub async fn run_capture(cli: Cli) -> ExitCode {
    let format = cli.format;

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => return render_error(err, format),
    };
    if cli.verbose {
        tracing::debug!(?config, "resolved configuration");
    }

    let mut capturer = match Capturer::from_config(&config) {
        Ok(capturer) => capturer,
        Err(err) => return render_error(err, format),
    };

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping capture");
                cancel.cancel();
            }
        })
    };

    let outcome = capturer.capture_until(&cli.target, cancel).await;
    interrupt.abort();

    match outcome {
        Ok(result) => {
            let any_succeeded = result.any_succeeded();
            write_output(&SnapOutput::Capture(result.into()), format);
            exit_code_for_capture(any_succeeded)
        }
        Err(err) => render_error(err, format),
    }
}
