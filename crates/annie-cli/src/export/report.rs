//! External report generator.
//!
//! The generator finds its inputs by the `Reviews *.csv` / `Numbers *.csv`
//! naming convention, so it runs with the output directory as its working
//! directory and no arguments about which files were written.

use std::path::Path;

use tokio::process::Command;

pub(crate) const REPORT_PROGRAM: &str = "R";
pub(crate) const REPORT_ARGS: [&str; 4] = ["--vanilla", "--slave", "-f", "appannie.R"];

/// Runs the report generator and waits for it. The exit status is logged
/// and otherwise ignored; a failure to start is a warning, not an error.
pub(crate) async fn run_report_generator(working_dir: &Path) {
    run_program(REPORT_PROGRAM, &REPORT_ARGS, working_dir).await;
}

async fn run_program(program: &str, args: &[&str], working_dir: &Path) {
    tracing::info!(program, ?args, dir = %working_dir.display(), "running report generator");

    match Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .status()
        .await
    {
        Ok(status) => tracing::debug!(%status, "report generator exited"),
        Err(e) => tracing::warn!(program, error = %e, "failed to start report generator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_program("annie-report-generator-that-does-not-exist", &[], dir.path()).await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_exit_status_is_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_program("false", &[], dir.path()).await;
    }

    #[test]
    fn command_line_is_fixed() {
        assert_eq!(REPORT_PROGRAM, "R");
        assert_eq!(REPORT_ARGS, ["--vanilla", "--slave", "-f", "appannie.R"]);
    }
}
