//! `tabveil purge`, `tabveil professional`, `tabveil undo`.

use crate::cli::output::{self, Styled};
use crate::cli::{build_engine, tabs_cmd};
use crate::config::Config;
use crate::engine::{ApplyReport, Mode, UndoReport};
use anyhow::Result;

/// Disguise every eligible tab.
pub async fn run_apply(config: &Config, mode: Mode) -> Result<()> {
    let engine = build_engine(config).await?;
    let report = engine.apply_mode(mode).await?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "mode": mode,
            "report": report,
        }));
    } else if !output::is_quiet() {
        print_apply(&Styled::new(), mode, &report);
        if config.simulate {
            tabs_cmd::print_tabs(engine.host().as_ref()).await?;
        }
    }
    Ok(())
}

/// Restore tabs from the snapshot.
pub async fn run_undo(config: &Config) -> Result<()> {
    let engine = build_engine(config).await?;
    let report = engine.undo().await?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "report": report }));
    } else if !output::is_quiet() {
        print_undo(&Styled::new(), &report);
        if config.simulate {
            tabs_cmd::print_tabs(engine.host().as_ref()).await?;
        }
    }
    Ok(())
}

fn print_apply(s: &Styled, mode: Mode, report: &ApplyReport) {
    if report.snapshot_captured {
        eprintln!(
            "  {} Saved original details of {} tab(s).",
            s.info_sym(),
            report.captured
        );
    }
    if let Some(reason) = &report.aborted {
        eprintln!("  {} {mode} not applied: {reason}.", s.warn_sym());
        return;
    }
    let sym = outcome_sym(s, report.succeeded, report.failed);
    eprintln!(
        "  {sym} {mode}: {} of {} tab(s) disguised{}{}.",
        report.succeeded,
        report.targeted,
        counted(report.skipped, "skipped"),
        counted(report.failed, "failed"),
    );
}

fn print_undo(s: &Styled, report: &UndoReport) {
    if report.entries == 0 {
        eprintln!("  {} Nothing to restore.", s.info_sym());
        return;
    }
    let sym = outcome_sym(s, report.restored, report.failed);
    eprintln!(
        "  {sym} Restored {} of {} tab(s){}{}{}.",
        report.restored,
        report.entries,
        counted(report.missing, "closed"),
        counted(report.failed, "failed"),
        counted(report.invalid, "invalid"),
    );
}

/// OK when nothing failed, a failure mark when nothing worked.
fn outcome_sym(s: &Styled, done: usize, failed: usize) -> &str {
    match (done, failed) {
        (_, 0) => s.ok_sym(),
        (0, _) => s.fail_sym(),
        _ => s.warn_sym(),
    }
}

fn counted(n: usize, what: &str) -> String {
    if n == 0 {
        String::new()
    } else {
        format!(", {n} {what}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counted() {
        assert_eq!(counted(0, "failed"), "");
        assert_eq!(counted(2, "failed"), ", 2 failed");
    }

    #[test]
    fn test_outcome_sym() {
        let s = Styled::plain();
        assert_eq!(outcome_sym(&s, 3, 0), "OK");
        assert_eq!(outcome_sym(&s, 0, 0), "OK");
        assert_eq!(outcome_sym(&s, 2, 1), "??");
        assert_eq!(outcome_sym(&s, 0, 2), "!!");
    }
}
