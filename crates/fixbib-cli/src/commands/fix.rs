//! Fix command implementation.

use crate::error::{CliError, Result};
use crate::output::Formatter;
use fixbib_domain::Registry;
use fixbib_reconciler::{
    read_bibliography, select_eligible, write_bibliography, EntryOutcome, ReconcileConfig,
    Reconciler, RunSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// What a fix run produced.
#[derive(Debug)]
pub struct FixReport {
    /// File holding the corrected entries
    pub new_path: PathBuf,

    /// File holding the original entries
    pub old_path: PathBuf,

    /// Per-entry outcomes, in file order
    pub outcomes: Vec<EntryOutcome>,

    /// Outcome counts
    pub summary: RunSummary,
}

impl FixReport {
    /// Closing report: summary, output paths and how to compare them.
    pub fn render(&self, formatter: &Formatter) -> String {
        format!(
            "{}\n\n{}\n{}\n{}\n   diff {} {}",
            self.summary.summary(),
            formatter.info(&format!("Patched file: {}", self.new_path.display())),
            formatter.info(&format!("Original file: {}", self.old_path.display())),
            "Use a diff tool to see changes:",
            self.old_path.display(),
            self.new_path.display(),
        )
    }
}

/// Sibling output paths: `refs.bib` -> (`refs.new.bib`, `refs.old.bib`).
pub fn output_paths(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let stem = path
        .file_stem()
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file path: {}", path.display())))?
        .to_string_lossy();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    Ok((
        path.with_file_name(format!("{}.new{}", stem, ext)),
        path.with_file_name(format!("{}.old{}", stem, ext)),
    ))
}

/// Execute the fix command.
///
/// Parses the whole file before contacting the registry; a malformed file
/// fails without any request. Both output files are written only after
/// every entry has been reconciled.
pub async fn execute_fix<R: Registry>(
    path: &Path,
    registry: R,
    config: &ReconcileConfig,
    formatter: &Formatter,
    show_progress: bool,
) -> Result<FixReport> {
    let (new_path, old_path) = output_paths(path)?;

    let original = read_bibliography(path)?;
    let mut file = original.clone();
    let eligible = select_eligible(file.entries()).len();

    tracing::info!(
        "Loaded {} entries from {} ({} eligible)",
        file.entries().len(),
        path.display(),
        eligible
    );

    let pb = if show_progress {
        let pb = ProgressBar::new(eligible as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let reconciler = Reconciler::new(registry, config.clone());
    let outcomes = reconciler
        .reconcile_all(file.entries_mut(), |outcome| {
            pb.suspend(|| println!("{}", formatter.outcome_line(outcome)));
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    write_bibliography(&new_path, &file)?;
    write_bibliography(&old_path, &original)?;

    let summary = RunSummary::from_outcomes(file.entries().len(), &outcomes);

    Ok(FixReport {
        new_path,
        old_path,
        outcomes,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths_keep_extension() {
        let (new, old) = output_paths(Path::new("/tmp/refs.bib")).unwrap();
        assert_eq!(new, PathBuf::from("/tmp/refs.new.bib"));
        assert_eq!(old, PathBuf::from("/tmp/refs.old.bib"));
    }

    #[test]
    fn test_output_paths_without_extension() {
        let (new, old) = output_paths(Path::new("library")).unwrap();
        assert_eq!(new, PathBuf::from("library.new"));
        assert_eq!(old, PathBuf::from("library.old"));
    }

    #[test]
    fn test_output_paths_dotted_stem() {
        let (new, _) = output_paths(Path::new("thesis.refs.bib")).unwrap();
        assert_eq!(new, PathBuf::from("thesis.refs.new.bib"));
    }

    #[test]
    fn test_output_paths_reject_root() {
        assert!(output_paths(Path::new("/")).is_err());
    }

    #[test]
    fn test_render_report() {
        let report = FixReport {
            new_path: PathBuf::from("refs.new.bib"),
            old_path: PathBuf::from("refs.old.bib"),
            outcomes: Vec::new(),
            summary: RunSummary::new(2),
        };
        let text = report.render(&Formatter::new(false));
        assert!(text.contains("Patched file: refs.new.bib"));
        assert!(text.contains("Original file: refs.old.bib"));
        assert!(text.contains("diff refs.old.bib refs.new.bib"));
    }
}
