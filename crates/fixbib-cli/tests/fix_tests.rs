//! Integration tests for the fix command
//!
//! These tests run the whole file pipeline against a `MockRegistry` and
//! inspect the files written next to the input.

use fixbib_cli::commands::execute_fix;
use fixbib_cli::{CliError, Formatter};
use fixbib_domain::{CandidateRecord, Contributor};
use fixbib_reconciler::{parse_bibliography, ReconcileConfig, ReconcileError};
use fixbib_registry::MockRegistry;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const LIBRARY: &str = r#"
@article{watson1953,
  author = {Watson, J. and Crick, F.},
  title = {Molecular structure of nucleic acid},
  journal = {Nature},
  year = {1953}
}

@book{knuth1997,
  author = {Knuth, Donald E.},
  title = {The Art of Computer Programming},
  publisher = {Addison-Wesley},
  year = {1997}
}

@article{vaswani2017,
  author = {Vaswani, Ashish},
  title = {Attention is all you need},
  journal = {arXiv preprint arXiv:1706.03762},
  year = {2017}
}

@article{ghost2001,
  author = {Nobody, A.},
  title = {A paper the registry has never heard of},
  journal = {Journal of Things}
}
"#;

fn write_library(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("refs.bib");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

fn nature_registry() -> MockRegistry {
    let registry = MockRegistry::new();
    registry.add_search_results(
        "Molecular structure of nucleic acid",
        vec![CandidateRecord {
            title: Some("Molecular Structure of Nucleic Acids".into()),
            authors: vec![
                Contributor::person("Watson", Some("J. D.")),
                Contributor::person("Crick", Some("F. H. C.")),
            ],
            container_title: Some("Nature".into()),
            year: Some(1953),
            doi: Some("10.1038/171737a0".into()),
            volume: Some("171".into()),
            ..Default::default()
        }],
    );
    registry
}

#[tokio::test]
async fn test_fix_writes_new_and_old_files() {
    let (_dir, path) = write_library(LIBRARY);
    let registry = nature_registry();

    let report = execute_fix(&path, registry.clone(), &ReconcileConfig::default(), &Formatter::new(false), false)
        .await
        .unwrap();

    assert_eq!(report.new_path, path.with_file_name("refs.new.bib"));
    assert_eq!(report.old_path, path.with_file_name("refs.old.bib"));
    assert!(report.new_path.exists());
    assert!(report.old_path.exists());

    // Only the two eligible articles reach the registry
    assert_eq!(registry.search_calls(), 2);
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.eligible, 2);
    assert_eq!(report.summary.corrected_primary, 1);
    assert_eq!(report.summary.unresolved, 1);

    let new_entries = parse_bibliography(&fs::read_to_string(&report.new_path).unwrap()).unwrap();
    let old_entries = parse_bibliography(&fs::read_to_string(&report.old_path).unwrap()).unwrap();

    let keys: Vec<&str> = new_entries.iter().map(|e| e.key()).collect();
    assert_eq!(keys, vec!["watson1953", "knuth1997", "vaswani2017", "ghost2001"]);

    assert_eq!(new_entries[0].doi().as_deref(), Some("10.1038/171737a0"));
    assert_eq!(new_entries[0].field("volume").as_deref(), Some("171"));
    assert!(old_entries[0].doi().is_none());

    // Entries that were skipped or unresolved are identical in both files
    for i in 1..4 {
        assert_eq!(new_entries[i].to_bib_string(), old_entries[i].to_bib_string());
    }

    // The original file is reproduced exactly
    assert_eq!(fs::read_to_string(&report.old_path).unwrap(), LIBRARY);
}

#[tokio::test]
async fn test_output_keeps_bibtex_dialect_and_macros() {
    let library = r#"@preamble{"Shared by the lab"}
@string{nat = {Nature}}

@article{watson1953,
  author = {Watson, J. and Crick, F.},
  title = {Molecular structure of nucleic acid},
  journal = nat,
  address = {London},
  month = apr,
  year = 1953
}

@phdthesis{turing1938,
  author = {Turing, Alan},
  title = {Systems of Logic Based on Ordinals},
  school = {Princeton University}
}
"#;
    let (_dir, path) = write_library(library);

    let report = execute_fix(&path, nature_registry(), &ReconcileConfig::default(), &Formatter::new(false), false)
        .await
        .unwrap();
    assert_eq!(report.summary.corrected_primary, 1);

    let written = fs::read_to_string(&report.new_path).unwrap();
    assert!(written.starts_with("@preamble{\"Shared by the lab\"}\n@string{nat = {Nature}}\n"));
    assert!(written.contains("journal = nat,"));
    assert!(written.contains("address = {London},"));
    assert!(written.contains("month = apr,"));
    assert!(written.contains("doi = {10.1038/171737a0}"));
    assert!(written.contains("@phdthesis{turing1938,\n  author = {Turing, Alan},\n  title = {Systems of Logic Based on Ordinals},\n  school = {Princeton University}\n}"));
    assert!(!written.contains("journaltitle"));
    assert!(!written.contains("location"));
}

#[tokio::test]
async fn test_input_file_is_not_modified() {
    let (_dir, path) = write_library(LIBRARY);

    execute_fix(&path, nature_registry(), &ReconcileConfig::default(), &Formatter::new(false), false)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), LIBRARY);
}

#[tokio::test]
async fn test_parse_error_aborts_before_any_request() {
    let (_dir, path) = write_library("@article{broken, title = {Unclosed");
    let registry = MockRegistry::new();

    let result = execute_fix(&path, registry.clone(), &ReconcileConfig::default(), &Formatter::new(false), false).await;

    assert!(matches!(result, Err(CliError::Reconcile(ReconcileError::Parse(_)))));
    assert_eq!(registry.search_calls(), 0);
    assert!(!path.with_file_name("refs.new.bib").exists());
}

#[tokio::test]
async fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.bib");

    let result = execute_fix(&path, MockRegistry::new(), &ReconcileConfig::default(), &Formatter::new(false), false).await;

    assert!(matches!(result, Err(CliError::Reconcile(ReconcileError::Io(_)))));
}

#[tokio::test]
async fn test_registry_outage_still_writes_output() {
    let (_dir, path) = write_library(LIBRARY);
    let registry = MockRegistry::new();
    registry.fail_search("Molecular structure of nucleic acid");
    registry.fail_search("A paper the registry has never heard of");

    let report = execute_fix(&path, registry, &ReconcileConfig::default(), &Formatter::new(false), false)
        .await
        .unwrap();

    assert_eq!(report.summary.registry_unavailable, 2);
    assert_eq!(report.summary.corrected(), 0);
    assert_eq!(
        fs::read_to_string(&report.new_path).unwrap(),
        fs::read_to_string(&report.old_path).unwrap()
    );
}

#[tokio::test]
async fn test_empty_file() {
    let (_dir, path) = write_library("");

    let report = execute_fix(&path, MockRegistry::new(), &ReconcileConfig::default(), &Formatter::new(false), false)
        .await
        .unwrap();

    assert_eq!(report.summary.total, 0);
    assert!(report.outcomes.is_empty());
    assert_eq!(fs::read_to_string(&report.new_path).unwrap(), "");
}
