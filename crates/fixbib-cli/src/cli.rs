//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// fixbib - Correct BibTeX journal articles against the Crossref registry.
///
/// Writes `<name>.new.bib` with corrected entries and `<name>.old.bib` with
/// the original entries, next to the input file.
///
/// Set CROSSREF_MAILTO to a contact e-mail to use Crossref's polite pool.
#[derive(Debug, Parser)]
#[command(name = "fixbib")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Bibliography file to fix
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        let cli = Cli::try_parse_from(["fixbib", "refs.bib"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("refs.bib"));
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["fixbib"]).is_err());
    }

    #[test]
    fn test_unknown_flags_rejected() {
        assert!(Cli::try_parse_from(["fixbib", "--mailto", "x@y.org", "refs.bib"]).is_err());
    }
}
