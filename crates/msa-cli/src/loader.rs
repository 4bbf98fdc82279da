//! A minimal `>`-delimited sequence reader.
//!
//! This is explicitly *not* the spec'd FASTA parser (spec.md section 1 keeps
//! that out of core scope) -- it exists only so this binary has a runnable
//! demo path to point at. It folds unknown characters to `X` exactly as the
//! real upstream parser is required to (spec.md section 6), so a database
//! built here is interchangeable with one built anywhere else.

use msa_core::encoding::EncodedSequence;
use msa_core::error::MsaError;
use msa_core::Database;
use std::path::Path;

/// Reads every `>description` / sequence-lines record from `path` into a
/// [`Database`], in file order (so database indices match record order).
/// Blank lines and leading/trailing whitespace on sequence lines are
/// ignored; a record with no sequence lines encodes to length 0.
pub fn load_database(path: &Path) -> Result<Database, MsaError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MsaError::UnknownParser(format!("{}: {}", path.display(), e)))?;

    let mut database = Database::new();
    let mut current_description: Option<String> = None;
    let mut current_sequence = String::new();
    let mut has_record = false;

    let flush = |database: &mut Database, description: Option<String>, sequence: &str| {
        database.push(description, EncodedSequence::from_ascii(sequence.as_bytes()));
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(description) = line.strip_prefix('>') {
            if has_record {
                flush(&mut database, current_description.take(), &current_sequence);
            }
            current_description = Some(description.to_string());
            current_sequence.clear();
            has_record = true;
        } else {
            current_sequence.push_str(line);
        }
    }
    if has_record {
        flush(&mut database, current_description.take(), &current_sequence);
    }

    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile_free::TempPath {
        tempfile_free::TempPath::with_contents(contents)
    }

    /// Tiny hand-rolled scratch-file helper so this crate doesn't need a
    /// `tempfile` dependency for three unit tests.
    mod tempfile_free {
        use std::path::{Path, PathBuf};

        pub struct TempPath(PathBuf);

        impl TempPath {
            pub fn with_contents(contents: &str) -> Self {
                use std::sync::atomic::{AtomicU64, Ordering};
                static COUNTER: AtomicU64 = AtomicU64::new(0);
                let id = COUNTER.fetch_add(1, Ordering::Relaxed);

                let mut path = std::env::temp_dir();
                path.push(format!("msa-cli-loader-test-{}-{}.fasta", std::process::id(), id));
                let mut file = std::fs::File::create(&path).unwrap();
                super::Write::write_all(&mut file, contents.as_bytes()).unwrap();
                Self(path)
            }
        }

        impl AsRef<Path> for TempPath {
            fn as_ref(&self) -> &Path {
                &self.0
            }
        }

        impl Drop for TempPath {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
    }

    #[test]
    fn parses_two_records_in_file_order() {
        let path = write_temp(">first\nACGT\n>second\nAC\nGT\n");
        let database = load_database(path.as_ref()).unwrap();

        assert_eq!(database.len(), 2);
        assert_eq!(database.get(0).unwrap().description.as_deref(), Some("first"));
        assert_eq!(database.sequence(0).unwrap().to_ascii(), b"ACGT");
        assert_eq!(database.sequence(1).unwrap().to_ascii(), b"ACGT"); // wrapped lines join
    }

    #[test]
    fn folds_unknown_characters_to_x() {
        let path = write_temp(">only\nAC?T\n");
        let database = load_database(path.as_ref()).unwrap();
        assert_eq!(database.sequence(0).unwrap().to_ascii(), b"ACXT");
    }

    #[test]
    fn an_empty_file_yields_an_empty_database() {
        let path = write_temp("");
        let database = load_database(path.as_ref()).unwrap();
        assert!(database.is_empty());
    }
}
