//! Raw hit export as CSV.

use std::borrow::Cow;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;

use crestmap_core::HitRecord;

/// Write the raw hit rows as CSV with RFC-4180-style quoting.
///
/// Rows are ordered by term then repo for stable diffs; the record set
/// itself carries no ordering guarantee.
pub fn write_raw_csv<W: Write>(out: &mut W, records: &[HitRecord]) -> io::Result<()> {
    writeln!(out, "Term,Repo,File,Ext,Bucket,Frequency,Context")?;
    let ordered = records
        .iter()
        .sorted_by(|a, b| a.term.cmp(&b.term).then_with(|| a.repo.cmp(&b.repo)));
    for record in ordered {
        writeln!(
            out,
            "{},{},{},{},{},{},{}",
            field(&record.term),
            field(&record.repo),
            field(&record.file_path.to_string_lossy()),
            field(&record.extension),
            field(&record.bucket.to_string()),
            record.frequency,
            field(&record.context),
        )?;
    }
    Ok(())
}

/// Write the raw CSV to a file.
pub fn write_raw_csv_file(path: &Path, records: &[HitRecord]) -> io::Result<()> {
    let mut out = BufWriter::new(std::fs::File::create(path)?);
    write_raw_csv(&mut out, records)?;
    out.flush()
}

/// Quote a field when it holds a comma, quote or line break; double any
/// embedded quotes.
fn field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;
    use crestmap_core::Bucket;
    use std::path::PathBuf;

    fn record(term: &str, context: &str) -> HitRecord {
        HitRecord {
            term: CompactString::new(term),
            repo: CompactString::new("repo"),
            file_path: PathBuf::from("/r/a.md"),
            extension: CompactString::new(".md"),
            bucket: Bucket::Code,
            frequency: 1,
            context: context.to_string(),
        }
    }

    fn render(records: &[HitRecord]) -> String {
        let mut buf = Vec::new();
        write_raw_csv(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_fields_unquoted() {
        let out = render(&[record("todo", "plain context")]);
        assert!(out.contains("todo,repo,/r/a.md,.md,Code,1,plain context"));
    }

    #[test]
    fn test_fields_with_commas_and_quotes() {
        let out = render(&[record("todo", "a, \"quoted\" b")]);
        assert!(out.contains("\"a, \"\"quoted\"\" b\""));
    }

    #[test]
    fn test_rows_sorted_by_term_then_repo() {
        let mut second = record("b", "x");
        second.repo = CompactString::new("zzz");
        let rows = render(&[second, record("b", "y"), record("a", "z")]);
        let lines: Vec<&str> = rows.lines().collect();
        assert!(lines[1].starts_with("a,"));
        assert!(lines[2].starts_with("b,repo"));
        assert!(lines[3].starts_with("b,zzz"));
    }

    #[test]
    fn test_header_only_when_empty() {
        let out = render(&[]);
        assert_eq!(out, "Term,Repo,File,Ext,Bucket,Frequency,Context\n");
    }
}
