//! Markdown word-map and summary rendering.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Utc;

use crestmap_analyze::{Summaries, WordMap, top_example};

/// Write the word-map table: one row per term with its tier, total and the
/// context of its strongest example.
pub fn write_table<W: Write>(out: &mut W, map: &WordMap) -> io::Result<()> {
    writeln!(out, "# Crestmap Word Map")?;
    writeln!(out)?;
    writeln!(out, "| Term | Tier | Total | Top Example |")?;
    writeln!(out, "|---|---:|---:|---|")?;
    for tier in &map.tiers {
        let example = top_example(&map.records, &tier.term)
            .map(|record| escape_pipes(&record.context))
            .unwrap_or_default();
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            tier.term, tier.tier, tier.total, example
        )?;
    }
    Ok(())
}

/// Write the summary document: bucket, tier, repo and top-term tables.
pub fn write_summary<W: Write>(out: &mut W, summaries: &Summaries) -> io::Result<()> {
    writeln!(out, "# Crestmap Summary")?;
    writeln!(out)?;
    writeln!(out, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M UTC"))?;

    writeln!(out)?;
    writeln!(out, "## Bucket Distribution")?;
    writeln!(out)?;
    writeln!(out, "| Bucket | Items |")?;
    writeln!(out, "|---|---:|")?;
    for bucket in &summaries.buckets {
        writeln!(out, "| {} | {} |", bucket.bucket, bucket.hits)?;
    }

    writeln!(out)?;
    writeln!(out, "## Tier Distribution (per term)")?;
    writeln!(out)?;
    writeln!(out, "| Tier | Terms |")?;
    writeln!(out, "|---|---:|")?;
    for tier in &summaries.tier_counts {
        writeln!(out, "| {} | {} |", tier.tier, tier.terms)?;
    }

    writeln!(out)?;
    writeln!(out, "## Top Repos (by occurrences)")?;
    writeln!(out)?;
    writeln!(out, "| Repo | Items |")?;
    writeln!(out, "|---|---:|")?;
    for repo in &summaries.top_repos {
        writeln!(out, "| {} | {} |", escape_pipes(&repo.repo), repo.hits)?;
    }

    writeln!(out)?;
    writeln!(out, "## Top Terms")?;
    writeln!(out)?;
    writeln!(out, "| Term | Tier | Total | Score |")?;
    writeln!(out, "|---|---|---:|---:|")?;
    for term in &summaries.top_terms {
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            term.term,
            term.tier,
            term.total,
            format_score(term.score)
        )?;
    }
    Ok(())
}

/// Write the word-map table to a file.
pub fn write_table_file(path: &Path, map: &WordMap) -> io::Result<()> {
    let mut out = BufWriter::new(std::fs::File::create(path)?);
    write_table(&mut out, map)?;
    out.flush()
}

/// Write the summary document to a file.
pub fn write_summary_file(path: &Path, summaries: &Summaries) -> io::Result<()> {
    let mut out = BufWriter::new(std::fs::File::create(path)?);
    write_summary(&mut out, summaries)?;
    out.flush()
}

fn escape_pipes(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Up to three decimals, trailing zeros trimmed (1.0 renders as "1").
fn format_score(score: f64) -> String {
    let mut text = format!("{score:.3}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}
