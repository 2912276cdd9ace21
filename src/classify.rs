use std::fmt::Write as _;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::decompose::Job;
use crate::kv_store::RecordStore;
use crate::taxonomy::{TaxId, Taxonomy, TaxonomyNode};

/// One query and its candidate taxa, parsed from a record payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord<'a> {
    pub key: &'a str,
    pub taxa: Vec<TaxId>,
}

/// Per-worker counters, summed by the pool once all workers are done.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationStats {
    /// Records that produced an output line
    pub total_records: u64,
    /// Blank records, which produce no output
    pub skipped_records: u64,
    /// Records whose taxa were all absent from the taxonomy
    pub unknown_records: u64,
}

impl ClassificationStats {
    pub fn total_classified(&self) -> u64 {
        self.total_records - self.unknown_records
    }

    pub fn merge(&mut self, other: &ClassificationStats) {
        self.total_records += other.total_records;
        self.skipped_records += other.skipped_records;
        self.unknown_records += other.unknown_records;
    }
}

/// Parses a record payload into a query key and its taxa.
///
/// Each non-blank line is either `query<TAB>taxon[<TAB>...]` or a bare
/// `taxon`. The first embedded query name becomes the key; records made only
/// of bare taxa use `store_key`. Tokens that are not valid taxon IDs are
/// dropped, like taxa missing from the taxonomy.
///
/// # Returns
///
/// `None` when the payload has no non-blank line.
pub fn parse_record<'a>(store_key: &'a str, data: &'a str) -> Option<QueryRecord<'a>> {
    let mut key = None;
    let mut taxa = Vec::new();
    let mut has_lines = false;

    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }
        has_lines = true;

        let mut fields = line.split('\t');
        let token = match (fields.next(), fields.next()) {
            (Some(query), Some(taxon)) => {
                key.get_or_insert(query.trim());
                taxon
            }
            (Some(taxon), None) => taxon,
            _ => continue,
        };

        match token.trim().parse::<TaxId>() {
            Ok(taxon) => taxa.push(taxon),
            Err(_) => warn!("Skipping invalid taxon {:?} in record {}", token, store_key),
        }
    }

    has_lines.then(|| QueryRecord {
        key: key.unwrap_or(store_key),
        taxa,
    })
}

/// Appends one tab-separated output line for a resolved record.
///
/// Columns are key, taxon ID, scientific name and rank, followed by the
/// semicolon-joined rank projections when `projections` is given.
pub fn format_line(
    out: &mut String,
    key: &str,
    node: &TaxonomyNode,
    projections: Option<&[&str]>,
) {
    // Writing to a String cannot fail.
    let _ = write!(
        out,
        "{}\t{}\t{}\t{}",
        key, node.taxon_id, node.scientific_name, node.rank
    );
    if let Some(levels) = projections {
        out.push('\t');
        out.push_str(&levels.join(";"));
    }
    out.push('\n');
}

/// Resolves one record and appends its output line to `out`.
///
/// Returns `false` when the record resolved to the unknown sentinel.
pub fn classify_record(
    out: &mut String,
    record: &QueryRecord<'_>,
    taxonomy: &Taxonomy,
    ranks: &[String],
) -> bool {
    let node = taxonomy.lca_or_unknown(&record.taxa);
    let levels = if node.is_unknown() {
        Vec::new()
    } else {
        taxonomy.at_levels(node, ranks)
    };
    let projections = (!ranks.is_empty()).then_some(levels.as_slice());
    format_line(out, record.key, node, projections);
    !node.is_unknown()
}

/// Processes every record of `job`, writing one line per non-blank record.
///
/// Stops early, without error, once `abort` is raised by another worker.
/// Any record store failure is returned to the caller.
pub fn classify_job<S, W>(
    job: &Job,
    taxonomy: &Taxonomy,
    store: &S,
    ranks: &[String],
    output: &mut W,
    abort: &AtomicBool,
) -> Result<ClassificationStats>
where
    S: RecordStore + ?Sized,
    W: Write,
{
    let mut stats = ClassificationStats::default();
    let mut line = String::new();

    for index in job.range() {
        if abort.load(Ordering::Relaxed) {
            debug!("Worker {} stopping at record {}", job.rank, index);
            break;
        }

        let key = store
            .key_at(index)
            .with_context(|| format!("reading key of record {}", index))?;
        let data = store
            .data_at(index)
            .with_context(|| format!("reading record {} ({})", index, key))?;

        let record = match parse_record(key, data) {
            Some(record) => record,
            None => {
                stats.skipped_records += 1;
                continue;
            }
        };

        line.clear();
        if !classify_record(&mut line, &record, taxonomy, ranks) {
            stats.unknown_records += 1;
        }
        stats.total_records += 1;
        output.write_all(line.as_bytes())?;
    }

    output.flush()?;
    Ok(stats)
}
