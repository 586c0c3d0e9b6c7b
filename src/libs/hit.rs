use crate::libs::error::{GraphError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

/// Default relative-score cutoff
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Default cap on data rows read
pub const DEFAULT_MAX_ROWS: usize = 500;

/// One tabular hit: `query_id target_id score significance target_label`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitRecord {
    pub query_id: String,
    pub target_id: String,
    pub score: f64,
    pub significance: f64,
    pub target_label: String,
}

impl HitRecord {
    pub fn new(query_id: &str, target_id: &str, score: f64) -> Self {
        Self {
            query_id: query_id.to_string(),
            target_id: target_id.to_string(),
            score,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.target_label = label.to_string();
        self
    }

    pub fn column(&self, col: Column) -> &str {
        match col {
            Column::Query => &self.query_id,
            Column::Target => &self.target_id,
            Column::Label => &self.target_label,
        }
    }
}

impl FromStr for HitRecord {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() < 5 {
            return Err(format!("expected 5 columns, found {}", fields.len()));
        }

        let score = fields[2]
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("score is not numeric: {:?}", fields[2]))?;
        let significance = fields[3]
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("significance is not numeric: {:?}", fields[3]))?;

        Ok(HitRecord {
            query_id: fields[0].to_string(),
            target_id: fields[1].to_string(),
            score,
            significance,
            target_label: fields[4].to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Query,
    Target,
    Label,
}

impl FromStr for Column {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "query" | "qacc" => Ok(Column::Query),
            "target" | "sacc" => Ok(Column::Target),
            "label" | "sscinames" => Ok(Column::Label),
            _ => Err(GraphError::InvalidOption(format!("unknown column {:?}", s))),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Column::Query => "query",
            Column::Target => "target",
            Column::Label => "label",
        };
        write!(f, "{}", s)
    }
}

/// Which hit columns act as the graph node and as the key nodes are linked by.
///
/// Scores are always normalized per query, so one side must be the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub node: Column,
    pub shared: Column,
}

impl Default for KeyColumns {
    fn default() -> Self {
        Self {
            node: Column::Query,
            shared: Column::Target,
        }
    }
}

impl KeyColumns {
    pub fn new(node: Column, shared: Column) -> Result<Self> {
        if node == shared {
            return Err(GraphError::InvalidOption(format!(
                "node and shared columns are both {}",
                node
            )));
        }
        if node != Column::Query && shared != Column::Query {
            return Err(GraphError::InvalidOption(
                "one of the node and shared columns must be query".to_string(),
            ));
        }
        Ok(Self { node, shared })
    }
}

/// How the hit table is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOpts {
    pub header: bool,
    /// `None` reads every row
    pub max_rows: Option<usize>,
}

impl Default for ReadOpts {
    fn default() -> Self {
        Self {
            header: true,
            max_rows: Some(DEFAULT_MAX_ROWS),
        }
    }
}

/// Reads hit records, skipping the header row, blank lines and `#` comments.
pub fn read_hits<R: BufRead>(reader: R, opts: &ReadOpts) -> Result<Vec<HitRecord>> {
    let mut records = Vec::new();
    let mut header_seen = !opts.header;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| GraphError::input_format(line_no, e.to_string()))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }
        if let Some(max) = opts.max_rows {
            if records.len() >= max {
                log::debug!("Row cap of {} reached at line {}", max, line_no);
                break;
            }
        }

        let record = line
            .parse::<HitRecord>()
            .map_err(|msg| GraphError::input_format(line_no, msg))?;
        records.push(record);
    }

    Ok(records)
}

/// A deduplicated hit with its score relative to the best hit of its query
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredHit {
    pub node: String,
    pub shared: String,
    pub relative_score: f64,
}

/// Keeps the best hit per (node, shared) pair, normalizes it against its
/// query's top score and drops hits below `threshold`.
///
/// Queries whose top score is not positive are dropped before the ratio is
/// taken.
pub fn filter_hits(records: &[HitRecord], columns: KeyColumns, threshold: f64) -> Vec<FilteredHit> {
    // (node, shared) -> (best score, query)
    let mut best: BTreeMap<(&str, &str), (f64, &str)> = BTreeMap::new();
    let mut top_of: HashMap<&str, f64> = HashMap::new();

    for rec in records {
        if rec.score.is_nan() {
            log::debug!("Skipping hit {} -> {} without a score", rec.query_id, rec.target_id);
            continue;
        }
        let key = (rec.column(columns.node), rec.column(columns.shared));
        let entry = best.entry(key).or_insert((rec.score, rec.query_id.as_str()));
        if rec.score > entry.0 {
            *entry = (rec.score, rec.query_id.as_str());
        }

        let top = top_of.entry(rec.query_id.as_str()).or_insert(rec.score);
        if rec.score > *top {
            *top = rec.score;
        }
    }

    for (query, top) in &top_of {
        if !(top.is_finite() && *top > 0.0) {
            log::debug!("Dropping hits of {}: top score {} is not positive", query, top);
        }
    }

    best.into_iter()
        .filter_map(|((node, shared), (score, query))| {
            let top = *top_of.get(query)?;
            if !(top.is_finite() && top > 0.0) {
                return None;
            }
            let relative_score = score / top;
            if relative_score >= threshold {
                Some(FilteredHit {
                    node: node.to_string(),
                    shared: shared.to_string(),
                    relative_score,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn test_parse_record() {
        let rec: HitRecord = "q1\ts1\t200.5\t1e-80\tEscherichia coli".parse().unwrap();
        assert_eq!(rec.query_id, "q1");
        assert_eq!(rec.target_id, "s1");
        assert_eq!(rec.score, 200.5);
        assert_eq!(rec.significance, 1e-80);
        assert_eq!(rec.target_label, "Escherichia coli");
    }

    #[test]
    fn test_parse_record_errors() {
        assert!("q1\ts1\t200".parse::<HitRecord>().is_err());
        assert!("q1\ts1\tabc\t0.0\tlabel".parse::<HitRecord>().is_err());
        assert!("q1\ts1\t1.0\tnope\tlabel".parse::<HitRecord>().is_err());
        assert!("q1\ts1\tnan\t0.0\tlabel".parse::<HitRecord>().is_err());
        assert!("q1\ts1\tinf\t0.0\tlabel".parse::<HitRecord>().is_err());
        assert!("q1\ts1\t1.0\t-inf\tlabel".parse::<HitRecord>().is_err());
    }

    #[test]
    fn test_read_hits_rejects_nan() {
        let input = "q1\ts1\tnan\t0\tA\nq1\ts2\t100\t0\tB\n";
        let opts = ReadOpts {
            header: false,
            max_rows: None,
        };
        let err = read_hits(BufReader::new(input.as_bytes()), &opts).unwrap_err();
        assert_eq!(err, GraphError::input_format(1, "score is not numeric: \"nan\""));
    }

    #[test]
    fn test_filter_ignores_nan_in_any_order() {
        let mut records = vec![
            HitRecord::new("q1", "s1", f64::NAN),
            HitRecord::new("q1", "s2", 100.0),
        ];
        let forward = filter_hits(&records, KeyColumns::default(), DEFAULT_THRESHOLD);
        records.reverse();
        let backward = filter_hits(&records, KeyColumns::default(), DEFAULT_THRESHOLD);

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].shared, "s2");
        assert_eq!(forward[0].relative_score, 1.0);
    }

    #[test]
    fn test_read_hits_header_and_cap() {
        let input = "\
qacc\tsacc\tbitscore\tevalue\tsscinames
# comment
q1\ts1\t100\t0\tA

q1\ts2\t95\t0\tB
q2\ts1\t50\t0\tA
";
        let all = read_hits(
            BufReader::new(input.as_bytes()),
            &ReadOpts {
                header: true,
                max_rows: None,
            },
        )
        .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].query_id, "q2");

        let capped = read_hits(
            BufReader::new(input.as_bytes()),
            &ReadOpts {
                header: true,
                max_rows: Some(2),
            },
        )
        .unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn test_read_hits_reports_line() {
        let input = "h\th\th\th\th\nq1\ts1\t100\t0\tA\nq1\ts2\tx\t0\tB\n";
        let err = read_hits(BufReader::new(input.as_bytes()), &ReadOpts::default()).unwrap_err();
        match err {
            GraphError::InputFormat { line, .. } => assert_eq!(line, 3),
            _ => panic!("unexpected error {:?}", err),
        }
    }

    #[test]
    fn test_filter_dedup_and_threshold() {
        let records = vec![
            HitRecord::new("q1", "s1", 100.0),
            HitRecord::new("q1", "s1", 80.0),
            HitRecord::new("q1", "s2", 95.0),
            HitRecord::new("q1", "s3", 89.0),
            HitRecord::new("q2", "s1", 40.0),
        ];
        let hits = filter_hits(&records, KeyColumns::default(), DEFAULT_THRESHOLD);

        let pairs: Vec<(&str, &str)> = hits
            .iter()
            .map(|h| (h.node.as_str(), h.shared.as_str()))
            .collect();
        assert_eq!(pairs, vec![("q1", "s1"), ("q1", "s2"), ("q2", "s1")]);
        assert_eq!(hits[0].relative_score, 1.0);
        assert_eq!(hits[1].relative_score, 0.95);
        assert_eq!(hits[2].relative_score, 1.0);

        for h in &hits {
            assert!(h.relative_score >= 0.9 && h.relative_score <= 1.0);
        }
    }

    #[test]
    fn test_filter_exact_threshold_kept() {
        let records = vec![
            HitRecord::new("q1", "s1", 100.0),
            HitRecord::new("q1", "s2", 90.0),
        ];
        let hits = filter_hits(&records, KeyColumns::default(), DEFAULT_THRESHOLD);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_filter_degenerate_scores() {
        let records = vec![
            HitRecord::new("q1", "s1", 0.0),
            HitRecord::new("q1", "s2", 0.0),
            HitRecord::new("q2", "s1", -3.0),
            HitRecord::new("q3", "s1", 10.0),
        ];
        let hits = filter_hits(&records, KeyColumns::default(), DEFAULT_THRESHOLD);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, "q3");
    }

    #[test]
    fn test_filter_empty() {
        assert!(filter_hits(&[], KeyColumns::default(), DEFAULT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_filter_label_nodes() {
        // species as nodes, linked through the queries that hit them
        let records = vec![
            HitRecord::new("q1", "s1", 100.0).with_label("Bacillus subtilis"),
            HitRecord::new("q1", "s2", 99.0).with_label("Bacillus cereus"),
            HitRecord::new("q1", "s3", 98.0).with_label("Bacillus cereus"),
        ];
        let columns = KeyColumns::new(Column::Label, Column::Query).unwrap();
        let hits = filter_hits(&records, columns, DEFAULT_THRESHOLD);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node, "Bacillus cereus");
        assert_eq!(hits[0].shared, "q1");
        assert_eq!(hits[0].relative_score, 0.99);
        assert_eq!(hits[1].node, "Bacillus subtilis");
    }

    #[test]
    fn test_key_columns_validation() {
        assert!(KeyColumns::new(Column::Query, Column::Query).is_err());
        assert!(KeyColumns::new(Column::Label, Column::Target).is_err());
        assert!(KeyColumns::new(Column::Target, Column::Query).is_ok());
        assert_eq!("sscinames".parse::<Column>().unwrap(), Column::Label);
        assert!("evalue".parse::<Column>().is_err());
    }
}
