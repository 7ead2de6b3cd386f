use anyhow::{anyhow, Context};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const SENTENCE: &str = "sentence";
const PATH: &str = "path";

/// One sentence/audio-path pair from a Common Voice `.tsv` file.
#[derive(Debug, Clone)]
pub struct CorpusRow {
    pub sentence: String,
    pub path: String,
    record: csv::StringRecord,
}

impl CorpusRow {
    /// Number of characters (not bytes) in the sentence.
    pub fn char_count(&self) -> usize {
        self.sentence.chars().count()
    }
}

/// A loaded corpus. Rows keep file order.
#[derive(Debug)]
pub struct Corpus {
    headers: csv::StringRecord,
    rows: Vec<CorpusRow>,
}

impl Corpus {
    /// Loads a tab separated file with a header row. `-` reads stdin.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path == Path::new("-") {
            return Self::from_reader(io::stdin().lock()).context("reading corpus from stdin");
        }
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        // Common Voice sentences carry literal quotes, so quoting stays off.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .quoting(false)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let sentence_idx = column_index(&headers, SENTENCE)?;
        let path_idx = column_index(&headers, PATH)?;

        let mut rows = vec![];
        for record in reader.records() {
            let record = record?;
            rows.push(CorpusRow {
                sentence: record[sentence_idx].to_owned(),
                path: record[path_idx].to_owned(),
                record,
            });
        }

        log::debug!("Loaded {} corpus rows", rows.len());
        Ok(Self { headers, rows })
    }

    pub fn rows(&self) -> &[CorpusRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a passthrough column such as `client_id` for a row.
    pub fn column<'a>(&self, row: &'a CorpusRow, name: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == name)?;
        row.record.get(idx)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> anyhow::Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("corpus header has no {:?} column", name))
}
