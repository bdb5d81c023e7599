use anyhow::Context;
use ragfuse_core::DocumentChunk;
use serde::Deserialize;
use std::path::Path;

/// One pre-chunked record of a JSONL corpus file.
#[derive(Debug, Deserialize)]
struct CorpusRecord {
    source: String,
    #[serde(default)]
    chunk_index: usize,
    content: String,
}

/// Read a JSONL corpus (`{"source", "chunk_index", "content"}` per line).
/// Blank lines are skipped.
pub async fn load_corpus(path: &Path) -> anyhow::Result<Vec<DocumentChunk>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read corpus file '{}'", path.display()))?;
    parse_corpus(&data)
}

fn parse_corpus(data: &str) -> anyhow::Result<Vec<DocumentChunk>> {
    let mut chunks = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CorpusRecord = serde_json::from_str(line)
            .with_context(|| format!("Invalid corpus record on line {}", line_no + 1))?;
        chunks.push(DocumentChunk::new(
            record.content,
            record.source,
            record.chunk_index,
        ));
    }
    Ok(chunks)
}

/// Read one query per non-blank line.
pub async fn load_queries(path: &Path) -> anyhow::Result<Vec<String>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read query file '{}'", path.display()))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
