use crate::index::Document;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Load a corpus from a `.json`/`.jsonl` file or a directory of them.
///
/// Directories are walked recursively in file-name order so the corpus
/// order, and therefore recommendation positions, is reproducible.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let mut docs = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if !p.is_file() {
                continue;
            }
            match p.extension().and_then(|s| s.to_str()) {
                Some("jsonl") => docs.extend(read_jsonl_file(p)?),
                Some("json") => docs.extend(read_json_file(p)?),
                _ => {}
            }
        }
    } else if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        docs = read_jsonl_file(path)?;
    } else {
        docs = read_json_file(path)?;
    }
    tracing::info!(path = %path.display(), num_docs = docs.len(), "loaded corpus");
    Ok(docs)
}

fn read_jsonl_file(path: &Path) -> Result<Vec<Document>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_jsonl(BufReader::new(f)).with_context(|| format!("reading {}", path.display()))
}

fn read_json_file(path: &Path) -> Result<Vec<Document>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_json(BufReader::new(f)).with_context(|| format!("reading {}", path.display()))
}

/// One document per line; blank lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(&line).with_context(|| format!("line {}", line_no + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// A JSON array of documents or a single document object.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<Document>> {
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            arr.into_iter().map(|v| serde_json::from_value::<Document>(v).map_err(anyhow::Error::from)).collect()
        }
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        other => anyhow::bail!("expected an array or object of books, found {other}"),
    }
}

pub fn write_jsonl<W: Write>(mut writer: W, docs: &[Document]) -> Result<()> {
    for doc in docs {
        serde_json::to_writer(&mut writer, doc)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_skips_blank_lines() {
        let input = "{\"id\":\"b1\",\"title\":\"Dune\"}\n\n{\"id\":\"b2\",\"title\":\"Emma\",\"year\":1815}\n";
        let docs = read_jsonl(input.as_bytes()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].year, Some(1815));
    }

    #[test]
    fn jsonl_reports_line_number() {
        let input = "{\"id\":\"b1\"}\nnot json\n";
        let err = read_jsonl(input.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn json_accepts_array_or_object() {
        assert_eq!(read_json(r#"[{"id":"1"},{"id":"2"}]"#.as_bytes()).unwrap().len(), 2);
        assert_eq!(read_json(r#"{"id":"1","title":"Dune"}"#.as_bytes()).unwrap()[0].title, "Dune");
        assert!(read_json("42".as_bytes()).is_err());
    }

    #[test]
    fn jsonl_output_reads_back() {
        let docs = vec![Document::new("b1", "Dune", "Herbert", "Fiction", "spice")];
        let mut buf = Vec::new();
        write_jsonl(&mut buf, &docs).unwrap();
        assert_eq!(read_jsonl(buf.as_slice()).unwrap(), docs);
    }
}
