use anyhow::Context;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// Open `input` for buffered reading. `stdin` reads standard input and a `.gz`
/// extension is decompressed on the fly.
///
/// ```
/// use std::io::BufRead;
/// let reader = nwclust::reader("tests/nwclust/thresholds.txt").unwrap();
/// let lines: Vec<_> = reader.lines().collect();
/// assert_eq!(lines.len(), 6);
///
/// assert!(nwclust::reader("tests/nwclust/not-there.txt").is_err());
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open {}", path.display()))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file = std::fs::File::create(output)
            .with_context(|| format!("could not create {}", output))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}

/// Deserialize a JSON document from a file (or `stdin`).
pub fn read_json<T: DeserializeOwned>(input: &str) -> anyhow::Result<T> {
    let reader = reader(input)?;
    let value = serde_json::from_reader(reader)
        .with_context(|| format!("{} is not a valid JSON file", input))?;
    Ok(value)
}

/// Serialize `value` as pretty-printed JSON followed by a newline.
pub fn write_json<T: Serialize>(output: &str, value: &T) -> anyhow::Result<()> {
    let mut writer = writer(output)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Load an `{ "id": "SEQUENCE", ... }` object, keeping the order of the ids.
///
/// ```
/// let seqs = nwclust::libs::io::read_sequences("tests/nwclust/organisms.json").unwrap();
/// assert_eq!(seqs.len(), 5);
/// assert_eq!(seqs.get_index(0).unwrap().0, "Ape");
/// ```
pub fn read_sequences(input: &str) -> anyhow::Result<IndexMap<String, String>> {
    let seqs: IndexMap<String, String> = read_json(input)?;
    if seqs.is_empty() {
        anyhow::bail!("{} contains no sequences", input);
    }
    Ok(seqs)
}
