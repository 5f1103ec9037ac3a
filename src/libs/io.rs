use anyhow::Context;
use std::io::{BufRead, BufReader, BufWriter, Write};

/// Opens `input` for buffered reading. `stdin` reads the standard input,
/// files ending in `.gz` are transparently decompressed.
///
/// ```
/// use std::io::BufRead;
/// let reader = psma::reader("tests/psma/four.fa").unwrap();
/// let headers = reader
///     .lines()
///     .map(|l| l.unwrap())
///     .filter(|l| l.starts_with('>'))
///     .count();
/// assert_eq!(headers, 4);
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

/// Opens `output` for buffered writing; `stdout` writes to the screen.
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

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    #[test]
    fn test_reader_gz() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chains.fa.gz");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut gz = GzEncoder::new(file, flate2::Compression::default());
            writeln!(gz, ">1abc\nMKV").unwrap();
            gz.finish().unwrap();
        }

        let reader = reader(path.to_str().unwrap()).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec![">1abc".to_string(), "MKV".to_string()]);
    }

    #[test]
    fn test_reader_missing() {
        let err = reader("tests/psma/no_such_file.fa").err().unwrap();
        assert!(err.to_string().contains("could not open"));
    }
}
