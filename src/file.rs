//! JSON file helpers for configuration, requests and persisted stores.

use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{from_reader, to_writer_pretty};

/// Reads a JSON-encoded type from a given file `path`.
pub fn read_json<D: DeserializeOwned>(path: impl AsRef<Path>) -> Result<D, io::Error> {
    let file = File::open(path)?;
    Ok(from_reader(io::BufReader::new(file))?)
}

/// Writes `value` to `path` as pretty-printed JSON. The content goes to a sibling temporary file
/// first and is then renamed over `path`, so readers never observe a partial write.
pub fn write_json<S: Serialize>(path: impl AsRef<Path>, value: &S) -> Result<(), io::Error> {
    let path = path.as_ref();
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    {
        let mut writer = BufWriter::new(File::create(&staging)?);
        to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    std::fs::rename(&staging, path)
}

pub trait FromJsonFile<D> {
    fn from_json_file(path: impl AsRef<Path>) -> Result<D, io::Error>;
}

impl<D: DeserializeOwned> FromJsonFile<D> for D {
    fn from_json_file(path: impl AsRef<Path>) -> Result<D, io::Error> {
        read_json(path)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn write_then_read() {
        let path = std::env::temp_dir().join(format!("leaguesim-file-{}.json", std::process::id()));
        let value = BTreeMap::from([("week".to_string(), 4u32), ("teams".to_string(), 6)]);
        write_json(&path, &value).unwrap();
        let read: BTreeMap<String, u32> = BTreeMap::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(value, read);
    }

    #[test]
    fn missing_file() {
        let err = read_json::<u32>("/nonexistent/leaguesim.json").unwrap_err();
        assert_eq!(io::ErrorKind::NotFound, err.kind());
    }
}
