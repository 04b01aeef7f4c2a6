use std::{fs::File, path::Path};

use crate::error::OsdResult;

/// One CSV data row as a header-name to raw-string mapping.
#[derive(Clone, Debug)]
pub struct Row {
    number: usize,
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new(number: usize, fields: Vec<(String, String)>) -> Self {
        Self { number, fields }
    }

    /// 1-based data row number (the header row is not counted).
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Single-pass reader turning a CSV file into a sequence of [`Row`] mappings.
///
/// The first record supplies the header names; records wider than the header
/// get synthetic `column_<i>` names for the overflow cells.
pub struct RowReader {
    records: csv::StringRecordsIntoIter<File>,
    headers: Vec<String>,
    next_number: usize,
}

impl RowReader {
    pub fn from_path(path: impl AsRef<Path>) -> OsdResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        Ok(Self {
            records: reader.into_records(),
            headers,
            next_number: 1,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for RowReader {
    type Item = OsdResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };

        let number = self.next_number;
        self.next_number += 1;

        let fields = record
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let name = self
                    .headers
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("column_{i}"));
                (name, value.to_string())
            })
            .collect();

        Some(Ok(Row::new(number, fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_fixture(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::path::PathBuf::from("target").join("rows_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn maps_headers_to_values() {
        let path = write_fixture("basic.csv", "Date,Time,Alt\n2021-06-20,10:00:00.000,5.0\n");
        let mut reader = RowReader::from_path(&path).unwrap();
        assert_eq!(reader.headers(), &["Date", "Time", "Alt"]);

        let row = reader.next().unwrap().unwrap();
        assert_eq!(row.number(), 1);
        assert_eq!(row.get("Date"), Some("2021-06-20"));
        assert_eq!(row.get("Alt"), Some("5.0"));
        assert_eq!(row.get("Missing"), None);
        assert!(reader.next().is_none());
    }

    #[test]
    fn overflow_cells_get_synthetic_names() {
        let path = write_fixture("wide.csv", "A,B\n1,2,3\n");
        let mut reader = RowReader::from_path(&path).unwrap();
        let row = reader.next().unwrap().unwrap();
        assert_eq!(row.get("column_2"), Some("3"));
    }

    #[test]
    fn row_numbers_count_data_rows() {
        let path = write_fixture("numbered.csv", "A\n1\n2\n3\n");
        let reader = RowReader::from_path(&path).unwrap();
        let numbers: Vec<usize> = reader.map(|r| r.unwrap().number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
