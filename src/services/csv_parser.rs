use crate::models::UserRecord;
use std::io;
use std::path::Path;

/// Reads every data row of a CSV source, using the first row as field names.
///
/// Rows shorter than the header leave the trailing fields out of the record;
/// cells past the last header are ignored. Any read or UTF-8 error aborts the
/// whole parse.
pub fn read_records<R: io::Read>(source: R) -> Result<Vec<UserRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .collect::<UserRecord>(),
        );
    }

    Ok(records)
}

pub fn read_file(path: &Path) -> Result<Vec<UserRecord>, csv::Error> {
    let file = std::fs::File::open(path)?;
    read_records(io::BufReader::new(file))
}
