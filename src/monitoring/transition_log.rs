use crate::shared_data::SignalEvent;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// Writes events as CSV rows, with a header row when `headers` is set.
pub fn write_events<W: Write>(
    writer: W,
    events: &[SignalEvent],
    headers: bool,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(headers)
        .from_writer(writer);
    for event in events {
        wtr.serialize(event)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_events<R: Read>(reader: R) -> Result<Vec<SignalEvent>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize().collect()
}

/// Appends events to a CSV file, writing the header only for a new file.
pub fn append_events_to_csv(path: &Path, events: &[SignalEvent]) -> Result<(), Box<dyn Error>> {
    let file_exists = path.exists();
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    write_events(file, events, !file_exists)?;
    Ok(())
}

pub fn count_csv_records(path: &Path) -> Result<usize, Box<dyn Error>> {
    let file = File::open(path)?;
    Ok(read_events(file)?.len())
}
