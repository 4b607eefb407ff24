pub mod transition_log;

pub use transition_log::{append_events_to_csv, count_csv_records, read_events, write_events};
