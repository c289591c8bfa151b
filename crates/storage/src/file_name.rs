//! Segment table file naming
//!
//! Each committed segment of a directory-backed family is one file named
//! after its zero-padded file number, e.g. `000042.sst`. Files are written
//! under a `.tmp` name and renamed into place once complete.

/// Suffix of a complete table file
pub const TABLE_SUFFIX: &str = "sst";

/// Suffix of a table file that is still being written
pub const TMP_SUFFIX: &str = "tmp";

/// File name of the table with the given number
pub fn table_file_name(file_number: u64) -> String {
    format!("{:06}.{}", file_number, TABLE_SUFFIX)
}

/// Temporary file name used while the table is written
pub fn tmp_file_name(file_number: u64) -> String {
    format!("{:06}.{}", file_number, TMP_SUFFIX)
}

/// File number of a complete table file, `None` for anything else
pub fn parse_table_file_name(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_suffix(TABLE_SUFFIX)?.strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// True for leftovers of an interrupted table write
pub fn is_tmp_file_name(file_name: &str) -> bool {
    file_name
        .strip_suffix(TMP_SUFFIX)
        .and_then(|s| s.strip_suffix('.'))
        .is_some()
}
