/// Field separator used by NCBI taxonomy dump files.
pub const DMP_DELIMITER: &str = "\t|\t";

/// Splits one line of a `.dmp` file into its fields.
///
/// Lines end with a `\t|` terminator that belongs to no field; it is stripped
/// before splitting so the last field comes back clean.
///
/// # Arguments
///
/// * `line` - A single line, without the trailing newline.
///
/// # Returns
///
/// The fields in file order.
pub fn split_dmp_line(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.strip_suffix("\t|").unwrap_or(line);
    line.split(DMP_DELIMITER).collect()
}

/// Parses a colon-separated rank list such as `"genus:family"`.
///
/// Empty segments are dropped, so an empty string yields no ranks.
pub fn split_ranks(levels: &str) -> Vec<String> {
    levels
        .split(':')
        .map(str::trim)
        .filter(|rank| !rank.is_empty())
        .map(str::to_string)
        .collect()
}
