use std::io::BufRead;

/// Ask for `param` on the log and read one line from `reader`.
///
/// The trailing line ending is stripped. A read error is logged and yields
/// an empty string, which callers treat as "not provided".
pub fn enter_input<R: BufRead>(param: &str, reader: &mut R) -> String {
    tracing::info!("Please enter the {}: ", param);

    let mut input = String::new();
    if let Err(e) = reader.read_line(&mut input) {
        tracing::error!(
            error = %e,
            "An error occurred while reading {}. Please try again",
            param
        );
        return String::new();
    }

    let result = input
        .strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(&input)
        .to_string();
    tracing::info!("{}", result);
    result
}
