//! Parse raw HTTP response header lines.

/// Status code from a status line such as `HTTP/1.1 206 Partial Content`.
pub fn parse_status_line(line: &str) -> Option<u32> {
    let line = line.trim();
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse::<u32>().ok()
}

/// Parse collected header lines into `(status, headers)`.
///
/// libcurl hands over the headers of every redirect hop; a status line
/// starts a new response, so only the final hop's headers are kept.
pub fn parse_header_lines<S: AsRef<str>>(lines: &[S]) -> (Option<u32>, Vec<(String, String)>) {
    let mut status = None;
    let mut headers = Vec::new();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if let Some(code) = parse_status_line(line) {
            status = Some(code);
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    (status, headers)
}
