//! Access-log line tokenizer
//!
//! Access logs in common/combined format are fixed whitespace-delimited
//! records. Only two fields matter for navigation analysis:
//!
//! ```text
//! 10.0.0.1 - - [25/Apr/2018:10:00:00 -0700] "GET /index.html HTTP/1.1" 200 512
//! ^ field 0                                       ^ field 6
//! ```
//!
//! Field 0 is the client key (remote address) and field 6 is the request path.
//! Lines with fewer than seven fields are unusable and yield `None`; they are
//! skipped by the caller rather than aborting the run.

/// Index of the client key field
pub const CLIENT_FIELD: usize = 0;

/// Index of the request path field
pub const PATH_FIELD: usize = 6;

/// Minimum number of fields a usable line must have
pub const MIN_FIELDS: usize = PATH_FIELD + 1;

/// Client key and request path extracted from one log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogToken<'a> {
    /// Remote client identifier (field 0)
    pub client: &'a str,
    /// Requested path (field 6)
    pub path: &'a str,
}

/// Tokenize a single log line
///
/// Splits on runs of whitespace. Returns `None` when the line has fewer than
/// [`MIN_FIELDS`] fields. No other validation is performed.
///
/// # Example
/// ```
/// use pathseq::tokenizer::tokenize;
///
/// let line = r#"1.1.1.1 - - [25/Apr/2018:10:00:00 -0700] "GET /a HTTP/1.1" 200 12"#;
/// let token = tokenize(line).unwrap();
/// assert_eq!(token.client, "1.1.1.1");
/// assert_eq!(token.path, "/a");
///
/// assert!(tokenize("1.1.1.1 - -").is_none());
/// ```
pub fn tokenize(line: &str) -> Option<LogToken<'_>> {
    let mut fields = line.split_whitespace();
    let client = fields.next()?;
    // fields 1..=5 are skipped, nth(5) lands on field 6
    let path = fields.nth(PATH_FIELD - CLIENT_FIELD - 1)?;
    Some(LogToken { client, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_combined_format() {
        let line = r#"192.168.1.1 - frank [10/Oct/2000:13:55:36 -0700] "GET /apache_pb.gif HTTP/1.0" 200 2326"#;
        let token = tokenize(line).unwrap();
        assert_eq!(token.client, "192.168.1.1");
        assert_eq!(token.path, "/apache_pb.gif");
    }

    #[test]
    fn test_tokenize_exactly_seven_fields() {
        let token = tokenize("k f1 f2 f3 f4 f5 /path").unwrap();
        assert_eq!(token.client, "k");
        assert_eq!(token.path, "/path");
    }

    #[test]
    fn test_tokenize_six_fields_is_none() {
        assert_eq!(tokenize("k f1 f2 f3 f4 f5"), None);
    }

    #[test]
    fn test_tokenize_empty_and_blank() {
        assert_eq!(tokenize(""), None);
        assert_eq!(tokenize("   \t  "), None);
    }

    #[test]
    fn test_tokenize_collapses_repeated_separators() {
        let token = tokenize("  k   f1 f2\tf3  f4 f5   /x  trailing").unwrap();
        assert_eq!(token.client, "k");
        assert_eq!(token.path, "/x");
    }
}
