//! Log sources: where the raw access log comes from
//!
//! The orchestrator only sees [`LogSource::fetch`]; transport concerns such as
//! timeouts belong to the concrete source.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Location of the access log analysed by default
pub const DEFAULT_LOG_URL: &str =
    "http://dev.inspiringapps.com/Files/IAChallenge/30E02AAA-B947-4D4B-8FB6-9C57C43872A9/Apache.log";

/// Errors raised while obtaining the log
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Log source unavailable: {0}")]
    Unavailable(String),
}

/// A source of raw log lines
pub trait LogSource: Send {
    /// Fetch the complete log as a sequence of lines
    fn fetch(&self) -> Result<Vec<String>, FetchError>;

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}

/// Split raw log content into lines (`\n` or `\r\n` terminated)
pub fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_owned).collect()
}

/// Log served over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpLogSource {
    url: String,
    timeout: Duration,
}

impl HttpLogSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LogSource for HttpLogSource {
    fn fetch(&self) -> Result<Vec<String>, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(&self.url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.text()?;
        Ok(split_lines(&body))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Log read from the local filesystem
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSource for FileLogSource {
    fn fetch(&self) -> Result<Vec<String>, FetchError> {
        let bytes = fs::read(&self.path).map_err(|source| FetchError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(split_lines(&String::from_utf8_lossy(&bytes)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory log
#[derive(Debug, Clone, Default)]
pub struct StaticLogSource {
    lines: Vec<String>,
}

impl StaticLogSource {
    pub fn new<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_content(content: &str) -> Self {
        Self {
            lines: split_lines(content),
        }
    }
}

impl LogSource for StaticLogSource {
    fn fetch(&self) -> Result<Vec<String>, FetchError> {
        Ok(self.lines.clone())
    }

    fn describe(&self) -> String {
        format!("<{} static lines>", self.lines.len())
    }
}

impl<L: LogSource + ?Sized> LogSource for Box<L> {
    fn fetch(&self) -> Result<Vec<String>, FetchError> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_split_lines_handles_crlf() {
        let lines = split_lines("a b\r\nc d\n\ne f");
        assert_eq!(lines, vec!["a b", "c d", "", "e f"]);
    }

    #[test]
    fn test_single_line_without_newline() {
        assert_eq!(split_lines("split"), vec!["split"]);
    }

    #[test]
    fn test_file_source_reads_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1.1.1.1 - - [x] \"GET /a HTTP/1.1\" 200").unwrap();
        writeln!(file, "short").unwrap();

        let source = FileLogSource::new(file.path());
        let lines = source.fetch().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "short");
    }

    #[test]
    fn test_file_source_missing_file() {
        let source = FileLogSource::new("/nonexistent/access.log");
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/access.log"));
    }

    #[test]
    fn test_static_source() {
        let source = StaticLogSource::from_content("l1\nl2\n");
        assert_eq!(source.fetch().unwrap(), vec!["l1", "l2"]);
        assert_eq!(source.describe(), "<2 static lines>");
    }
}
