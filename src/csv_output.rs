//! CSV output format for sequence reports
//!
//! One row per sequence, columns `count,path_1,path_2,path_3`, highest count
//! first.

use crate::sequence::Sequence;

/// CSV output formatter
#[derive(Debug, Default)]
pub struct CsvOutput {
    sequences: Vec<Sequence>,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sequence(&mut self, sequence: Sequence) {
        self.sequences.push(sequence);
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_sequence(sequence: &Sequence) -> String {
        [
            sequence.count.to_string(),
            Self::escape_field(&sequence.path_1),
            Self::escape_field(&sequence.path_2),
            Self::escape_field(&sequence.path_3),
        ]
        .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::from("count,path_1,path_2,path_3\n");

        for sequence in &self.sequences {
            output.push_str(&Self::format_sequence(sequence));
            output.push('\n');
        }

        output
    }
}

impl FromIterator<Sequence> for CsvOutput {
    fn from_iter<I: IntoIterator<Item = Sequence>>(iter: I) -> Self {
        Self {
            sequences: iter.into_iter().collect(),
        }
    }
}
