/// Formatted lines ready for one write or load operation, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    lines: Vec<String>,
    byte_size: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a formatted line whose encoded size is `bytes`.
    pub fn push(&mut self, line: String, bytes: usize) {
        self.lines.push(line);
        self.byte_size += bytes;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Cumulative encoded size of all lines.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The concatenation of every line, as sent inline or written to a chunk file.
    pub fn payload(&self) -> String {
        self.lines.concat()
    }
}
