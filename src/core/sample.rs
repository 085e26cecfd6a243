/// A bounded window of reads sampled from each input file.
///
/// Files keep the order the caller supplied them in; read `i` of every file
/// belongs to the same sequenced fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSample {
    files: Vec<String>,
    reads: Vec<Vec<String>>,
}

impl ReadSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the sampled reads of the next input file
    pub fn push(&mut self, file: impl Into<String>, reads: Vec<String>) {
        self.files.push(file.into());
        self.reads.push(reads);
    }

    /// Input file identifiers in caller order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Sampled reads of input file `index`
    pub fn reads(&self, index: usize) -> &[String] {
        &self.reads[index]
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of read positions usable across all files (the shortest file wins)
    pub fn len(&self) -> usize {
        self.reads.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for ReadSample {
    fn from_iter<I: IntoIterator<Item = (S, Vec<String>)>>(iter: I) -> Self {
        let mut sample = Self::new();
        for (file, reads) in iter {
            sample.push(file, reads);
        }
        sample
    }
}
