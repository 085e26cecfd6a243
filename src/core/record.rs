/// One decoded record of a combined alignment file: the read name, its
/// sequence and qualities, and the string-valued tags callers asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedRecord {
    pub name: String,

    /// Bases as uppercase ASCII
    pub sequence: Vec<u8>,

    /// Phred+33 encoded qualities, same length as `sequence`
    pub qualities: Vec<u8>,

    tags: Vec<([u8; 2], String)>,
}

impl CombinedRecord {
    pub fn new(name: impl Into<String>, sequence: Vec<u8>, qualities: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            sequence,
            qualities,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: &str, value: impl Into<String>) -> Self {
        self.insert_tag(tag, value);
        self
    }

    /// Set a two-letter tag, replacing any previous value
    pub fn insert_tag(&mut self, tag: &str, value: impl Into<String>) {
        let Some(key) = tag_key(tag) else {
            return;
        };
        let value = value.into();
        match self.tags.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.tags.push((key, value)),
        }
    }

    /// Value of a two-letter tag
    pub fn tag(&self, tag: &str) -> Option<&str> {
        let key = tag_key(tag)?;
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_tags<'t>(&self, tags: impl IntoIterator<Item = &'t str>) -> bool {
        tags.into_iter().all(|t| self.tag(t).is_some())
    }
}

fn tag_key(tag: &str) -> Option<[u8; 2]> {
    match tag.as_bytes() {
        &[a, b] => Some([a, b]),
        _ => None,
    }
}
