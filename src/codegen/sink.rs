//! Output channels of one generated file

use crate::link::{encode_records, LinkRecord};

/// Accumulates the replacement text and the link records of one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sink {
    /// Text replacing the annotated source in place
    pub inplace: String,
    /// Deferred registration records, in emission order
    pub link: Vec<LinkRecord>,
    /// Whether the file being generated is a header
    pub is_header: bool,
}

impl Sink {
    pub fn new(is_header: bool) -> Self {
        Self {
            is_header,
            ..Self::default()
        }
    }

    pub fn push_link(&mut self, record: LinkRecord) {
        self.link.push(record);
    }

    /// Link records in their line-protocol form
    pub fn link_text(&self) -> String {
        encode_records(&self.link)
    }
}
