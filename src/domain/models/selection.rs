#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;

use std::collections::BTreeSet;

/// Papers and documents a conversation is scoped to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    paper_ids: BTreeSet<String>,
    document_ids: BTreeSet<String>,
}

impl Selection {
    pub fn new<P, D>(paper_ids: P, document_ids: D) -> Selection
    where
        P: IntoIterator<Item = String>,
        D: IntoIterator<Item = String>,
    {
        return Selection {
            paper_ids: paper_ids.into_iter().collect(),
            document_ids: document_ids.into_iter().collect(),
        };
    }

    /// Parses comma separated id lists, as found in config values.
    pub fn from_lists(papers: &str, documents: &str) -> Selection {
        return Selection::new(split_ids(papers), split_ids(documents));
    }

    pub fn is_empty(&self) -> bool {
        return self.paper_ids.is_empty() && self.document_ids.is_empty();
    }

    pub fn paper_ids(&self) -> Vec<String> {
        return self.paper_ids.iter().cloned().collect();
    }

    pub fn document_ids(&self) -> Vec<String> {
        return self.document_ids.iter().cloned().collect();
    }
}

fn split_ids(text: &str) -> Vec<String> {
    return text
        .split(',')
        .map(|e| return e.trim())
        .filter(|e| return !e.is_empty())
        .map(|e| return e.to_string())
        .collect();
}
