#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub summary: String,
    pub published_date: String,
    pub categories: Vec<String>,
    pub pdf_url: String,
    pub source_topic_id: String,
    pub curated_at: String,
    /// Between 0 and 1.
    pub relevance_score: Option<f32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Image,
    Word,
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub file_type: DocumentType,
    pub file_size_bytes: u64,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub uploaded_at: String,
    pub processed_at: Option<String>,
}

/// Ids split by the kind of source they resolve to.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PartitionedIds {
    pub paper_ids: Vec<String>,
    pub document_ids: Vec<String>,
    pub unknown: Vec<String>,
}

/// Read-only view of the papers and documents a conversation may reference.
pub trait SourceCatalog {
    fn papers(&self) -> Vec<Paper>;

    fn documents(&self) -> Vec<Document>;

    fn search_papers(&self, query: &str) -> Vec<Paper> {
        let query = query.to_lowercase();
        return self
            .papers()
            .into_iter()
            .filter(|e| return e.title.to_lowercase().contains(&query))
            .collect();
    }

    fn search_documents(&self, query: &str) -> Vec<Document> {
        let query = query.to_lowercase();
        return self
            .documents()
            .into_iter()
            .filter(|e| return e.title.to_lowercase().contains(&query))
            .collect();
    }

    /// Splits a mixed list of ids into papers and documents. Ids matching
    /// neither are reported as unknown.
    fn partition(&self, ids: &[String]) -> PartitionedIds {
        let papers = self.papers();
        let documents = self.documents();
        let mut res = PartitionedIds::default();

        for id in ids {
            if papers.iter().any(|e| return &e.id == id) {
                res.paper_ids.push(id.to_string());
            } else if documents.iter().any(|e| return &e.id == id) {
                res.document_ids.push(id.to_string());
            } else {
                res.unknown.push(id.to_string());
            }
        }

        return res;
    }
}
