#[cfg(test)]
#[path = "mock_test.rs"]
mod tests;

use crate::domain::models::Document;
use crate::domain::models::DocumentStatus;
use crate::domain::models::DocumentType;
use crate::domain::models::Paper;
use crate::domain::models::SourceCatalog;

/// In-memory catalog of curated papers and uploaded documents, used until the
/// research API exposes its own listing.
pub struct MockCatalog {
    papers: Vec<Paper>,
    documents: Vec<Document>,
}

impl Default for MockCatalog {
    fn default() -> MockCatalog {
        return MockCatalog {
            papers: vec![
                Paper {
                    id: "1".to_string(),
                    arxiv_id: "2301.00001".to_string(),
                    title: "Attention Is All You Need: A Comprehensive Survey".to_string(),
                    authors: vec!["John Doe".to_string(), "Jane Smith".to_string()],
                    summary: "This paper presents a comprehensive survey of transformer architectures...".to_string(),
                    published_date: "2023-01-15T00:00:00Z".to_string(),
                    categories: vec!["cs.AI".to_string(), "cs.LG".to_string()],
                    pdf_url: "https://arxiv.org/pdf/2301.00001".to_string(),
                    source_topic_id: "topic-1".to_string(),
                    curated_at: "2023-01-16T00:00:00Z".to_string(),
                    relevance_score: Some(0.95),
                },
                Paper {
                    id: "2".to_string(),
                    arxiv_id: "2301.00002".to_string(),
                    title: "Large Language Models in Practice".to_string(),
                    authors: vec!["Alice Johnson".to_string()],
                    summary: "An exploration of practical applications of large language models...".to_string(),
                    published_date: "2023-01-20T00:00:00Z".to_string(),
                    categories: vec!["cs.CL".to_string()],
                    pdf_url: "https://arxiv.org/pdf/2301.00002".to_string(),
                    source_topic_id: "topic-1".to_string(),
                    curated_at: "2023-01-21T00:00:00Z".to_string(),
                    relevance_score: Some(0.88),
                },
            ],
            documents: vec![
                Document {
                    id: "doc-1".to_string(),
                    title: "Attention Is All You Need".to_string(),
                    file_name: "attention_paper.pdf".to_string(),
                    file_type: DocumentType::Pdf,
                    file_size_bytes: 2456789,
                    status: DocumentStatus::Ready,
                    error_message: None,
                    uploaded_at: "2024-01-15T00:00:00Z".to_string(),
                    processed_at: Some("2024-01-15T00:05:00Z".to_string()),
                },
                Document {
                    id: "doc-2".to_string(),
                    title: "Neural Architecture Search".to_string(),
                    file_name: "nas_paper.pdf".to_string(),
                    file_type: DocumentType::Pdf,
                    file_size_bytes: 1876543,
                    status: DocumentStatus::Ready,
                    error_message: None,
                    uploaded_at: "2024-01-20T00:00:00Z".to_string(),
                    processed_at: Some("2024-01-20T00:03:00Z".to_string()),
                },
            ],
        };
    }
}

impl SourceCatalog for MockCatalog {
    fn papers(&self) -> Vec<Paper> {
        return self.papers.clone();
    }

    fn documents(&self) -> Vec<Document> {
        return self.documents.clone();
    }
}
