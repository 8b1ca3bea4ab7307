/// A reference to a paper or document backing part of an assistant reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Citation {
    pub source_id: String,
    pub title: String,
    pub section: Option<String>,
    pub snippet: Option<String>,
}

impl Citation {
    pub fn new(source_id: &str, title: &str, section: Option<&str>) -> Citation {
        return Citation {
            source_id: source_id.to_string(),
            title: title.to_string(),
            section: section.map(|e| return e.to_string()),
            snippet: None,
        };
    }

    pub fn with_snippet(mut self, snippet: &str) -> Citation {
        self.snippet = Some(snippet.to_string());
        return self;
    }

    pub fn label(&self) -> String {
        if let Some(section) = &self.section {
            return format!("{} ({section})", self.title);
        }

        return self.title.to_string();
    }
}
