//! Named query record model (component B, §3 "Named query").

#[derive(Debug, Clone)]
pub struct NamedQuery {
    pub namespace: String,
    pub name: String,
    pub source: String,
    pub parameters: Vec<String>,
    pub creator: Option<String>,
}

impl NamedQuery {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, source: impl Into<String>) -> Self {
        NamedQuery {
            namespace: namespace.into(),
            name: name.into(),
            source: source.into(),
            parameters: Vec::new(),
            creator: None,
        }
    }
}
