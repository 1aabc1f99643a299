#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroqModel {
    #[default]
    Llama31Instant, // "llama-3.1-8b-instant"
    Llama33Versatile, // "llama-3.3-70b-versatile"
    Override(String),
}

impl GroqModel {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Llama31Instant => "llama-3.1-8b-instant",
            Self::Llama33Versatile => "llama-3.3-70b-versatile",
            Self::Override(s) => s.as_str(),
        }
    }
}

impl From<String> for GroqModel {
    fn from(id: String) -> Self {
        match id.as_str() {
            "llama-3.1-8b-instant" => Self::Llama31Instant,
            "llama-3.3-70b-versatile" => Self::Llama33Versatile,
            _ => Self::Override(id),
        }
    }
}
