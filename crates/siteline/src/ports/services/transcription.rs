//! Transcription Port
//!
//! Speech-to-text for audio already uploaded to the provider.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, SiteContext};

/// Construction vocabulary every transcription is primed with
pub const CONSTRUCTION_TERMS: &[&str] = &[
    "ליקוי", "ליקויים", "רטיבות", "סדק", "סדקים", "קילוף", "התנפחות", "טיח", "ריצוף", "אריחים",
    "איטום", "נזילה", "עובש", "בטון", "שלד", "תשתית", "ביסוס", "פיגום", "אינסטלציה", "חשמל", "גבס",
    "פרקט", "חלון", "דלת", "מסגרת", "קבלן", "קבלן משנה", "מפקח", "דירה", "קומה", "יחידה", "תיקון",
    "טיפול", "אחריות", "בדיקה", "פרוטוקול",
];

/// Vocabulary hints for a transcription
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptionContext {
    /// Key/value description of the domain
    pub general: Vec<(String, String)>,
    /// Terms the recognizer should prefer
    pub terms: Vec<String>,
}

impl TranscriptionContext {
    /// Construction vocabulary plus the site's own locations and suppliers
    pub fn for_site(context: &SiteContext) -> Self {
        let terms = CONSTRUCTION_TERMS
            .iter()
            .map(|t| t.to_string())
            .chain(context.locations.iter().cloned())
            .chain(context.suppliers.iter().cloned())
            .collect();

        Self {
            general: vec![
                ("domain".to_string(), "ניהול ליקויי בנייה".to_string()),
                ("topic".to_string(), "דיווח ליקויים באתר בנייה".to_string()),
            ],
            terms,
        }
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        file_id: &str,
        context: &TranscriptionContext,
    ) -> Result<String, DomainError>;
}
