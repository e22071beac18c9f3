//! Prompt pieces: the assistant persona and the directory addendum.

use directory_store::DirectoryRecord;

/// System instruction sent with every chat request.
pub const DEFAULT_SYSTEM: &str = r#"
You are a helpful and cautious AI Healthcare Assistant. You can provide general dietary advice, check mild symptoms, and give standard information on medicines.
CRITICAL RULES:
1. Always include a short disclaimer that you are an AI and the user must consult a real doctor for medical advice.
2. If the user asks for a doctor recommendation, use the local directory information provided in the prompt context to suggest a specialist.
"#;

/// Renders one line per record, newline-joined. Empty input yields `""`.
///
/// # Example
/// ```
/// # use contextor::prompt::format_addendum;
/// # use directory_store::DirectoryRecord;
/// let r = DirectoryRecord::new("Dr. A", "Cardiologist", "Fortis", "Bangalore", None, "080-1");
/// assert_eq!(
///     format_addendum(&[r]),
///     "- Dr. A (Cardiologist) at Fortis, Bangalore. Contact: 080-1"
/// );
/// ```
pub fn format_addendum(records: &[DirectoryRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "- {} ({}) at {}, {}. Contact: {}",
                r.name, r.specialty, r.facility, r.locality, r.contact
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Appends the bracketed directory note to `user_text` when there is anything to show.
///
/// `user_text` is always a prefix of the result.
pub fn build_contextual_prompt(user_text: &str, records: &[DirectoryRecord]) -> String {
    let addendum = format_addendum(records);
    if addendum.is_empty() {
        return user_text.to_string();
    }
    format!(
        "{user_text}\n\n[System Note: Here is the local doctor directory:\n{addendum}\nRecommend a suitable one if applicable.]"
    )
}
