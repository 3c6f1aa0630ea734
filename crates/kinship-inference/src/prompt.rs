//! Prompt assembly for per-contact suggestion generation.

use chrono::{DateTime, Utc};

use kinship_core::{Contact, Interaction};

/// System role for every suggestion request.
pub const SYSTEM_PROMPT: &str =
    "You are a relationship manager assistant helping users maintain meaningful connections.";

/// Static suggestion written for users without an active premium plan.
///
/// Counted as a successful attempt; the model is never called.
pub const UPSELL_SUGGESTION: &str =
    "Upgrade to premium to get personalized AI suggestions for staying in touch!";

/// Build the user prompt for one contact.
///
/// Includes the contact's profile and their recent activity in chronological
/// order. `reference` anchors the "days ago" computation so the prompt is
/// reproducible in tests.
pub fn build_suggestion_prompt(
    contact: &Contact,
    recent_interactions: &[Interaction],
    reference: DateTime<Utc>,
) -> String {
    let last_contacted = match contact.last_contacted {
        Some(ts) => {
            let days = (reference - ts).num_days().max(0);
            format!("{} days ago", days)
        }
        None => "Never".to_string(),
    };

    let mut interactions: Vec<&Interaction> = recent_interactions.iter().collect();
    interactions.sort_by_key(|i| i.date);
    let activity = if interactions.is_empty() {
        "None".to_string()
    } else {
        interactions
            .iter()
            .map(|i| {
                format!(
                    "- {}: {} ({})",
                    i.date.format("%Y-%m-%d"),
                    i.kind,
                    i.sentiment.map(|s| s.as_str()).unwrap_or("neutral")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    [
        "Analyze this contact's information and provide 2-3 highly impactful suggestions to strengthen the relationship:".to_string(),
        String::new(),
        "Contact Details:".to_string(),
        format!("- Name: {}", contact.name),
        format!("- Last contacted: {}", last_contacted),
        format!(
            "- Preferred method: {}",
            contact
                .preferred_contact_method
                .map(|m| m.as_str())
                .unwrap_or("Not specified")
        ),
        format!(
            "- Preferred contact frequency: {}",
            contact
                .contact_frequency
                .map(|f| f.as_str())
                .unwrap_or("Not specified")
        ),
        format!("- Relationship level: {}/5", contact.relationship_level),
        format!("- Notes: {}", contact.notes.as_deref().unwrap_or("None")),
        String::new(),
        "Recent Activity (chronological):".to_string(),
        activity,
        String::new(),
        "Rules for Suggestions:".to_string(),
        "1. Must be specific to their context and personal details — no generic advice".to_string(),
        "2. Must be actionable within 24-48 hours".to_string(),
        "3. Must clearly contribute to relationship growth".to_string(),
        "4. Each suggestion should start with \"[type: call/message/social]\"".to_string(),
        "5. Keep suggestions concise and impactful".to_string(),
        "6. If no clear opportunities exist, return no suggestions".to_string(),
        String::new(),
        "Provide ONLY the most impactful 1-2 suggestions, each on a new line starting with \"•\"".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kinship_core::{ContactFrequency, ContactMethod, Sentiment};
    use uuid::Uuid;

    fn contact() -> Contact {
        Contact {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Ada".to_string(),
            notes: Some("Loves hiking".to_string()),
            relationship_level: 4,
            contact_frequency: Some(ContactFrequency::Weekly),
            preferred_contact_method: Some(ContactMethod::Call),
            missed_interactions: 0,
            last_contacted: None,
            next_contact_due: Utc::now(),
            ai_last_suggestion: None,
            ai_last_suggestion_date: None,
        }
    }

    #[test]
    fn prompt_includes_profile_fields() {
        let prompt = build_suggestion_prompt(&contact(), &[], Utc::now());
        assert!(prompt.contains("- Name: Ada"));
        assert!(prompt.contains("- Preferred method: call"));
        assert!(prompt.contains("- Preferred contact frequency: weekly"));
        assert!(prompt.contains("- Relationship level: 4/5"));
        assert!(prompt.contains("- Notes: Loves hiking"));
    }

    #[test]
    fn never_contacted_reads_never() {
        let prompt = build_suggestion_prompt(&contact(), &[], Utc::now());
        assert!(prompt.contains("- Last contacted: Never"));
    }

    #[test]
    fn days_since_last_contact_uses_reference() {
        let reference: DateTime<Utc> = "2026-03-10T12:00:00Z".parse().unwrap();
        let mut c = contact();
        c.last_contacted = Some(reference - Duration::days(9));
        let prompt = build_suggestion_prompt(&c, &[], reference);
        assert!(prompt.contains("- Last contacted: 9 days ago"));
    }

    #[test]
    fn interactions_listed_chronologically() {
        let reference: DateTime<Utc> = "2026-03-10T12:00:00Z".parse().unwrap();
        let c = contact();
        let older = Interaction {
            id: Uuid::new_v4(),
            contact_id: c.id,
            kind: "call".to_string(),
            date: reference - Duration::days(5),
            sentiment: Some(Sentiment::Positive),
        };
        let newer = Interaction {
            id: Uuid::new_v4(),
            contact_id: c.id,
            kind: "message".to_string(),
            date: reference - Duration::days(1),
            sentiment: None,
        };
        // Newest-first input, as the repository returns it.
        let prompt = build_suggestion_prompt(&c, &[newer, older], reference);
        let call_pos = prompt.find("2026-03-05: call (positive)").unwrap();
        let msg_pos = prompt.find("2026-03-09: message (neutral)").unwrap();
        assert!(call_pos < msg_pos);
    }

    #[test]
    fn empty_activity_reads_none() {
        let prompt = build_suggestion_prompt(&contact(), &[], Utc::now());
        assert!(prompt.contains("Recent Activity (chronological):\nNone"));
    }
}
