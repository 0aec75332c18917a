use serde::{Deserialize, Serialize};

pub type EmailId = i64;

/// One row of the paginated inbox listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailSummary {
    pub id: EmailId,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "ts", default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub body_snippet: String,
    #[serde(default)]
    pub importance_score: f64,
    #[serde(default)]
    pub is_promotion: bool,
    /// Urgency/importance bucket code assigned by the backend.
    #[serde(default)]
    pub quadrant: Option<String>,
}

/// Urgency/importance quadrant, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UrgentImportant,
        Quadrant::NotUrgentImportant,
        Quadrant::UrgentNotImportant,
        Quadrant::NotUrgentNotImportant,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "urgent_important",
            Quadrant::NotUrgentImportant => "not_urgent_important",
            Quadrant::UrgentNotImportant => "urgent_not_important",
            Quadrant::NotUrgentNotImportant => "not_urgent_not_important",
        }
    }

    /// Missing or unknown codes land in the last quadrant.
    pub fn from_code(code: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|q| Some(q.code()) == code.map(str::trim))
            .unwrap_or(Quadrant::NotUrgentNotImportant)
    }
}

/// Split `items` into the four quadrants, keeping their relative order.
/// Empty quadrants are still returned.
pub fn group_by_quadrant<'a>(
    items: impl IntoIterator<Item = &'a EmailSummary>,
) -> Vec<(Quadrant, Vec<&'a EmailSummary>)> {
    let mut groups: Vec<(Quadrant, Vec<&EmailSummary>)> =
        Quadrant::ALL.into_iter().map(|q| (q, vec![])).collect();
    for email in items {
        let q = email.priority();
        if let Some((_, group)) = groups.iter_mut().find(|(g, _)| *g == q) {
            group.push(email);
        }
    }
    groups
}

impl EmailSummary {
    pub fn priority(&self) -> Quadrant {
        Quadrant::from_code(self.quadrant.as_deref())
    }

    /// Case-insensitive substring match on sender and subject.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.subject.to_lowercase().contains(needle) || self.sender.to_lowercase().contains(needle)
    }
}

/// Full record returned by `GET /emails/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailRecord {
    #[serde(flatten)]
    pub summary: EmailSummary,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
}

/// What the detail pane shows for the selected email.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailDetail {
    pub summary: EmailSummary,
    pub body_text: Option<String>,
    pub recipients: Vec<String>,
    pub thread_id: Option<String>,
    pub external_id: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl EmailDetail {
    pub fn pending(summary: EmailSummary) -> Self {
        Self {
            summary,
            body_text: None,
            recipients: vec![],
            thread_id: None,
            external_id: None,
            loading: true,
            error: None,
        }
    }

    pub fn loaded(record: EmailRecord) -> Self {
        Self {
            summary: record.summary,
            body_text: record.body_text,
            recipients: record.recipients,
            thread_id: record.thread_id,
            external_id: record.external_id,
            loading: false,
            error: None,
        }
    }

    pub fn id(&self) -> EmailId {
        self.summary.id
    }

    /// Body if loaded, falling back to the list snippet.
    pub fn body(&self) -> &str {
        match &self.body_text {
            Some(b) if !b.is_empty() => b,
            _ => &self.summary.body_snippet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_flattens_summary_fields() {
        let json = r#"{
            "id": 5, "sender": "a@x.io", "subject": "Hi", "ts": "2024-01-01T00:00:00",
            "body_snippet": "snip", "importance_score": 0.7, "is_promotion": true,
            "body_text": "full body", "recipients": ["b@x.io"], "thread_id": "t-1",
            "external_id": "ext", "labels": ["INBOX"]
        }"#;
        let rec: EmailRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.summary.id, 5);
        assert!(rec.summary.is_promotion);
        assert_eq!(rec.thread_id.as_deref(), Some("t-1"));

        let detail = EmailDetail::loaded(rec);
        assert!(!detail.loading);
        assert_eq!(detail.body(), "full body");
    }

    #[test]
    fn grouping_keeps_page_order_and_sends_unknown_to_last_quadrant() {
        let email = |id, quadrant: Option<&str>| EmailSummary {
            id,
            quadrant: quadrant.map(String::from),
            ..Default::default()
        };
        let page = vec![
            email(1, Some("urgent_not_important")),
            email(2, Some("urgent_important")),
            email(3, Some("someday")),
            email(4, Some("urgent_important")),
            email(5, None),
        ];

        let groups = group_by_quadrant(&page);
        let ids: Vec<(Quadrant, Vec<EmailId>)> = groups
            .iter()
            .map(|(q, g)| (*q, g.iter().map(|e| e.id).collect()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (Quadrant::UrgentImportant, vec![2, 4]),
                (Quadrant::NotUrgentImportant, vec![]),
                (Quadrant::UrgentNotImportant, vec![1]),
                (Quadrant::NotUrgentNotImportant, vec![3, 5]),
            ]
        );
    }

    #[test]
    fn body_falls_back_to_snippet() {
        let detail = EmailDetail::pending(EmailSummary {
            id: 1,
            body_snippet: "short".into(),
            ..Default::default()
        });
        assert_eq!(detail.body(), "short");
    }
}
