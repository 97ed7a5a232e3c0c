//! Import summary extraction
//!
//! Value writes answer with an import summary, either bare or wrapped in a
//! `response` envelope when the platform reports a failure status. Whatever
//! the status, counters and conflicts are turned into `Stats`.

use serde::Deserialize;

use apvd_common::{ErrorMessage, Stats};

use crate::http::RawResponse;

#[derive(Debug, Default, Deserialize)]
struct ImportCount {
    #[serde(default)]
    imported: u64,
    #[serde(default)]
    updated: u64,
    #[serde(default)]
    ignored: u64,
    #[serde(default)]
    deleted: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Conflict {
    #[serde(default)]
    object: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    error_code: Option<String>,
}

impl Conflict {
    fn into_error_message(self) -> ErrorMessage {
        let code = self.error_code.unwrap_or_else(|| "UNKNOWN".to_string());
        ErrorMessage::new(self.object, format!("ERROR: {}: {}", code, self.value))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    import_count: Option<ImportCount>,
    #[serde(default)]
    conflicts: Vec<Conflict>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: ImportSummary,
}

impl ImportSummary {
    fn into_stats(self) -> Stats {
        let count = self.import_count.unwrap_or_default();
        Stats {
            imported: count.imported,
            updated: count.updated,
            ignored: count.ignored,
            deleted: count.deleted,
            error_messages: self
                .conflicts
                .into_iter()
                .map(Conflict::into_error_message)
                .collect(),
        }
    }

    fn has_content(&self) -> bool {
        self.import_count.is_some() || !self.conflicts.is_empty()
    }
}

fn parse_summary(body: &str) -> Option<ImportSummary> {
    serde_json::from_str::<Envelope>(body)
        .ok()
        .map(|envelope| envelope.response)
        .filter(ImportSummary::has_content)
        .or_else(|| {
            serde_json::from_str::<ImportSummary>(body)
                .ok()
                .filter(ImportSummary::has_content)
        })
}

/// Stats of one write request, never failing
///
/// `id` labels the error reported when the body carries no import summary.
pub fn stats_from_response(id: &str, response: &RawResponse) -> Stats {
    match parse_summary(&response.body) {
        Some(summary) => {
            let description = summary.description.clone();
            let mut stats = summary.into_stats();
            if !response.is_success() && !stats.has_errors() {
                let message = description
                    .unwrap_or_else(|| format!("request failed with status {}", response.status));
                stats.error_messages.push(ErrorMessage::new(id, message));
            }
            stats
        }
        None if response.is_success() => Stats::empty(),
        None => {
            tracing::warn!(status = response.status, "unparseable import summary");
            Stats::with_error(id, failure_message(response))
        }
    }
}

/// Zero-effect stats for a request that never produced a response
pub fn stats_from_error(id: &str, error: &crate::ClientError) -> Stats {
    Stats::with_error(id, error.to_string())
}

fn failure_message(response: &RawResponse) -> String {
    #[derive(Deserialize)]
    struct Message {
        message: String,
    }

    serde_json::from_str::<Message>(&response.body)
        .map(|m| m.message)
        .unwrap_or_else(|_| format!("request failed with status {}", response.status))
}
