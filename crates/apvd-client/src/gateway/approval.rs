use async_trait::async_trait;
use serde::Serialize;

use apvd_api::DataApprovalItemIdentifier;
use apvd_persistence::DataApprovalRepository;

use super::HttpGateway;
use crate::http::RawResponse;

const REGISTRATIONS_PATH: &str = "/api/completeDataSetRegistrations";
const APPROVALS_PATH: &str = "/api/dataApprovals/approvals";
const UNAPPROVALS_PATH: &str = "/api/dataApprovals/unapprovals";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Registration<'a> {
    data_set: &'a str,
    period: &'a str,
    organisation_unit: &'a str,
    completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Registrations<'a> {
    complete_data_set_registrations: Vec<Registration<'a>>,
}

#[derive(Serialize)]
struct OrgUnitApproval<'a> {
    ou: &'a str,
}

/// Bulk approval of one workflow (or dataset) and period
#[derive(Serialize)]
struct ApprovalRequest<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    wf: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ds: Vec<&'a str>,
    pe: Vec<&'a str>,
    approvals: Vec<OrgUnitApproval<'a>>,
}

/// Group items by (workflow or dataset, period), keeping first-seen order
fn approval_requests(items: &[DataApprovalItemIdentifier]) -> Vec<ApprovalRequest<'_>> {
    let mut requests: Vec<ApprovalRequest<'_>> = Vec::new();
    for item in items {
        let (wf, ds) = match item.workflow.as_deref() {
            Some(workflow) => (vec![workflow], Vec::new()),
            None => (Vec::new(), vec![item.data_set.as_str()]),
        };
        let approval = OrgUnitApproval { ou: &item.org_unit };

        match requests
            .iter_mut()
            .find(|req| req.wf == wf && req.ds == ds && req.pe == [item.period.as_str()])
        {
            Some(request) => request.approvals.push(approval),
            None => requests.push(ApprovalRequest {
                wf,
                ds,
                pe: vec![item.period.as_str()],
                approvals: vec![approval],
            }),
        }
    }
    requests
}

fn accepted(operation: &str, response: &RawResponse) -> bool {
    if !response.is_success() {
        tracing::warn!(
            operation,
            status = response.status,
            body = %response.body,
            "platform rejected approval command"
        );
    }
    response.is_success()
}

impl HttpGateway {
    async fn register(
        &self,
        items: &[DataApprovalItemIdentifier],
        completed: bool,
    ) -> anyhow::Result<bool> {
        if items.is_empty() {
            return Ok(true);
        }

        let body = Registrations {
            complete_data_set_registrations: items
                .iter()
                .map(|item| Registration {
                    data_set: &item.data_set,
                    period: &item.period,
                    organisation_unit: &item.org_unit,
                    completed,
                })
                .collect(),
        };
        let no_query: [(&str, &str); 0] = [];
        let response = self
            .client
            .post_json(REGISTRATIONS_PATH, &no_query, &body)
            .await?;

        let operation = if completed { "complete" } else { "incomplete" };
        Ok(accepted(operation, &response))
    }

    async fn send_approvals(
        &self,
        path: &str,
        items: &[DataApprovalItemIdentifier],
    ) -> anyhow::Result<bool> {
        let no_query: [(&str, &str); 0] = [];
        let mut success = true;
        for request in approval_requests(items) {
            let response = self.client.post_json(path, &no_query, &request).await?;
            success &= accepted(path, &response);
        }
        Ok(success)
    }
}

#[async_trait]
impl DataApprovalRepository for HttpGateway {
    async fn complete(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        self.register(items, true).await
    }

    async fn incomplete(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        self.register(items, false).await
    }

    async fn approve(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        self.send_approvals(APPROVALS_PATH, items).await
    }

    async fn unapprove(&self, items: &[DataApprovalItemIdentifier]) -> anyhow::Result<bool> {
        self.send_approvals(UNAPPROVALS_PATH, items).await
    }
}
