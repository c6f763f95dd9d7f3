//! HTTP client for the spreadsheet-backed webhook store.
//!
//! Every operation is a single attempt: no retries, no cancellation. The
//! heterogeneous responses the store produces (JSON envelope, bare error
//! text, non-2xx status) are all folded into `RelayError` here so nothing
//! past this boundary has to look at raw bodies.

use crate::config::RelayConfig;
use crate::normalize::{coerce_string, normalize_lead, normalize_worksheet};
use crate::patch::Patch;
use crate::types::{Lead, Worksheet};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RelayError {
    #[error("relay url or secret is not configured")]
    ConfigurationMissing,
    #[error("relay unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("unparseable relay response: {0}")]
    UpstreamMalformed(String),
    #[error("no row for lead {id}: {message}")]
    RecordNotFound { id: u64, message: String },
}

/// The store only reports write failures as `{"ok":false,"error":...}`;
/// a message about a missing row becomes `RecordNotFound`, anything else
/// surfaces verbatim.
fn classify_write_error(id: u64, err: RelayError) -> RelayError {
    match err {
        RelayError::UpstreamUnavailable(message) => {
            let lower = message.to_lowercase();
            if lower.contains("no such") || lower.contains("not found") {
                RelayError::RecordNotFound { id, message }
            } else {
                RelayError::UpstreamUnavailable(message)
            }
        }
        other => other,
    }
}

#[derive(Debug)]
pub struct RelayClient {
    client: reqwest::Client,
    url: String,
    secret: String,
}

impl RelayClient {
    /// Fails fast when the endpoint or credential is blank, so a
    /// misconfigured deployment dies at startup rather than on first use.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        if config.url.trim().is_empty() || config.secret.trim().is_empty() {
            return Err(RelayError::ConfigurationMissing);
        }
        Ok(RelayClient {
            client: reqwest::Client::new(),
            url: config.url,
            secret: config.secret,
        })
    }

    /// Fetches every lead row, normalized, in store (insertion) order.
    pub async fn list_leads(&self) -> Result<Vec<Lead>, RelayError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("agent", "1"),
                ("secret", self.secret.as_str()),
                ("action", "listLeads"),
            ])
            .send()
            .await
            .map_err(|err| RelayError::UpstreamUnavailable(err.to_string()))?;

        let body = read_ok_body(response).await?;
        let rows = body
            .get("rows")
            .and_then(Value::as_array)
            .ok_or_else(|| RelayError::UpstreamMalformed("response has no rows".to_string()))?;

        Ok(rows
            .iter()
            .filter_map(Value::as_object)
            .map(normalize_lead)
            .collect())
    }

    /// Applies a sparse patch to one lead row. The store merges the patch
    /// keys over the row; acknowledgement only, no record comes back.
    pub async fn update_lead(&self, patch: &Patch) -> Result<(), RelayError> {
        let body = json!({
            "agent": 1,
            "secret": self.secret,
            "action": "updateLead",
            "id": patch.id,
            "patch": patch.fields,
        });

        tracing::info!(id = patch.id, "updating lead");
        self.post_ack(body)
            .await
            .map_err(|err| classify_write_error(patch.id, err))?;
        Ok(())
    }

    /// Customer updates go through a flat record shape rather than a
    /// nested patch; that is the store's contract for this action.
    pub async fn update_customer(&self, patch: &Patch) -> Result<(), RelayError> {
        let mut body = Map::new();
        body.insert("action".to_string(), json!("updateCustomer"));
        body.insert("secret".to_string(), json!(self.secret));
        body.insert("id".to_string(), json!(patch.id));
        for (key, value) in &patch.fields {
            body.insert(key.clone(), value.clone());
        }

        tracing::info!(id = patch.id, "updating customer");
        self.post_ack(Value::Object(body))
            .await
            .map_err(|err| classify_write_error(patch.id, err))?;
        Ok(())
    }

    /// Replaces the stored worksheet for a lead wholesale. Last write wins.
    pub async fn save_worksheet(&self, id: u64, worksheet: &Worksheet) -> Result<(), RelayError> {
        let mut body = json!({
            "agent": 1,
            "secret": self.secret,
            "action": "saveworksheet",
            "id": id,
        });
        if let (Value::Object(map), Ok(Value::Object(fields))) =
            (&mut body, serde_json::to_value(worksheet))
        {
            map.extend(fields);
        }

        tracing::info!(id, "saving worksheet");
        self.post_ack(body)
            .await
            .map_err(|err| classify_write_error(id, err))?;
        Ok(())
    }

    /// Loads every stored worksheet, keyed by lead id. Keys that do not
    /// parse as row ids are skipped.
    pub async fn load_worksheets(&self) -> Result<HashMap<u64, Worksheet>, RelayError> {
        let body = json!({
            "agent": 1,
            "secret": self.secret,
            "action": "loadworksheets",
        });

        let body = self.post_ack(body).await?;
        let raw = body
            .get("worksheets")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                RelayError::UpstreamMalformed("response has no worksheets".to_string())
            })?;

        let mut worksheets = HashMap::new();
        for (key, value) in raw {
            let Ok(id) = key.trim().parse::<u64>() else {
                tracing::warn!(%key, "skipping worksheet with non-numeric key");
                continue;
            };
            if let Value::Object(fields) = value {
                worksheets.insert(id, normalize_worksheet(fields));
            }
        }
        Ok(worksheets)
    }

    /// Forwards a quote-form submission as form-encoded pairs, which is
    /// what the store's intake handler expects. The intake handler may
    /// answer plain text on success, so only an explicit `ok:false` or a
    /// non-2xx status counts as failure.
    pub async fn submit_intake(&self, fields: &Map<String, Value>) -> Result<(), RelayError> {
        let mut form: Vec<(String, String)> = fields
            .iter()
            .map(|(key, value)| (key.clone(), coerce_string(value)))
            .collect();
        form.push(("secret".to_string(), self.secret.clone()));

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|err| RelayError::UpstreamUnavailable(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| RelayError::UpstreamUnavailable(err.to_string()))?;
        if !status.is_success() {
            return Err(RelayError::UpstreamUnavailable(format!("HTTP {status}")));
        }
        if let Ok(body) = serde_json::from_str::<Value>(&text)
            && body.get("ok").and_then(Value::as_bool) == Some(false)
        {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or(&text)
                .to_string();
            return Err(RelayError::UpstreamUnavailable(message));
        }
        Ok(())
    }

    /// Forwards a claim-form submission. Claims are routed by a `type`
    /// marker the store switches on; `source` gets a default when the form
    /// did not set one.
    pub async fn submit_claim(&self, fields: &Map<String, Value>) -> Result<(), RelayError> {
        let mut body = fields.clone();
        body.insert("type".to_string(), json!("claim"));
        if coerce_string(body.get("source").unwrap_or(&Value::Null)).is_empty() {
            body.insert("source".to_string(), json!("website-claim"));
        }
        body.insert("secret".to_string(), json!(self.secret));

        self.post_ack(Value::Object(body)).await?;
        Ok(())
    }

    async fn post_ack(&self, body: Value) -> Result<Value, RelayError> {
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|err| RelayError::UpstreamUnavailable(err.to_string()))?;
        read_ok_body(response).await
    }
}

/// Folds the store's response into success JSON or a typed failure: non-2xx
/// wins over any body, then the body must parse, then the `ok` flag must be
/// true.
async fn read_ok_body(response: reqwest::Response) -> Result<Value, RelayError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| RelayError::UpstreamUnavailable(err.to_string()))?;

    if !status.is_success() {
        return Err(RelayError::UpstreamUnavailable(format!("HTTP {status}")));
    }

    let body: Value = serde_json::from_str(&text).map_err(|_| {
        tracing::warn!("relay answered with a non-JSON body");
        RelayError::UpstreamMalformed(text.clone())
    })?;

    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("upstream rejected the request")
            .to_string();
        return Err(RelayError::UpstreamUnavailable(message));
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::DEFAULT_COVERAGE;
    use crate::patch::build_patch;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RelayClient {
        RelayClient::new(RelayConfig {
            url: server.uri(),
            secret: "test-secret".to_string(),
        })
        .unwrap()
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn blank_config_fails_fast() {
        let err = RelayClient::new(RelayConfig {
            url: "".to_string(),
            secret: "s".to_string(),
        })
        .unwrap_err();
        assert_eq!(err, RelayError::ConfigurationMissing);
    }

    #[tokio::test]
    async fn list_leads_normalizes_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("action", "listLeads"))
            .and(query_param("secret", "test-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "rows": [{"id": 1, "name": "Jane"}],
            })))
            .mount(&server)
            .await;

        let leads = client_for(&server).list_leads().await.unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].id, 1);
        assert_eq!(leads[0].name, "Jane");
        assert_eq!(leads[0].coverage, DEFAULT_COVERAGE);
    }

    #[tokio::test]
    async fn http_failure_wins_over_body_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"ok": true, "rows": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).list_leads().await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed_with_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Script error: quota"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_leads().await.unwrap_err();
        assert_eq!(
            err,
            RelayError::UpstreamMalformed("Script error: quota".to_string())
        );
    }

    #[tokio::test]
    async fn missing_row_message_maps_to_record_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"action": "updateLead", "id": 5})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "no such row"})),
            )
            .mount(&server)
            .await;

        let patch = build_patch(fields(json!({"id": 5, "agent": "Kelly"}))).unwrap();
        let err = client_for(&server).update_lead(&patch).await.unwrap_err();
        assert_eq!(
            err,
            RelayError::RecordNotFound {
                id: 5,
                message: "no such row".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn other_rejections_surface_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": false, "error": "sheet is locked"})),
            )
            .mount(&server)
            .await;

        let patch = build_patch(fields(json!({"id": 5, "agent": "Kelly"}))).unwrap();
        let err = client_for(&server).update_lead(&patch).await.unwrap_err();
        assert_eq!(
            err,
            RelayError::UpstreamUnavailable("sheet is locked".to_string())
        );
    }

    #[tokio::test]
    async fn update_lead_sends_id_and_sparse_patch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "agent": 1,
                "secret": "test-secret",
                "action": "updateLead",
                "id": 7,
                "patch": {"status": ""},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let patch = build_patch(fields(json!({"id": 7, "status": ""}))).unwrap();
        client_for(&server).update_lead(&patch).await.unwrap();
    }

    #[tokio::test]
    async fn save_worksheet_sends_the_whole_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "action": "saveworksheet",
                "id": 4,
                "coveragePackage": "Standard",
                "discounts": ["Military"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let worksheet = Worksheet {
            coverage_package: "Standard".to_string(),
            discounts: vec!["Military".to_string()],
            ..Worksheet::default()
        };
        client_for(&server)
            .save_worksheet(4, &worksheet)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn load_worksheets_skips_bad_keys_and_normalizes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"action": "loadworksheets"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "worksheets": {
                    "4": {"coveragePackage": "Standard", "discounts": "Military, Safe Driver"},
                    "total": {"coveragePackage": "bogus"},
                },
            })))
            .mount(&server)
            .await;

        let worksheets = client_for(&server).load_worksheets().await.unwrap();
        assert_eq!(worksheets.len(), 1);
        let ws = &worksheets[&4];
        assert_eq!(ws.coverage_package, "Standard");
        assert_eq!(ws.discounts, vec!["Military", "Safe Driver"]);
    }

    #[tokio::test]
    async fn worksheet_round_trip_is_idempotent() {
        // normalize ∘ serialize ∘ parse == normalize
        let raw = fields(json!({
            "coveragePackage": "Standard",
            "discounts": "Military, Safe Driver ",
            "notes": "called twice",
        }));
        let once = normalize_worksheet(&raw);
        let wire = serde_json::to_value(&once).unwrap();
        let again = normalize_worksheet(wire.as_object().unwrap());
        assert_eq!(once, again);
    }

    #[tokio::test]
    async fn intake_tolerates_plain_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let form = fields(json!({"name": "Jane", "zip": "30188"}));
        client_for(&server).submit_intake(&form).await.unwrap();
    }

    #[tokio::test]
    async fn claim_gets_type_and_default_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "type": "claim",
                "source": "website-claim",
                "name": "Jane",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let form = fields(json!({"name": "Jane"}));
        client_for(&server).submit_claim(&form).await.unwrap();
    }
}
