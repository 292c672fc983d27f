//! Assembly API endpoints
//!
//! Submission posts a signed `params` JSON document as form data; status
//! polling follows the assembly URL the service hands back on submit.

use async_trait::async_trait;
use chrono::Utc;
use offload_core::{AssemblySpec, AssemblyStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};
use crate::{TranscoderApi, TranscoderClient, ensure_ok, signature};

/// One recorded webhook delivery attempt for an assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub assembly_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub response_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct NotificationList {
    #[serde(default)]
    items: Vec<Notification>,
}

#[async_trait]
impl TranscoderApi for TranscoderClient {
    async fn submit(&self, spec: &AssemblySpec) -> Result<AssemblyStatus> {
        let params = self.assembly_params(spec);
        let params_json = serde_json::to_string(&params)
            .map_err(|e| ClientError::Parse(format!("failed to encode params: {e}")))?;
        let signature = signature::sign(params_json.as_bytes(), &self.credentials().auth_secret);

        let url = format!("{}/assemblies", self.base_url());
        let response = self
            .http()
            .post(&url)
            .form(&[("params", params_json.as_str()), ("signature", signature.as_str())])
            .send()
            .await?;

        let status: AssemblyStatus = self.handle_response(response).await?;
        tracing::debug!(
            assembly_id = %status.assembly_id,
            ok = status.ok.as_deref().unwrap_or_default(),
            "assembly submitted"
        );
        ensure_ok(status)
    }

    async fn fetch(&self, assembly_url: &str) -> Result<AssemblyStatus> {
        let response = self.http().get(assembly_url).send().await?;
        self.handle_response(response).await
    }

    async fn notifications(&self, assembly_id: &str) -> Result<Vec<Notification>> {
        let url = format!(
            "{}/assembly_notifications?assembly_id={}",
            self.base_url(),
            assembly_id
        );
        let response = self.http().get(&url).send().await?;
        let list: NotificationList = self.handle_response(response).await?;
        Ok(list.items)
    }
}

impl TranscoderClient {
    /// The signed `params` document for one assembly submission
    ///
    /// A fresh auth expiry is generated per request, so specs can be built
    /// ahead of time without going stale.
    fn assembly_params(&self, spec: &AssemblySpec) -> Value {
        let mut params = Map::new();
        params.insert(
            "auth".to_string(),
            serde_json::json!({
                "key": self.credentials().auth_key,
                "expires": auth_expires(),
            }),
        );

        let steps = spec.steps_by_name();
        if !steps.is_empty() {
            params.insert("steps".to_string(), Value::Object(steps));
        }
        if let Some(template_id) = &spec.template_id {
            params.insert("template_id".to_string(), Value::String(template_id.clone()));
        }
        if let Some(notify_url) = &spec.notify_url {
            params.insert("notify_url".to_string(), Value::String(notify_url.clone()));
        }
        if !spec.fields.is_empty() {
            params.insert("fields".to_string(), Value::Object(spec.fields.clone()));
        }

        Value::Object(params)
    }
}

fn auth_expires() -> String {
    (Utc::now() + chrono::Duration::hours(1))
        .format("%Y/%m/%d %H:%M:%S+00:00")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;
    use offload_core::Step;

    fn client() -> TranscoderClient {
        TranscoderClient::new(Credentials::new("auth_key", "auth_secret"))
    }

    #[test]
    fn test_assembly_params_shape() {
        let spec = AssemblySpec {
            steps: vec![Step::new("import", "/http/import").with_option("url", "http://x")],
            notify_url: Some("https://example.com/hook".to_string()),
            ..Default::default()
        };

        let params = client().assembly_params(&spec);
        assert_eq!(params["auth"]["key"], "auth_key");
        assert!(params["auth"]["expires"].as_str().unwrap().contains("+00:00"));
        assert_eq!(params["steps"]["import"]["robot"], "/http/import");
        assert_eq!(params["notify_url"], "https://example.com/hook");
        assert!(params.get("template_id").is_none());
    }

    #[test]
    fn test_template_params_omit_steps() {
        let spec = AssemblySpec {
            template_id: Some("my_template".to_string()),
            ..Default::default()
        };

        let params = client().assembly_params(&spec);
        assert_eq!(params["template_id"], "my_template");
        assert!(params.get("steps").is_none());
    }
}
