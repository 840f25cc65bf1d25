//! Note-export client — Notion pages API.

pub struct NotionClient {
    api_key: String,
    daily_log_db: String,
    client: reqwest::Client,
}

impl NotionClient {
    pub fn new(api_key: String, daily_log_db: String) -> Self {
        Self {
            api_key,
            daily_log_db,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// The default database for daily logs, when one is configured.
    pub fn default_database(&self) -> Option<&str> {
        (!self.daily_log_db.is_empty()).then_some(self.daily_log_db.as_str())
    }

    /// Create a titled note page in a database. Returns the page URL.
    pub async fn create_note(
        &self,
        database_id: &str,
        title: &str,
        content: &str,
    ) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "parent": {"database_id": database_id},
            "properties": {
                "Name": {"title": [{"text": {"content": title}}]},
            },
            "children": [{
                "object": "block",
                "type": "paragraph",
                "paragraph": {"rich_text": [{"text": {"content": content}}]},
            }],
        });

        let resp = self
            .client
            .post("https://api.notion.com/v1/pages")
            .bearer_auth(&self.api_key)
            .header("Notion-Version", "2022-06-28")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("Notion API {status}: {detail}");
        }

        let page: serde_json::Value = resp.json().await?;
        Ok(page
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_and_default_database() {
        let unconfigured = NotionClient::new(String::new(), String::new());
        assert!(!unconfigured.is_configured());

        let configured = NotionClient::new("key".into(), "db-1".into());
        assert!(configured.is_configured());
        assert_eq!(configured.default_database(), Some("db-1"));

        let no_db = NotionClient::new("key".into(), String::new());
        assert_eq!(no_db.default_database(), None);
    }
}
