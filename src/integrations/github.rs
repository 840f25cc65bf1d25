//! Issue-tracker client — GitHub REST v3.

use serde::Deserialize;

/// A repository summary line.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    #[serde(rename = "open_issues_count")]
    pub open_issues: u64,
    #[serde(default)]
    pub description: Option<String>,
}

/// An open issue.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
}

pub struct GithubClient {
    token: String,
    username: String,
    client: reqwest::Client,
}

impl GithubClient {
    pub fn new(token: String, username: String) -> Self {
        Self {
            token,
            username,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.username.is_empty()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("User-Agent", "aide")
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("GitHub API {status}: {detail}");
        }
        Ok(resp.json().await?)
    }

    /// List the user's repositories, most recently pushed first.
    pub async fn list_repos(&self, limit: usize) -> anyhow::Result<Vec<RepoSummary>> {
        let url = format!(
            "https://api.github.com/users/{}/repos?sort=pushed&per_page={limit}",
            self.username
        );
        self.get_json(&url).await
    }

    /// One repository with its top open issues.
    pub async fn project_summary(
        &self,
        repo: &str,
    ) -> anyhow::Result<(RepoSummary, Vec<IssueSummary>)> {
        let repo_url = format!("https://api.github.com/repos/{}/{repo}", self.username);
        let summary: RepoSummary = self.get_json(&repo_url).await?;

        let issues_url = format!(
            "https://api.github.com/repos/{}/{repo}/issues?state=open&per_page=5",
            self.username
        );
        let issues: Vec<IssueSummary> = self.get_json(&issues_url).await?;
        Ok((summary, issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_without_both_fields() {
        assert!(!GithubClient::new(String::new(), String::new()).is_configured());
        assert!(!GithubClient::new("tok".into(), String::new()).is_configured());
        assert!(GithubClient::new("tok".into(), "user".into()).is_configured());
    }
}
