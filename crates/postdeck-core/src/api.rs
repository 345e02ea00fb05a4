use anyhow::{Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::casing::{keys_to_camel, keys_to_snake};
use crate::model::{
    Client, ClientPatch, NewClient, NewPost, NewTemplate, Post, PostPatch, PostTemplate,
};

#[derive(Debug, Error)]
#[error("{status}: {}", .message.as_deref().unwrap_or("request failed"))]
pub struct ApiError {
    pub status: StatusCode,
    pub message: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct RestClient {
    http: HttpClient,
    base: String,
    token: Option<String>,
}

impl RestClient {
    pub fn new(base: &str, token: Option<&str>) -> Result<RestClient> {
        let http = HttpClient::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(RestClient {
            http,
            base: base.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        })
    }

    fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base, path);
        tracing::debug!(%method, %url, "datastore request");
        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.json::<ErrorBody>().ok().map(|body| body.error);
            return Err(ApiError { status, message }.into());
        }
        response
            .json::<Value>()
            .with_context(|| format!("invalid JSON from {url}"))
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let rows = self.request(Method::GET, "/clients?order=name", None)?;
        from_rows(rows).context("failed to decode client rows")
    }

    pub fn create_client(&self, draft: &NewClient) -> Result<Client> {
        let row = self.request(Method::POST, "/clients", Some(to_row(draft)?))?;
        from_rows(row).context("failed to decode created client")
    }

    pub fn update_client(&self, id: &str, patch: &ClientPatch) -> Result<Client> {
        let row = self.request(Method::PUT, &format!("/clients/{id}"), Some(to_row(patch)?))?;
        from_rows(row).context("failed to decode updated client")
    }

    pub fn delete_client(&self, id: &str) -> Result<()> {
        self.request(Method::DELETE, &format!("/clients/{id}"), None)?;
        Ok(())
    }

    pub fn list_posts(&self) -> Result<Vec<Post>> {
        let rows = self.request(Method::GET, "/posts?order=scheduled_for", None)?;
        from_rows(rows).context("failed to decode post rows")
    }

    pub fn create_post(&self, draft: &NewPost) -> Result<Post> {
        let row = self.request(Method::POST, "/posts", Some(to_row(draft)?))?;
        from_rows(row).context("failed to decode created post")
    }

    pub fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post> {
        let row = self.request(Method::PUT, &format!("/posts/{id}"), Some(to_row(patch)?))?;
        from_rows(row).context("failed to decode updated post")
    }

    pub fn delete_post(&self, id: &str) -> Result<()> {
        self.request(Method::DELETE, &format!("/posts/{id}"), None)?;
        Ok(())
    }

    pub fn list_templates(&self) -> Result<Vec<PostTemplate>> {
        let rows = self.request(Method::GET, "/templates", None)?;
        serde_json::from_value(rows).context("failed to decode template rows")
    }

    pub fn create_template(&self, draft: &NewTemplate) -> Result<PostTemplate> {
        let body = serde_json::to_value(draft).context("failed to encode template")?;
        let row = self.request(Method::POST, "/templates", Some(body))?;
        serde_json::from_value(row).context("failed to decode created template")
    }

    pub fn delete_template(&self, id: &str) -> Result<()> {
        self.request(Method::DELETE, &format!("/templates/{id}"), None)?;
        Ok(())
    }
}

fn to_row<T: Serialize>(payload: &T) -> Result<Value> {
    let wire = serde_json::to_value(payload).context("failed to encode payload")?;
    Ok(keys_to_snake(wire))
}

fn from_rows<T: DeserializeOwned>(rows: Value) -> Result<T> {
    Ok(serde_json::from_value(keys_to_camel(rows))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_status_and_message() {
        let err = ApiError {
            status: StatusCode::NOT_FOUND,
            message: Some("Post not found".to_string()),
        };
        assert_eq!(err.to_string(), "404 Not Found: Post not found");

        let bare = ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(bare.to_string(), "500 Internal Server Error: request failed");
    }

    #[test]
    fn payloads_are_sent_as_snake_case_rows() {
        let patch = PostPatch {
            client_id: Some("2".to_string()),
            status: Some(crate::model::PostStatus::Published),
            ..PostPatch::default()
        };
        let row = to_row(&patch).expect("encodable patch");
        assert_eq!(row["client_id"], "2");
        assert_eq!(row["status"], "published");
        assert!(row.get("clientId").is_none());
        assert!(row.get("content").is_none());
    }
}
