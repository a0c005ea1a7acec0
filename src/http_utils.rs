//! HTTP client for talking to a running nutriplan daemon.
//!
//! Used by the `nutrictl` CLI. Success responses deserialize into the
//! caller's type; failure responses surface the response body as the error
//! message.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt;

use crate::cli_utils;

/// Error carrying the body of a non-success HTTP response.
#[derive(Debug)]
pub struct HttpError {
    message: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for HttpError {}

/// Client bound to one daemon's base URL.
pub struct NutriClient {
    client: Client,
    base_url: String,
}

impl NutriClient {
    /// Creates a client for the daemon at `base_url`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Constructs a full API URL from a path.
    pub fn api_url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Makes a GET request and deserializes the response.
    pub async fn get<T>(&self, path: &str) -> Result<T, Box<dyn Error>>
    where
        T: DeserializeOwned,
    {
        let url = self.api_url(path);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response).await
    }

    /// Makes a POST request with a JSON body and deserializes the response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Box<dyn Error>>
    where
        B: serde::Serialize,
        T: DeserializeOwned,
    {
        let url = self.api_url(path);
        let response = self.client.post(&url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Makes a POST request without a body and deserializes the response.
    pub async fn post_empty<T>(&self, path: &str) -> Result<T, Box<dyn Error>>
    where
        T: DeserializeOwned,
    {
        let url = self.api_url(path);
        let response = self.client.post(&url).send().await?;
        self.handle_response(response).await
    }

    /// Makes a PUT request with a JSON body and deserializes the response.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, Box<dyn Error>>
    where
        B: serde::Serialize,
        T: DeserializeOwned,
    {
        let url = self.api_url(path);
        let response = self.client.put(&url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Makes a DELETE request and deserializes the response.
    pub async fn delete<T>(&self, path: &str) -> Result<T, Box<dyn Error>>
    where
        T: DeserializeOwned,
    {
        let url = self.api_url(path);
        let response = self.client.delete(&url).send().await?;
        self.handle_response(response).await
    }

    async fn handle_response<T>(&self, response: Response) -> Result<T, Box<dyn Error>>
    where
        T: DeserializeOwned,
    {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                "No error details".to_string()
            } else {
                body
            };
            Err(Box::new(HttpError { message }))
        }
    }
}

/// Executes an HTTP operation, exiting the process with a formatted message
/// on failure.
pub async fn execute_or_exit<T, F, Fut>(operation: F, context: &str) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, Box<dyn Error>>>,
{
    match operation().await {
        Ok(result) => result,
        Err(e) => cli_utils::exit_with_error(&format!("{}: {}", context, e)),
    }
}
