use crate::config::Config;
use crate::errors::AppError;
use crate::models::ActivityBatch;
use axum::http::StatusCode;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Url};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

/// Where raw activity records come from.
#[derive(Debug, Clone)]
pub enum ActivitySource {
    /// The R-Watch activity API.
    Remote { client: Client, base_url: String },
    /// A JSON array of records on disk, in the API's response format.
    File { path: PathBuf },
}

impl ActivitySource {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        if let Some(path) = &config.activities_path {
            info!("reading activities from {}", path.display());
            return Ok(Self::File { path: path.clone() });
        }

        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(AppError::internal)?;
        info!("fetching activities from {}", config.api_url);
        Ok(Self::Remote {
            client,
            base_url: config.api_url.clone(),
        })
    }

    pub async fn fetch_all(&self) -> Result<ActivityBatch, AppError> {
        match self {
            Self::Remote { client, base_url } => {
                fetch_remote(client, activities_url(base_url, None)?, None).await
            }
            Self::File { path } => load_file(path).await,
        }
    }

    /// Fetches one user's records. `authorization` is forwarded verbatim to
    /// the API, which guards the per-user route.
    pub async fn fetch_for_user(
        &self,
        username: &str,
        authorization: Option<&HeaderValue>,
    ) -> Result<ActivityBatch, AppError> {
        match self {
            Self::Remote { client, base_url } => {
                fetch_remote(client, activities_url(base_url, Some(username))?, authorization).await
            }
            Self::File { path } => {
                let mut batch = load_file(path).await?;
                batch.retain_user(username);
                Ok(batch)
            }
        }
    }
}

fn activities_url(base_url: &str, username: Option<&str>) -> Result<Url, AppError> {
    let mut url = Url::parse(base_url).map_err(AppError::internal)?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("{base_url} cannot be a base url"),
            })?;
        segments.pop_if_empty().extend(["api", "activities"]);
        if let Some(username) = username {
            segments.push(username);
        }
    }
    Ok(url)
}

async fn fetch_remote(
    client: &Client,
    url: Url,
    authorization: Option<&HeaderValue>,
) -> Result<ActivityBatch, AppError> {
    let mut request = client.get(url.clone());
    if let Some(value) = authorization {
        request = request.header(AUTHORIZATION, value.clone());
    }
    let response = request.send().await.map_err(|err| {
        error!("activity api request to {url} failed: {err}");
        AppError::from(err)
    })?;

    let status = response.status();
    if !status.is_success() {
        error!("activity api returned {status} for {url}");
        return Err(AppError::bad_gateway(format!("activity api returned {status}")));
    }

    let values: Vec<Value> = response.json().await?;
    Ok(ActivityBatch::from_values(values))
}

async fn load_file(path: &Path) -> Result<ActivityBatch, AppError> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice::<Vec<Value>>(&bytes)
            .map(ActivityBatch::from_values)
            .map_err(|err| {
                error!("failed to parse activities file: {err}");
                AppError::from(err)
            }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!("activities file {} not found, treating as empty", path.display());
            Ok(ActivityBatch::default())
        }
        Err(err) => {
            error!("failed to read activities file: {err}");
            Err(err.into())
        }
    }
}
