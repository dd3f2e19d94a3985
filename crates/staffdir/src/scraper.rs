use crate::parser::{ExtractError, parse_staff_directory};
use crate::types::{OfficeAssignment, StaffDirectory};

use chrono::Utc;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Extraction failed: {0}")]
    ExtractError(#[from] ExtractError),
    #[error("Empty response for {0}")]
    EmptyResponse(String),
}

#[derive(Debug, Clone)]
pub struct StaffScraper {
    client: Client,
}

impl StaffScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }

    /// Raw HTML of a page. Non-success statuses and blank bodies are errors.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let html = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        if html.trim().is_empty() {
            return Err(ScraperError::EmptyResponse(url.to_string()));
        }

        Ok(html)
    }

    pub async fn fetch_directory(
        &self,
        url: &str,
        assignment: &OfficeAssignment,
    ) -> Result<StaffDirectory, ScraperError> {
        log::info!("Fetching staff directory: {}", url);
        let html = self.fetch_page(url).await?;
        let mut directory = parse_staff_directory(&html, url, assignment)?;
        directory.fetched_at = Some(Utc::now());
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseError;

    #[test]
    fn test_extract_errors_convert() {
        let err: ScraperError = ExtractError::from(ParseError::MissingBlock).into();
        assert!(matches!(
            err,
            ScraperError::ExtractError(ExtractError::ParseError(ParseError::MissingBlock))
        ));
        assert!(err.to_string().contains("div.text-only"));
    }
}
