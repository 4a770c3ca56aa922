//! libcurl-backed [`Remote`].

use std::str;
use std::time::Duration;

use curl::easy::Easy;

use super::parse::parse_headers;
use super::{ChangeIdentifiers, Remote};
use crate::config::FetchConfig;
use crate::retry::FetchError;

/// Per-request settings shared by every handle.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub probe_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl HttpSettings {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            connect_timeout: cfg.connect_timeout(),
            probe_timeout: cfg.probe_timeout(),
            fetch_timeout: cfg.fetch_timeout(),
        }
    }
}

/// Blocking HTTP client built on one curl `Easy` handle per request.
#[derive(Debug, Clone)]
pub struct CurlRemote {
    settings: HttpSettings,
}

impl CurlRemote {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }

    fn easy(&self, url: &str, timeout: Duration) -> Result<Easy, FetchError> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.settings.user_agent)?;
        easy.connect_timeout(self.settings.connect_timeout)?;
        easy.timeout(timeout)?;
        Ok(easy)
    }

    fn head_request(&self, url: &str) -> Result<ChangeIdentifiers, FetchError> {
        let mut headers: Vec<String> = Vec::new();
        let mut easy = self.easy(url, self.settings.probe_timeout)?;
        easy.nobody(true)?;
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }
        check_status(easy.response_code()?)?;
        Ok(parse_headers(&headers))
    }

    /// GET with `Range: bytes=0-0`, aborted on the first body byte. For servers that reject HEAD.
    fn ranged_peek(&self, url: &str) -> Result<ChangeIdentifiers, FetchError> {
        let mut headers: Vec<String> = Vec::new();
        let mut easy = self.easy(url, self.settings.probe_timeout)?;
        easy.range("0-0")?;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            // Returning 0 aborts the transfer: headers only.
            transfer.write_function(|_| Ok(0))?;
            transfer.perform()
        };
        match performed {
            Ok(()) => {}
            Err(e) if e.is_write_error() => {}
            Err(e) => return Err(e.into()),
        }
        check_status(easy.response_code()?)?;
        Ok(parse_headers(&headers))
    }
}

impl Remote for CurlRemote {
    fn head(&self, url: &str) -> Result<ChangeIdentifiers, FetchError> {
        match self.head_request(url) {
            Err(FetchError::Http(code @ (405 | 501))) => {
                tracing::debug!(url, code, "HEAD rejected, probing with ranged GET");
                self.ranged_peek(url)
            }
            other => other,
        }
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        let mut easy = self.easy(url, self.settings.fetch_timeout)?;
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        check_status(easy.response_code()?)?;
        Ok(body)
    }
}

fn check_status(code: u32) -> Result<(), FetchError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(FetchError::Http(code))
    }
}
