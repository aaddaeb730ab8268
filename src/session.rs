use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, REFERER};
use scraper::Html;

use crate::config::{Credentials, SiteConfig};
use crate::error::GradeError;

/// Desktop browser identification; the site rejects unfamiliar agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/77.0.3865.120 Safari/537.36";

/// Anything that can hand back a parsed gradebook page.
pub trait PageSource {
    fn fetch_page(&self, endpoint: &str) -> Result<Html, GradeError>;
}

/// An authenticated gradebook session. Cookies set during login are reused
/// by every later fetch.
#[derive(Debug)]
pub struct Session {
    client: Client,
    site: SiteConfig,
}

impl Session {
    pub fn authenticate(site: SiteConfig, credentials: &Credentials) -> Result<Self, GradeError> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(BROWSER_USER_AGENT)
            .timeout(site.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|err| GradeError::Transport {
                path: String::new(),
                message: format!("build http client: {err}"),
            })?;

        let session = Self { client, site };

        let landing = session.fetch_page("")?;
        let token = crate::extract::authenticity_token(&landing).ok_or_else(|| {
            GradeError::Auth {
                status: None,
                reason: "login form has no authenticity_token".to_owned(),
            }
        })?;

        let form = [
            ("utf8", "✓"),
            ("authenticity_token", token.as_str()),
            ("session[email]", credentials.email.as_str()),
            ("session[password]", credentials.password.as_str()),
            ("session[remember_me]", "0,1"),
            ("commit", "Log In"),
            ("session[remember_me_sso]", "0"),
        ];

        let login_url = session.site.endpoint_url("login");
        tracing::debug!(url = %login_url, email = %credentials.email, "POST login");
        let response = session
            .client
            .post(&login_url)
            .header(REFERER, session.site.base_url.as_str())
            .form(&form)
            .send()
            .map_err(|err| GradeError::from_reqwest("login", err))?;

        let status = response.status().as_u16();
        if !is_accepted_status(status) {
            return Err(GradeError::Auth {
                status: Some(status),
                reason: "login was not accepted".to_owned(),
            });
        }

        tracing::info!(email = %credentials.email, status, "logged in");
        Ok(session)
    }
}

impl PageSource for Session {
    fn fetch_page(&self, endpoint: &str) -> Result<Html, GradeError> {
        let path = endpoint.trim_start_matches('/');
        let url = self.site.endpoint_url(path);

        let response = self
            .client
            .get(&url)
            .header(REFERER, self.site.base_url.as_str())
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .map_err(|err| GradeError::from_reqwest(path, err))?;

        let status = response.status().as_u16();
        if !is_accepted_status(status) {
            return Err(GradeError::Network {
                status,
                path: path.to_owned(),
            });
        }

        let body = response
            .text()
            .map_err(|err| GradeError::from_reqwest(path, err))?;
        tracing::debug!(%url, status, bytes = body.len(), "fetched page");

        Ok(Html::parse_document(&body))
    }
}

fn is_accepted_status(status: u16) -> bool {
    status == 200 || status == 302
}
