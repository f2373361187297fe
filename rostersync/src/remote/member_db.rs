//! Client for the membership database JSON API

use log::{debug, info};
use serde_json::Value;
use url::Url;

use super::RemoteSource;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use crate::error::{RemoteError, RemoteErrorKind};
use crate::record::RemoteRecord;

/// Redirects a GET request may follow
pub const MAX_REDIRECTS: usize = 1;

const SIGN_IN_ENDPOINT: &str = "users/sign_in.json";
const TOKEN_ENDPOINT: &str = "users/token.json";

/// Connection to the membership database.
///
/// Login is done once with [`MemberDb::connect`] (or one of the other token
/// actions); every later request authenticates with the stored token.
#[derive(Debug)]
pub struct MemberDb<T> {
    transport: T,
    base: Url,
    email: String,
    auth_token: Option<String>,
    user_id: Option<String>,
}

impl<T: HttpTransport> MemberDb<T> {
    /// Create a client for the database at `db_url`, logging in as `email`
    pub fn new(transport: T, db_url: &str, email: impl Into<String>) -> Result<Self, RemoteError> {
        // Exactly one trailing slash, so endpoints join below the base
        let normalized = format!("{}/", db_url.trim().trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|e| {
            RemoteError::new(
                RemoteErrorKind::Transport,
                format!("invalid database url '{}': {}", db_url, e),
            )
        })?;
        Ok(Self {
            transport,
            base,
            email: email.into(),
            auth_token: None,
            user_id: None,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Use a known token instead of logging in
    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.auth_token = Some(token.into());
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Database id of the logged in user
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Obtain a token with the default strategy ([`MemberDb::generate_token`])
    pub fn connect(&mut self, password: &str) -> Result<(), RemoteError> {
        self.generate_token(password)
    }

    /// Return the existing token or create one
    pub fn get_token(&mut self, password: &str) -> Result<(), RemoteError> {
        self.token_action(Method::Post, SIGN_IN_ENDPOINT, password)
    }

    /// Create a new token, replacing an existing one
    pub fn generate_token(&mut self, password: &str) -> Result<(), RemoteError> {
        self.token_action(Method::Post, TOKEN_ENDPOINT, password)
    }

    pub fn delete_token(&mut self, password: &str) -> Result<(), RemoteError> {
        self.token_action(Method::Delete, TOKEN_ENDPOINT, password)
    }

    fn token_action(
        &mut self,
        method: Method,
        endpoint: &str,
        password: &str,
    ) -> Result<(), RemoteError> {
        let mut url = self.join(endpoint)?;
        url.query_pairs_mut()
            .append_pair("person[email]", &self.email)
            .append_pair("person[password]", password);

        let response = self.transport.execute(&HttpRequest::new(method, url.as_str()))?;
        let response = check_status(&url, response)?;
        let body = json_body(&response)?;

        let user = body
            .get("people")
            .and_then(|people| people.get(0))
            .ok_or_else(|| invalid_response("no person in login response"))?;
        let token = user
            .get("authentication_token")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_response("no authentication token in login response"))?;

        self.auth_token = Some(token.to_string());
        self.user_id = user.get("id").and_then(id_string);
        info!("Logged in to {} as {}", self.base, self.email);
        Ok(())
    }

    /// GET an endpoint below the base url (or an absolute url under it).
    ///
    /// A redirect is followed once; the server drops the credentials on
    /// redirects, so they are added to the new location again. Redirects
    /// leaving the base url are refused and never see the credentials.
    pub fn get_request(&mut self, endpoint: &str) -> Result<HttpResponse, RemoteError> {
        let token = self.auth_token.clone().ok_or_else(|| {
            RemoteError::new(RemoteErrorKind::MissingToken, "log in before sending requests")
        })?;

        let mut url = self.endpoint_url(endpoint)?;
        let mut redirects = 0;
        loop {
            url.set_query(None);
            url.query_pairs_mut()
                .append_pair("user_email", &self.email)
                .append_pair("user_token", &token);

            let response = self.transport.execute(&HttpRequest::get(url.as_str()))?;
            if !response.is_redirect() {
                return check_status(&url, response);
            }

            if redirects >= MAX_REDIRECTS {
                return Err(RemoteError::new(
                    RemoteErrorKind::TooManyRedirects,
                    format!("{} redirected more than {} time(s)", url.path(), MAX_REDIRECTS),
                ));
            }
            redirects += 1;

            let location = response
                .location
                .as_deref()
                .ok_or_else(|| invalid_response("redirect without location"))?;
            let target = url
                .join(location)
                .map_err(|e| invalid_response(format!("bad redirect '{}': {}", location, e)))?;
            if !target.as_str().starts_with(self.base.as_str()) {
                return Err(invalid_response(format!(
                    "{} redirected outside of {}",
                    url.path(),
                    self.base
                )));
            }
            debug!("Following redirect from {} to {}", url.path(), target.path());
            url = target;
        }
    }

    /// All members of a group
    pub fn get_group_members(&mut self, group_id: i64) -> Result<Vec<RemoteRecord>, RemoteError> {
        let mut body = self.get_json(&format!("groups/{}/people.json", group_id))?;
        let people = body
            .get_mut("people")
            .map(Value::take)
            .ok_or_else(|| invalid_response("no 'people' in group response"))?;
        let records: Vec<RemoteRecord> = serde_json::from_value(people)
            .map_err(|e| invalid_response(format!("unexpected people list: {}", e)))?;
        debug!("Group {} has {} members", group_id, records.len());
        Ok(records)
    }

    /// Details of one person
    pub fn get_person(&mut self, person_id: i64) -> Result<Value, RemoteError> {
        self.get_json(&format!("people/{}.json", person_id))
    }

    /// Details of one group, without its members
    pub fn get_group(&mut self, group_id: i64) -> Result<Value, RemoteError> {
        self.get_json(&format!("groups/{}.json", group_id))
    }

    fn get_json(&mut self, endpoint: &str) -> Result<Value, RemoteError> {
        let response = self.get_request(endpoint)?;
        json_body(&response)
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, RemoteError> {
        if endpoint.starts_with(self.base.as_str()) {
            Url::parse(endpoint)
                .map_err(|e| invalid_response(format!("bad url '{}': {}", endpoint, e)))
        } else {
            self.join(endpoint)
        }
    }

    fn join(&self, endpoint: &str) -> Result<Url, RemoteError> {
        self.base
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| invalid_response(format!("bad endpoint '{}': {}", endpoint, e)))
    }
}

impl<T: HttpTransport> RemoteSource for MemberDb<T> {
    fn fetch_group_members(&mut self, group_id: i64) -> Result<Vec<RemoteRecord>, RemoteError> {
        self.get_group_members(group_id)
    }
}

fn check_status(url: &Url, response: HttpResponse) -> Result<HttpResponse, RemoteError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(RemoteError::new(
            RemoteErrorKind::HttpStatus(response.status),
            format!("request to {} failed", url.path()),
        ))
    }
}

fn json_body(response: &HttpResponse) -> Result<Value, RemoteError> {
    serde_json::from_slice(&response.body)
        .map_err(|e| invalid_response(format!("response is not JSON: {}", e)))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn invalid_response(message: impl Into<String>) -> RemoteError {
    RemoteError::new(RemoteErrorKind::InvalidResponse, message)
}
