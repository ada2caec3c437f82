use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use super::{cell_text, ServiceAccountKey, StoreError, TabularStore, ValueInputOption};
use crate::config::SheetsConfig;

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Sheets API v4 client authenticated as a service account.
pub struct GoogleSheetsClient {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
    key: ServiceAccountKey,
    token: Mutex<Option<AccessToken>>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    // Omitted by the API when it is 0
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GoogleSheetsClient {
    pub fn new(config: &SheetsConfig, key: ServiceAccountKey) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| StoreError::Endpoint(format!("{}: {}", config.api_base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Endpoint(config.api_base_url.clone()));
        }

        Ok(Self {
            http,
            base_url,
            spreadsheet_id: config.spreadsheet_id.clone(),
            key,
            token: Mutex::new(None),
        })
    }

    /// `<base>/<spreadsheet_id><id_suffix>/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, id_suffix: &str, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StoreError::Endpoint(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.push(&format!("{}{}", self.spreadsheet_id, id_suffix));
            path.extend(segments);
        }
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<AccessToken, StoreError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.key.private_key_id.clone());
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid private key: {}", e)))?;
        let assertion = encode(&header, &claims, &signing_key)
            .map_err(|e| StoreError::Auth(format!("cannot sign assertion: {}", e)))?;

        debug!("Requesting store access token for {}", self.key.client_email);
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    async fn batch_update(&self, requests: Value) -> Result<BatchUpdateResponse, StoreError> {
        let url = self.endpoint(":batchUpdate", &[])?;
        let token = self.access_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Turns a non-2xx response into `StoreError::Api`, keeping the store's own message.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TabularStore for GoogleSheetsClient {
    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        debug!("values.get {}", range);
        let url = self.endpoint("", &["values", range])?;
        let token = self.access_token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let body: ValueRange = check(response).await?.json().await?;

        Ok(body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn append_row(&self, range: &str, row: Vec<Value>) -> Result<(), StoreError> {
        debug!("values.append {}", range);
        let url = self.endpoint("", &["values", &format!("{}:append", range)])?;
        let token = self.access_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", ValueInputOption::UserEntered.as_str()),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row] }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn update_values(
        &self,
        range: &str,
        rows: Vec<Vec<Value>>,
        input: ValueInputOption,
    ) -> Result<(), StoreError> {
        debug!("values.update {} ({})", range, input.as_str());
        let url = self.endpoint("", &["values", range])?;
        let token = self.access_token().await?;
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", input.as_str())])
            .json(&json!({ "values": rows }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn sheet_id(&self, title: &str) -> Result<Option<i64>, StoreError> {
        debug!("spreadsheets.get (resolving sheet '{}')", title);
        let url = self.endpoint("", &[])?;
        let token = self.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await?;
        let spreadsheet: Spreadsheet = check(response).await?.json().await?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .find(|sheet| sheet.properties.title == title)
            .map(|sheet| sheet.properties.sheet_id))
    }

    async fn delete_rows(&self, sheet_id: i64, start_index: usize, end_index: usize) -> Result<(), StoreError> {
        debug!("batchUpdate deleteDimension sheet={} rows=[{}, {})", sheet_id, start_index, end_index);
        self.batch_update(json!([{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": start_index,
                    "endIndex": end_index,
                }
            }
        }]))
        .await?;
        Ok(())
    }

    async fn add_sheet(&self, title: &str) -> Result<i64, StoreError> {
        debug!("batchUpdate addSheet '{}'", title);
        let reply = self
            .batch_update(json!([{ "addSheet": { "properties": { "title": title } } }]))
            .await?;

        reply
            .replies
            .first()
            .and_then(|r| r.pointer("/addSheet/properties/sheetId"))
            .and_then(Value::as_i64)
            .ok_or_else(|| StoreError::Decode("addSheet reply carried no sheetId".to_string()))
    }
}
