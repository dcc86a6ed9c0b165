use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::models::{ApiResponse, BookingRequest, LoginRequest, Registration, RoomForm};
use crate::config::Config;
use crate::error::ApiError;
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Bearer,
}

/// HTTP client for the hotel reservation backend.
///
/// Each method performs exactly one request. Errors are returned as-is;
/// nothing is retried.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<dyn SessionStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(ApiClient {
            client,
            base_url,
            session,
        })
    }

    pub fn from_config(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        Self::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
            session,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.session)
    }

    /// Builds the URL for `segments` below the base URL, encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Headers sent on authorized calls.
    ///
    /// `Authorization` is left out entirely when no token is stored.
    pub fn header(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let session = self.session.load()?;
        if let Some(token) = session.token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    fn request(&self, method: Method, segments: &[&str], auth: Auth) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments);
        tracing::debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match auth {
            Auth::Anonymous => Ok(builder),
            Auth::Bearer => Ok(builder.headers(self.header()?)),
        }
    }

    fn multipart(&self, method: Method, segments: &[&str], form: RoomForm) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments);
        tracing::debug!("{} {} (multipart, {} fields)", method, url, form.len());

        // reqwest sets the multipart content type with its boundary
        let mut headers = self.header()?;
        headers.remove(CONTENT_TYPE);

        Ok(self
            .client
            .request(method, url)
            .headers(headers)
            .multipart(form.into_multipart()?))
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse>(&body)
                .ok()
                .and_then(|r| r.message);
            tracing::warn!("{} returned {}", url, status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(ApiResponse::default());
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{}: {}", url, e)))
    }

    // Auth

    pub async fn register_user(&self, registration: &Registration) -> Result<ApiResponse, ApiError> {
        let request = self.request(Method::POST, &["auth", "register"], Auth::Anonymous)?;
        self.send(request.json(registration)).await
    }

    /// Logs in. The returned token and role are not persisted here.
    pub async fn login_user(&self, credentials: &LoginRequest) -> Result<ApiResponse, ApiError> {
        let request = self.request(Method::POST, &["auth", "login"], Auth::Anonymous)?;
        self.send(request.json(credentials)).await
    }

    /// Plain-text liveness greeting from the auth controller.
    pub async fn hello(&self) -> Result<String, ApiError> {
        let response = self
            .request(Method::GET, &["auth", "hello"], Auth::Anonymous)?
            .send()
            .await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!("{} returned {}", url, status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: None,
                body,
            });
        }
        Ok(body)
    }

    // Users

    pub async fn get_all_users(&self) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::GET, &["users", "all"], Auth::Bearer)?)
            .await
    }

    pub async fn get_user_profile(&self) -> Result<ApiResponse, ApiError> {
        self.send(self.request(
            Method::GET,
            &["users", "get-logged-in-profile-info"],
            Auth::Bearer,
        )?)
        .await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::GET, &["users", "get-by-id", user_id], Auth::Bearer)?)
            .await
    }

    pub async fn get_user_bookings(&self, user_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(
            Method::GET,
            &["users", "get-user-bookings", user_id],
            Auth::Bearer,
        )?)
        .await
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::DELETE, &["users", "delete", user_id], Auth::Bearer)?)
            .await
    }

    // Rooms

    pub async fn add_room(&self, form: RoomForm) -> Result<ApiResponse, ApiError> {
        self.send(self.multipart(Method::POST, &["rooms", "add"], form)?)
            .await
    }

    pub async fn get_all_available_rooms(&self) -> Result<ApiResponse, ApiError> {
        self.send(self.request(
            Method::GET,
            &["rooms", "all-available-rooms"],
            Auth::Anonymous,
        )?)
        .await
    }

    pub async fn get_available_rooms_by_date_and_type(
        &self,
        check_in_date: NaiveDate,
        check_out_date: NaiveDate,
        room_type: &str,
    ) -> Result<ApiResponse, ApiError> {
        let request = self.request(
            Method::GET,
            &["rooms", "available-rooms-by-date-and-type"],
            Auth::Anonymous,
        )?;
        let query = [
            ("checkInDate", check_in_date.format("%Y-%m-%d").to_string()),
            ("checkOutDate", check_out_date.format("%Y-%m-%d").to_string()),
            ("roomType", room_type.to_string()),
        ];
        self.send(request.query(&query)).await
    }

    pub async fn get_room_types(&self) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::GET, &["rooms", "types"], Auth::Anonymous)?)
            .await
    }

    pub async fn get_all_rooms(&self) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::GET, &["rooms", "all"], Auth::Anonymous)?)
            .await
    }

    pub async fn get_room_by_id(&self, room_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(
            Method::GET,
            &["rooms", "room-by-id", room_id],
            Auth::Anonymous,
        )?)
        .await
    }

    pub async fn delete_room(&self, room_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::DELETE, &["rooms", "delete", room_id], Auth::Bearer)?)
            .await
    }

    pub async fn update_room(&self, room_id: &str, form: RoomForm) -> Result<ApiResponse, ApiError> {
        self.send(self.multipart(Method::PUT, &["rooms", "update", room_id], form)?)
            .await
    }

    // Bookings

    pub async fn book_room(
        &self,
        room_id: &str,
        user_id: &str,
        booking: &BookingRequest,
    ) -> Result<ApiResponse, ApiError> {
        tracing::info!("Booking room {} for user {}", room_id, user_id);
        let request = self.request(
            Method::POST,
            &["bookings", "book-room", room_id, user_id],
            Auth::Bearer,
        )?;
        self.send(request.json(booking)).await
    }

    pub async fn get_all_bookings(&self) -> Result<ApiResponse, ApiError> {
        self.send(self.request(Method::GET, &["bookings", "all"], Auth::Bearer)?)
            .await
    }

    pub async fn get_booking_by_confirmation_code(&self, code: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(
            Method::GET,
            &["bookings", "get-by-confirmation-code", code],
            Auth::Anonymous,
        )?)
        .await
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.request(
            Method::DELETE,
            &["bookings", "cancel", booking_id],
            Auth::Bearer,
        )?)
        .await
    }

    // Local session checks

    /// Forgets the stored token and role. Never fails.
    pub fn logout(&self) {
        match self.session.clear() {
            Ok(()) => tracing::info!("Logged out"),
            Err(e) => tracing::warn!("Failed to clear session on logout: {}", e),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_session(|s| s.is_authenticated())
    }

    pub fn is_admin(&self) -> bool {
        self.read_session(|s| s.is_admin())
    }

    pub fn is_user(&self) -> bool {
        self.read_session(|s| s.is_user())
    }

    fn read_session(&self, check: impl FnOnce(&crate::session::Session) -> bool) -> bool {
        match self.session.load() {
            Ok(session) => check(&session),
            Err(e) => {
                tracing::warn!("Failed to read session: {}", e);
                false
            }
        }
    }
}
