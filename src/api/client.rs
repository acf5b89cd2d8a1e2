//! Typed client for the MPS REST API

use super::endpoints::Endpoint;
use super::filters::{ManufacturingIdentityFilter, ProductionLogFilter, RecentMoFilter};
use crate::auth::{AuthMode, Authenticator, LoginOutcome, MeResponse};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::pagination::{
    FilterSet, Page, PageFetcher, PageRequest, PaginatedFetcher, WalkOptions, WalkStats,
};
use crate::types::{JsonValue, Record, User};
use async_trait::async_trait;
use tracing::{debug, info};

const LOGIN_PATH: &str = "/api/login";
const LOGOUT_PATH: &str = "/api/logout";
const ME_PATH: &str = "/api/auth/me";

/// Client for the MPS data-export API
#[derive(Debug)]
pub struct MpsClient {
    http: HttpClient,
    auth: Authenticator,
    walk: WalkOptions,
}

impl MpsClient {
    /// Create a client for `base_url` with default HTTP settings
    pub fn new(base_url: impl Into<String>, auth: AuthMode) -> Result<Self> {
        let config = HttpClientConfig::builder().base_url(base_url).build();
        Self::with_http_config(config, auth)
    }

    /// Create a client from an HTTP config
    pub fn with_http_config(config: HttpClientConfig, auth: AuthMode) -> Result<Self> {
        let http = HttpClient::with_auth(config, auth)?;
        let auth = http
            .authenticator()
            .cloned()
            .ok_or_else(|| Error::config("HTTP client was built without an authenticator"))?;

        Ok(Self {
            http,
            auth,
            walk: WalkOptions::default(),
        })
    }

    /// Create a client from a validated [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Self::with_http_config(config.http_config(), config.auth_mode())?;
        Ok(client.with_walk_options(config.walk_options()))
    }

    /// Set the walk options used by [`fetch_all`](Self::fetch_all)
    #[must_use]
    pub fn with_walk_options(mut self, options: WalkOptions) -> Self {
        self.walk = options;
        self
    }

    /// Default walk options
    pub fn walk_options(&self) -> &WalkOptions {
        &self.walk
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Current auth mode
    pub async fn auth_mode(&self) -> AuthMode {
        self.auth.mode().await
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Log in with a username and password.
    ///
    /// Returns [`LoginOutcome::ApiKeyInUse`] without a request when an API
    /// key is configured.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        self.auth
            .login(&self.http, LOGIN_PATH, username, password)
            .await
    }

    /// End the current session
    pub async fn logout(&self) -> Result<()> {
        self.auth.logout(&self.http, LOGOUT_PATH).await
    }

    /// User the server associates with the current credentials
    pub async fn me(&self) -> Result<User> {
        let response: MeResponse = self.http.get_json(ME_PATH).await?;
        Ok(response.user)
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Fetch one page of `endpoint`
    pub async fn get_page(
        &self,
        endpoint: Endpoint,
        limit: u32,
        offset: u64,
        filters: &FilterSet,
    ) -> Result<Page> {
        endpoint.validate(filters)?;

        let mut request = RequestConfig::new()
            .query("limit", limit)
            .query("offset", offset);
        for (key, value) in filters.iter() {
            request = request.query(key, value);
        }

        debug!(endpoint = %endpoint, limit, offset, "Requesting page");
        let body: JsonValue = self
            .http
            .get_json_with_config(&endpoint.path(), request)
            .await?;
        Page::from_value(body)
    }

    /// Page fetcher bound to one endpoint
    pub fn endpoint(&self, endpoint: Endpoint) -> EndpointFetcher<'_> {
        EndpointFetcher {
            client: self,
            endpoint,
        }
    }

    /// Fetch every record of `endpoint` using the client's walk options
    pub async fn fetch_all(&self, endpoint: Endpoint, filters: &FilterSet) -> Result<Vec<Record>> {
        let options = self.walk.clone();
        self.fetch_all_with_options(endpoint, filters, options)
            .await
    }

    /// Fetch every record of `endpoint` with explicit walk options
    pub async fn fetch_all_with_options(
        &self,
        endpoint: Endpoint,
        filters: &FilterSet,
        options: WalkOptions,
    ) -> Result<Vec<Record>> {
        let (records, _) = self
            .fetch_all_with_stats(endpoint, filters, options)
            .await?;
        Ok(records)
    }

    /// Fetch every record of `endpoint`, also returning walk statistics.
    ///
    /// Filters and credentials are checked once before the first request.
    pub async fn fetch_all_with_stats(
        &self,
        endpoint: Endpoint,
        filters: &FilterSet,
        options: WalkOptions,
    ) -> Result<(Vec<Record>, WalkStats)> {
        endpoint.validate(filters)?;
        self.auth.ensure_authenticated().await?;

        info!(
            endpoint = %endpoint,
            filters = filters.len(),
            page_size = options.page_size,
            "Fetching all pages"
        );
        PaginatedFetcher::with_options(options)
            .fetch_all_with_stats(&self.endpoint(endpoint), filters)
            .await
    }

    /// All manufacturing orders matching `filter`
    pub async fn recent_mo(&self, filter: RecentMoFilter) -> Result<Vec<Record>> {
        self.fetch_all(Endpoint::RecentMo, &filter.into()).await
    }

    /// All production runs matching `filter`
    pub async fn manufacturing_identity(
        &self,
        filter: ManufacturingIdentityFilter,
    ) -> Result<Vec<Record>> {
        self.fetch_all(Endpoint::ManufacturingIdentity, &filter.into())
            .await
    }

    /// All production log events matching `filter`
    pub async fn production_log(&self, filter: ProductionLogFilter) -> Result<Vec<Record>> {
        self.fetch_all(Endpoint::ProductionLog, &filter.into())
            .await
    }

    /// All vendor authenticity rows (filters: `roll`, `authenticity`)
    pub async fn master_authenticity_vendor(&self, filters: &FilterSet) -> Result<Vec<Record>> {
        self.fetch_all(Endpoint::MasterAuthenticityVendor, filters)
            .await
    }

    /// All raw material authenticity rows (filters: `transfer_id`, `authenticity`)
    pub async fn authenticity_used_rm(&self, filters: &FilterSet) -> Result<Vec<Record>> {
        self.fetch_all(Endpoint::AuthenticityUsedRm, filters).await
    }

    /// All line authenticity rows (filters: `mo_name`, `sku_barcode`)
    pub async fn authenticity_used_line(&self, filters: &FilterSet) -> Result<Vec<Record>> {
        self.fetch_all(Endpoint::AuthenticityUsedLine, filters)
            .await
    }
}

/// [`PageFetcher`] issuing requests against one endpoint
#[derive(Debug, Clone, Copy)]
pub struct EndpointFetcher<'a> {
    client: &'a MpsClient,
    endpoint: Endpoint,
}

impl EndpointFetcher<'_> {
    /// Endpoint this fetcher targets
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }
}

#[async_trait]
impl PageFetcher for EndpointFetcher<'_> {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page> {
        self.client
            .get_page(
                self.endpoint,
                request.limit,
                request.offset,
                &request.filters,
            )
            .await
    }
}
