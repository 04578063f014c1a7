//! The analytics agent: holds request settings and issues API calls.

use analytics_core::{
    filters_from_value, normalize_key, render_param, usernames_from_value, AnalyticsError,
    ConfigResolver, Filters, Result, LIST_FILTERS, PASSTHROUGH_FILTERS, SITE_VISITS,
};
use serde_json::Value;
use tracing::debug;

use crate::client::{api_request, ApiResponse, TransportOptions};

/// API base used when no configuration provides one.
pub const DEFAULT_API_BASE: &str = "https://api.learningtapestry.com";

/// Users listing endpoint.
pub const USERS_ENDPOINT: &str = "/api/v2/users";
/// Visits aggregated per site.
pub const SITES_ENDPOINT: &str = "/api/v2/sites";
/// Visits aggregated per page.
pub const PAGES_ENDPOINT: &str = "/api/v2/pages";

/// Query parameters in the order they are sent.
pub type QueryParams = Vec<(&'static str, String)>;

/// Client for the analytics API.
///
/// Settings are resolved once at construction from explicit parameters and the
/// configuration file (see [`ConfigResolver`]); afterwards every field can be
/// changed directly. Nothing is validated until a request is made.
///
/// # Examples
///
/// ```no_run
/// use analytics_agent::AnalyticsAgent;
/// use serde_json::json;
///
/// # async fn example() -> analytics_core::Result<()> {
/// let mut agent = AnalyticsAgent::new([
///     ("org_api_key", json!("key")),
///     ("org_secret_key", json!("secret")),
///     ("entity", json!("site_visits")),
/// ])?;
///
/// agent.add_username("peter");
/// agent.add_filter("date_begin", "2015-01-01");
///
/// let visits = agent.fetch_visits().await?;
/// println!("status: {}", visits["status"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsAgent {
    /// Scheme, host and optional base path of the API
    pub api_base: String,

    /// Require TLS for requests
    pub use_ssl: bool,

    /// Organization API key
    pub org_api_key: Option<String>,

    /// Organization secret key
    pub org_secret_key: Option<String>,

    /// Queried entity, e.g. `site_visits` or `page_visits`
    pub entity: Option<String>,

    /// Free-form query qualifier, sent as `type`
    pub query_type: Option<String>,

    /// Connect and request timeout in seconds
    pub timeout: Option<f64>,

    /// Query refinements (date range, domains, URLs)
    pub filters: Filters,

    /// Users whose activity is queried
    pub usernames: Vec<String>,
}

impl Default for AnalyticsAgent {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            use_ssl: true,
            org_api_key: None,
            org_secret_key: None,
            entity: None,
            query_type: None,
            timeout: None,
            filters: Filters::new(),
            usernames: Vec::new(),
        }
    }
}

impl AnalyticsAgent {
    /// Create an agent from parameters layered over `config/analytics.yml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded or an
    /// option has the wrong shape.
    pub fn new<I, K>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let conf = ConfigResolver::new(params)?;
        Self::from_resolver(&conf)
    }

    /// Create an agent from an already built resolver.
    ///
    /// Explicit `null` values count as unset and fall back to the defaults.
    pub fn from_resolver(conf: &ConfigResolver) -> Result<Self> {
        let defaults = Self::default();

        let agent = Self {
            api_base: string_option(conf, "api_base")?.unwrap_or(defaults.api_base),
            use_ssl: conf.option_as("use_ssl")?.unwrap_or(defaults.use_ssl),
            org_api_key: string_option(conf, "org_api_key")?,
            org_secret_key: string_option(conf, "org_secret_key")?,
            entity: string_option(conf, "entity")?,
            query_type: string_option(conf, "type")?,
            timeout: conf.option_as("timeout")?,
            filters: filters_from_value(conf.option_or_else("filters", || Value::Null))?,
            usernames: usernames_from_value(conf.option_or_else("usernames", || Value::Null))?,
        };

        debug!(
            "Analytics agent configured for {} ({} username(s), {} filter(s))",
            agent.api_base,
            agent.usernames.len(),
            agent.filters.len()
        );

        Ok(agent)
    }

    /// Set a filter, replacing any previous value under the same name.
    pub fn add_filter(&mut self, key: impl AsRef<str>, value: impl Into<Value>) {
        self.filters.insert(normalize_key(key.as_ref()), value.into());
    }

    /// Remove a filter, returning its value if it was set.
    pub fn remove_filter(&mut self, key: impl AsRef<str>) -> Option<Value> {
        self.filters.remove(&normalize_key(key.as_ref()))
    }

    /// Append a username to the queried users.
    pub fn add_username(&mut self, username: impl Into<String>) {
        self.usernames.push(username.into());
    }

    /// Fetch the organization's users.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails, or a parse error if the
    /// body is not a JSON object.
    pub async fn fetch_users(&self) -> Result<ApiResponse> {
        api_request(
            &self.transport(),
            &self.api_base,
            USERS_ENDPOINT,
            &self.users_params(),
        )
        .await
    }

    /// Fetch visits for the configured entity, users and filters.
    ///
    /// `site_visits` is served by the sites endpoint; any other entity by the
    /// pages endpoint.
    ///
    /// # Errors
    ///
    /// Returns a network error if the request fails, or a parse error if the
    /// body is not a JSON object.
    pub async fn fetch_visits(&self) -> Result<ApiResponse> {
        api_request(
            &self.transport(),
            &self.api_base,
            self.visits_endpoint(),
            &self.visits_params(),
        )
        .await
    }

    /// Endpoint path [`fetch_visits`](Self::fetch_visits) will query.
    pub fn visits_endpoint(&self) -> &'static str {
        if self.entity.as_deref() == Some(SITE_VISITS) {
            SITES_ENDPOINT
        } else {
            PAGES_ENDPOINT
        }
    }

    /// Query parameters sent by [`fetch_users`](Self::fetch_users).
    pub fn users_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        push_param(&mut params, "org_api_key", self.org_api_key.as_deref());
        push_param(&mut params, "org_secret_key", self.org_secret_key.as_deref());
        params
    }

    /// Query parameters sent by [`fetch_visits`](Self::fetch_visits).
    ///
    /// `usernames` is always present; unset scalar fields and absent filters
    /// are left out.
    pub fn visits_params(&self) -> QueryParams {
        let mut params = self.users_params();
        params.push(("usernames", self.usernames.join(",")));
        push_param(&mut params, "entity", self.entity.as_deref());
        push_param(&mut params, "type", self.query_type.as_deref());
        params.extend(self.filter_params());
        params
    }

    fn filter_params(&self) -> QueryParams {
        PASSTHROUGH_FILTERS
            .iter()
            .chain(LIST_FILTERS.iter())
            .filter_map(|&name| {
                self.filters
                    .get(name)
                    .and_then(render_param)
                    .map(|value| (name, value))
            })
            .collect()
    }

    fn transport(&self) -> TransportOptions {
        TransportOptions {
            use_ssl: self.use_ssl,
            timeout: self.timeout,
        }
    }
}

fn push_param(params: &mut QueryParams, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        params.push((key, value.to_string()));
    }
}

/// Resolve a text option, accepting scalars written without quotes in YAML.
fn string_option(conf: &ConfigResolver, key: &str) -> Result<Option<String>> {
    match conf.option(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
            Ok(render_param(value))
        }
        Some(other) => Err(AnalyticsError::Config(format!(
            "Invalid value for option '{}': expected a string, got {}",
            key, other
        ))),
    }
}
