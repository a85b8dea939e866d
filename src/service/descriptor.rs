//! Service descriptor data structures, defaults, and validation.
//!
//! A descriptor pins down everything the pipeline needs to know about one
//! remote authentication service: its HTTPS base URL, the routes for the
//! account operations, and the tunables governing rate limits, lockouts,
//! refresh, and retries. Descriptors are validated on construction so the
//! pipeline never has to re-check them per request.

// self
use crate::{_prelude::*, auth::ServiceId, error::ValidationError};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ServiceDescriptorError {
	/// A base URL is mandatory.
	#[error("Missing base URL.")]
	MissingBaseUrl,
	/// The service must be reached over HTTPS.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// Routes must be absolute paths.
	#[error("The {route} route must be a non-empty path starting with '/': {value}.")]
	InvalidRoute {
		/// Which route failed validation.
		route: &'static str,
		/// Route value that failed validation.
		value: String,
	},
	/// Window durations and attempt budgets must be positive.
	#[error("The {field} limit must be positive.")]
	NonPositiveLimit {
		/// Which limit failed validation.
		field: &'static str,
	},
	/// The retry delay cap cannot undercut the base delay.
	#[error("The retry delay cap must be at least the base delay.")]
	RetryDelayCapBelowBase,
}

/// Routes exposed by the authentication service for account operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceRoutes {
	/// Login route.
	pub login: String,
	/// Registration route.
	pub register: String,
	/// Token refresh route.
	pub refresh: String,
	/// Logout notification route.
	pub logout: String,
}
impl Default for ServiceRoutes {
	fn default() -> Self {
		Self {
			login: "/auth/login".into(),
			register: "/auth/register".into(),
			refresh: "/auth/refresh".into(),
			logout: "/auth/logout".into(),
		}
	}
}

/// Tunables governing admission control, refresh, and retry behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceLimits {
	/// Sliding rate-limit window applied per endpoint.
	pub rate_window: Duration,
	/// Requests admitted per endpoint inside one window.
	pub max_requests_per_window: usize,
	/// Failed-login lockout window measured from the first failure.
	pub lockout_window: Duration,
	/// Failed attempts tolerated before login locks.
	pub max_login_attempts: u32,
	/// Tokens within this buffer of expiry are treated as already expired.
	pub refresh_buffer: Duration,
	/// Retries attempted after the initial call for retryable failures.
	pub max_retry_attempts: u32,
	/// First retry delay; later delays double from here.
	pub retry_base_delay: Duration,
	/// Upper bound on any single retry delay, before jitter.
	pub retry_max_delay: Duration,
	/// Wait advertised on 429 responses that carry no `Retry-After` header.
	pub default_retry_after: Duration,
}
impl Default for ServiceLimits {
	fn default() -> Self {
		Self {
			rate_window: Duration::seconds(60),
			max_requests_per_window: 20,
			lockout_window: Duration::minutes(15),
			max_login_attempts: 5,
			refresh_buffer: Duration::seconds(60),
			max_retry_attempts: 3,
			retry_base_delay: Duration::milliseconds(500),
			retry_max_delay: Duration::seconds(8),
			default_retry_after: Duration::seconds(60),
		}
	}
}

/// Immutable, validated service descriptor consumed by the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
	/// Descriptor identifier.
	pub id: ServiceId,
	/// HTTPS base URL of the service.
	pub base: Url,
	/// Account-operation routes.
	pub routes: ServiceRoutes,
	/// Admission, refresh, and retry tunables.
	pub limits: ServiceLimits,
}
impl ServiceDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ServiceId) -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::new(id)
	}

	/// Resolves an endpoint path against the base URL.
	///
	/// Endpoints are absolute paths (leading `/`, optionally with a query
	/// string) appended to the base URL, so a base of
	/// `https://api.example.com/v2` resolves `/auth/login` to
	/// `https://api.example.com/v2/auth/login`. Malformed endpoints surface as
	/// [`ValidationError`] values tagged with the `endpoint` field.
	pub fn resolve(&self, endpoint: &str) -> Result<Url> {
		validate_endpoint_path(endpoint)?;

		let joined = format!("{}{endpoint}", self.base.as_str().trim_end_matches('/'));

		Url::parse(&joined).map_err(|_| {
			ValidationError::InvalidField { field: "endpoint", reason: "not a valid URL path" }
				.into()
		})
	}

	fn validate(&self) -> Result<(), ServiceDescriptorError> {
		if self.base.scheme() != "https" {
			return Err(ServiceDescriptorError::InsecureBaseUrl { url: self.base.to_string() });
		}

		validate_route("login", &self.routes.login)?;
		validate_route("register", &self.routes.register)?;
		validate_route("refresh", &self.routes.refresh)?;
		validate_route("logout", &self.routes.logout)?;
		self.limits.validate()?;

		Ok(())
	}
}

impl ServiceLimits {
	fn validate(&self) -> Result<(), ServiceDescriptorError> {
		validate_positive_duration("rate_window", self.rate_window)?;
		validate_positive_duration("lockout_window", self.lockout_window)?;
		validate_positive_duration("retry_base_delay", self.retry_base_delay)?;
		validate_positive_duration("default_retry_after", self.default_retry_after)?;

		if self.max_requests_per_window == 0 {
			return Err(ServiceDescriptorError::NonPositiveLimit {
				field: "max_requests_per_window",
			});
		}
		if self.max_login_attempts == 0 {
			return Err(ServiceDescriptorError::NonPositiveLimit { field: "max_login_attempts" });
		}
		if self.refresh_buffer.is_negative() {
			return Err(ServiceDescriptorError::NonPositiveLimit { field: "refresh_buffer" });
		}
		if self.retry_max_delay < self.retry_base_delay {
			return Err(ServiceDescriptorError::RetryDelayCapBelowBase);
		}

		Ok(())
	}
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug)]
pub struct ServiceDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ServiceId,
	/// HTTPS base URL of the service.
	pub base: Option<Url>,
	/// Account-operation routes; defaults cover the common `/auth/*` layout.
	pub routes: ServiceRoutes,
	/// Admission, refresh, and retry tunables.
	pub limits: ServiceLimits,
}
impl ServiceDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ServiceId) -> Self {
		Self { id, base: None, routes: ServiceRoutes::default(), limits: ServiceLimits::default() }
	}

	/// Sets the base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base = Some(url);

		self
	}

	/// Replaces all routes at once.
	pub fn routes(mut self, routes: ServiceRoutes) -> Self {
		self.routes = routes;

		self
	}

	/// Overrides the login route.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.routes.login = route.into();

		self
	}

	/// Overrides the registration route.
	pub fn register_route(mut self, route: impl Into<String>) -> Self {
		self.routes.register = route.into();

		self
	}

	/// Overrides the refresh route.
	pub fn refresh_route(mut self, route: impl Into<String>) -> Self {
		self.routes.refresh = route.into();

		self
	}

	/// Overrides the logout route.
	pub fn logout_route(mut self, route: impl Into<String>) -> Self {
		self.routes.logout = route.into();

		self
	}

	/// Replaces the limit tunables.
	pub fn limits(mut self, limits: ServiceLimits) -> Self {
		self.limits = limits;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, ServiceDescriptorError> {
		let base = self.base.ok_or(ServiceDescriptorError::MissingBaseUrl)?;
		let descriptor =
			ServiceDescriptor { id: self.id, base, routes: self.routes, limits: self.limits };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn validate_route(name: &'static str, value: &str) -> Result<(), ServiceDescriptorError> {
	if value.is_empty()
		|| !value.starts_with('/')
		|| value.chars().any(char::is_whitespace)
	{
		return Err(ServiceDescriptorError::InvalidRoute { route: name, value: value.to_owned() });
	}

	Ok(())
}

fn validate_positive_duration(
	name: &'static str,
	value: Duration,
) -> Result<(), ServiceDescriptorError> {
	if value.is_positive() {
		Ok(())
	} else {
		Err(ServiceDescriptorError::NonPositiveLimit { field: name })
	}
}

fn validate_endpoint_path(endpoint: &str) -> Result<(), ValidationError> {
	if endpoint.is_empty() {
		return Err(ValidationError::MissingField { field: "endpoint" });
	}
	if !endpoint.starts_with('/') {
		return Err(ValidationError::InvalidField {
			field: "endpoint",
			reason: "must start with '/'",
		});
	}
	if endpoint.chars().any(char::is_whitespace) {
		return Err(ValidationError::InvalidField {
			field: "endpoint",
			reason: "contains whitespace",
		});
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	fn service_id() -> ServiceId {
		ServiceId::new("primary").expect("Service id fixture should be valid.")
	}

	fn https_base() -> Url {
		Url::parse("https://api.example.com").expect("Base URL fixture should parse.")
	}

	#[test]
	fn builder_applies_defaults_and_validates() {
		let descriptor = ServiceDescriptor::builder(service_id())
			.base_url(https_base())
			.build()
			.expect("Default descriptor should validate.");

		assert_eq!(descriptor.routes.login, "/auth/login");
		assert_eq!(descriptor.limits.max_login_attempts, 5);
		assert_eq!(descriptor.limits.rate_window, Duration::seconds(60));
	}

	#[test]
	fn insecure_base_urls_are_rejected() {
		let err = ServiceDescriptor::builder(service_id())
			.base_url(Url::parse("http://api.example.com").expect("URL fixture should parse."))
			.build()
			.expect_err("Plain HTTP base should be rejected.");

		assert!(matches!(err, ServiceDescriptorError::InsecureBaseUrl { .. }));
	}

	#[test]
	fn missing_base_url_is_rejected() {
		assert_eq!(
			ServiceDescriptor::builder(service_id()).build(),
			Err(ServiceDescriptorError::MissingBaseUrl),
		);
	}

	#[test]
	fn relative_routes_are_rejected() {
		let err = ServiceDescriptor::builder(service_id())
			.base_url(https_base())
			.login_route("auth/login")
			.build()
			.expect_err("Route without a leading slash should be rejected.");

		assert!(matches!(err, ServiceDescriptorError::InvalidRoute { route: "login", .. }));
	}

	#[test]
	fn degenerate_limits_are_rejected() {
		let zero_window =
			ServiceLimits { rate_window: Duration::ZERO, ..ServiceLimits::default() };
		let zero_budget =
			ServiceLimits { max_requests_per_window: 0, ..ServiceLimits::default() };
		let inverted_delays = ServiceLimits {
			retry_base_delay: Duration::seconds(10),
			retry_max_delay: Duration::seconds(1),
			..ServiceLimits::default()
		};

		for limits in [zero_window, zero_budget] {
			assert!(ServiceDescriptor::builder(service_id())
				.base_url(https_base())
				.limits(limits)
				.build()
				.is_err());
		}

		assert_eq!(
			ServiceDescriptor::builder(service_id())
				.base_url(https_base())
				.limits(inverted_delays)
				.build(),
			Err(ServiceDescriptorError::RetryDelayCapBelowBase),
		);
	}

	#[test]
	fn resolve_appends_paths_to_the_base() {
		let bare = ServiceDescriptor::builder(service_id())
			.base_url(https_base())
			.build()
			.expect("Descriptor fixture should validate.");
		let prefixed = ServiceDescriptor::builder(service_id())
			.base_url(Url::parse("https://api.example.com/v2").expect("URL fixture should parse."))
			.build()
			.expect("Prefixed descriptor fixture should validate.");

		assert_eq!(
			bare.resolve("/auth/login").expect("Route should resolve.").as_str(),
			"https://api.example.com/auth/login",
		);
		assert_eq!(
			prefixed.resolve("/auth/login").expect("Route should resolve.").as_str(),
			"https://api.example.com/v2/auth/login",
		);
		assert_eq!(
			prefixed.resolve("/users?limit=5").expect("Query routes should resolve.").as_str(),
			"https://api.example.com/v2/users?limit=5",
		);
	}

	#[test]
	fn resolve_rejects_malformed_endpoints() {
		let descriptor = ServiceDescriptor::builder(service_id())
			.base_url(https_base())
			.build()
			.expect("Descriptor fixture should validate.");

		assert!(matches!(
			descriptor.resolve(""),
			Err(Error::Validation(ValidationError::MissingField { field: "endpoint" })),
		));
		assert!(matches!(
			descriptor.resolve("auth/login"),
			Err(Error::Validation(ValidationError::InvalidField { field: "endpoint", .. })),
		));
		assert!(matches!(
			descriptor.resolve("/auth login"),
			Err(Error::Validation(ValidationError::InvalidField { field: "endpoint", .. })),
		));
	}
}
