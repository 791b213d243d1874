//! Header labels, endpoints, and protocol defaults
//!
//! Endpoint constants are defaults only. Every flow helper accepts an
//! explicit endpoint so tests and alternate deployments can point elsewhere.

/// Authorization header prefix for login tokens
pub const LOGIN_AUTH_LABEL: &str = "GoogleLogin auth=";

/// Authorization header prefix for delegated (AuthSub) tokens
pub const AUTHSUB_AUTH_LABEL: &str = "AuthSub token=";

/// Authorization header prefix for OAuth 1.0 signed requests
pub const OAUTH_AUTH_LABEL: &str = "OAuth ";

/// Login endpoint that returns `Auth=` lines
pub const CLIENT_LOGIN_URL: &str = "https://www.google.com/accounts/ClientLogin";

/// Base used to complete the relative `CaptchaUrl=` value of a challenge
pub const CAPTCHA_BASE_URL: &str = "http://www.google.com/accounts/";

/// Default `accountType` field of a login request
pub const DEFAULT_ACCOUNT_TYPE: &str = "HOSTED_OR_GOOGLE";

/// Page the user is sent to for delegated authorization
pub const AUTHSUB_REQUEST_URL: &str = "https://www.google.com/accounts/AuthSubRequest";

/// Endpoint exchanging a single-use delegated token for a session token
pub const AUTHSUB_SESSION_TOKEN_URL: &str = "https://www.google.com/accounts/AuthSubSessionToken";

/// Query parameter carrying the requested scopes back on the redirect
pub const DEFAULT_SCOPES_PARAM: &str = "auth_sub_scopes";

/// Hosted domain value meaning "a regular account"
pub const DEFAULT_DOMAIN: &str = "default";

/// OAuth 1.0 request token endpoint
pub const REQUEST_TOKEN_URL: &str = "https://www.google.com/accounts/OAuthGetRequestToken";

/// OAuth 1.0 access token endpoint
pub const ACCESS_TOKEN_URL: &str = "https://www.google.com/accounts/OAuthGetAccessToken";

/// OAuth 1.0 user authorization page
pub const OAUTH_AUTHORIZE_URL: &str = "https://www.google.com/accounts/OAuthAuthorizeToken";

/// OAuth protocol version sent in `oauth_version`
pub const OAUTH_VERSION: &str = "1.0";

/// Out-of-band callback used when no callback URL is configured
pub const OOB_CALLBACK: &str = "oob";
