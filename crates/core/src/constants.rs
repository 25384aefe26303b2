/// Constants used throughout the tpen codebase
// Storage keys
pub const USER_TOKEN_KEY: &str = "userToken";
pub const ID_TOKEN_QUERY_PARAM: &str = "idToken";

// Claims
pub const DEFAULT_AGENT_CLAIM: &str = "http://store.rerum.io/agent";
pub const AGENT_CLAIM_SUFFIX: &str = "/agent";
pub const EXPIRY_CLAIM: &str = "exp";

// Services
pub const DEFAULT_API_BASE: &str = "https://dev.api.t-pen.org";

// Environment variable names
pub const TPEN_API_VAR: &str = "TPEN_API";
pub const TPEN_AGENT_CLAIM_VAR: &str = "TPEN_AGENT_CLAIM";
pub const TPEN_STORAGE_VAR: &str = "TPEN_STORAGE";
pub const TPEN_LOG_VAR: &str = "TPEN_LOG";
pub const TPEN_CONFIG_VAR: &str = "TPEN_CONFIG";

// Event names
pub const EVENT_PROJECT_LOADED: &str = "tpen-project-loaded";
pub const EVENT_PROJECT_LOAD_FAILED: &str = "tpen-project-load-failed";
pub const EVENT_USER_LOADED: &str = "tpen-user-loaded";
pub const EVENT_AUTHENTICATED: &str = "tpen-authenticated";
pub const EVENT_TOKEN_EXPIRATION: &str = "token-expiration";
pub const EVENT_TOAST: &str = "tpen-toast";
pub const EVENT_VAULT_ERROR: &str = "tpen-vault-error";
