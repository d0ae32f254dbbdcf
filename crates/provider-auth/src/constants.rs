//! Provider OAuth endpoints and scopes
//!
//! Defaults for the public provider endpoints. Every endpoint can be
//! overridden from configuration; tests point them at a local server.

/// CRM authorization page the browser is redirected to
pub const HUBSPOT_AUTHORIZE_ENDPOINT: &str = "https://app.hubspot.com/oauth/authorize";

/// CRM token endpoint for code exchange and refresh
pub const HUBSPOT_TOKEN_ENDPOINT: &str = "https://api.hubapi.com/oauth/v1/token";

/// CRM API base, used to resolve the portal id of a fresh token
pub const HUBSPOT_API_BASE: &str = "https://api.hubapi.com";

/// Path of the account details call relative to `HUBSPOT_API_BASE`
pub const HUBSPOT_ACCOUNT_INFO_PATH: &str = "/account-info/v3/details";

/// CRM scopes requested on connect. Joined with spaces in the authorization URL.
pub const HUBSPOT_SCOPES: &[&str] = &[
    "oauth",
    "crm.objects.contacts.read",
    "crm.objects.contacts.write",
    "crm.objects.companies.read",
    "crm.objects.companies.write",
    "crm.objects.deals.read",
    "crm.objects.deals.write",
    "crm.objects.invoices.read",
    "crm.objects.invoices.write",
    "crm.objects.line_items.read",
    "crm.objects.line_items.write",
    "crm.dealsplits.read_write",
];

/// Multi-status code the CRM uses for batch responses with partial failures
pub const HUBSPOT_MULTI_STATUS: u16 = 477;

/// Messaging authorization page
pub const SLACK_AUTHORIZE_ENDPOINT: &str = "https://slack.com/oauth/v2/authorize";

/// Messaging token endpoint (code exchange only)
pub const SLACK_TOKEN_ENDPOINT: &str = "https://slack.com/api/oauth.v2.access";

/// Messaging bot scopes. Joined with commas in the authorization URL.
pub const SLACK_SCOPES: &[&str] = &["chat:write"];
