//! Identifier canonicalization and classification
//!
//! Node identifiers have the shape `<package>.<nodeName>`. Standard packages are
//! stripped down to the bare node name so the same capability found through
//! different candidate sources collapses to one entry; community packages keep
//! their namespace.

use crate::discovery::types::CapabilityOrigin;
use once_cell::sync::Lazy;
use regex::Regex;

/// Namespace prefixes of the built-in node packages
pub const STANDARD_PREFIXES: &[&str] = &["n8n-nodes-base.", "@n8n/n8n-nodes-langchain."];

/// Prefix of the default standard package, used when generating candidates
pub const BASE_PREFIX: &str = "n8n-nodes-base.";

/// Prefix of the AI node package
pub const LANGCHAIN_PREFIX: &str = "@n8n/n8n-nodes-langchain.";

/// Lowercase-to-uppercase boundaries in camelCase names
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid regex pattern"));

/// Valid npm package names (optionally scoped)
static PACKAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(@[a-z0-9-~][a-z0-9-._~]*/)?[a-z0-9-~][a-z0-9-._~]*$").expect("Invalid regex pattern")
});

/// Valid node names: start with a letter, then alphanumerics
static NODE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("Invalid regex pattern"));

/// Strip a standard namespace prefix; other identifiers are returned trimmed
pub fn canonical_id(node_type: &str) -> String {
    let trimmed = node_type.trim();
    for prefix in STANDARD_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    trimmed.to_string()
}

/// Split `<package>.<node>` at the last dot
pub fn split_namespace(node_type: &str) -> Option<(&str, &str)> {
    let (package, node) = node_type.rsplit_once('.')?;
    if package.is_empty() || node.is_empty() {
        return None;
    }
    Some((package, node))
}

/// Classify an identifier by its namespace
pub fn infer_origin(node_type: &str) -> CapabilityOrigin {
    if STANDARD_PREFIXES.iter().any(|p| node_type.starts_with(p)) {
        return CapabilityOrigin::Standard;
    }
    match split_namespace(node_type) {
        Some(_) => CapabilityOrigin::Community,
        None => CapabilityOrigin::Custom,
    }
}

/// Package name for a namespaced identifier
pub fn package_name(node_type: &str) -> Option<String> {
    split_namespace(node_type).map(|(package, _)| package.to_string())
}

/// Bare node name of an identifier
pub fn node_name(node_type: &str) -> &str {
    split_namespace(node_type).map(|(_, node)| node).unwrap_or(node_type)
}

/// Whether an identifier is syntactically plausible
pub fn is_valid_identifier(node_type: &str) -> bool {
    match split_namespace(node_type) {
        Some((package, node)) => PACKAGE_NAME.is_match(package) && NODE_NAME.is_match(node),
        None => NODE_NAME.is_match(node_type),
    }
}

/// `googleSheetsTrigger` -> `Google Sheets Trigger`
pub fn display_name(name: &str) -> String {
    let spaced = CAMEL_BOUNDARY.replace_all(name, "$1 $2");
    spaced
        .split(|c: char| c == ' ' || c == '-' || c == '_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive the likely node name of a community package: `n8n-nodes-foo-bar` -> `fooBar`
pub fn node_name_from_package(package: &str) -> Option<String> {
    let unscoped = package.rsplit('/').next().unwrap_or(package);
    let stem = unscoped.strip_prefix("n8n-nodes-")?;

    let mut name = String::new();
    for (index, part) in stem.split(|c: char| c == '-' || c == '_' || c == '.').filter(|p| !p.is_empty()).enumerate() {
        if index == 0 {
            name.push_str(part);
        } else {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                name.extend(first.to_uppercase());
                name.push_str(chars.as_str());
            }
        }
    }

    if NODE_NAME.is_match(&name) {
        Some(name)
    } else {
        None
    }
}

/// Infer a category label from an identifier when the catalog has no entry
pub fn infer_category(node_type: &str) -> &'static str {
    let lower = node_name(node_type).to_lowercase();
    let has = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));

    if lower.ends_with("trigger") || has(&["webhook", "cron", "schedule", "interval"]) {
        "trigger"
    } else if node_type.starts_with(LANGCHAIN_PREFIX)
        || has(&["openai", "anthropic", "agent", "llm", "chat", "embedding", "vector", "mistral", "ollama"])
    {
        "ai"
    } else if has(&["slack", "discord", "telegram", "email", "gmail", "teams", "twilio", "mattermost", "whatsapp", "sms"]) {
        "communication"
    } else if has(&["postgres", "mysql", "mongo", "redis", "sheet", "airtable", "database", "sql", "csv", "spreadsheet", "supabase"]) {
        "data"
    } else if has(&["github", "gitlab", "jira", "http", "code", "function", "git", "ssh", "graphql"]) {
        "development"
    } else if has(&["notion", "trello", "asana", "calendar", "drive", "todoist", "clickup", "monday"]) {
        "productivity"
    } else {
        "utility"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_id_strips_standard_prefixes() {
        assert_eq!(canonical_id("n8n-nodes-base.slack"), "slack");
        assert_eq!(canonical_id("@n8n/n8n-nodes-langchain.agent"), "agent");
        assert_eq!(canonical_id("slack"), "slack");
        assert_eq!(canonical_id("n8n-nodes-discord.discord"), "n8n-nodes-discord.discord");
    }

    #[test]
    fn test_infer_origin() {
        assert_eq!(infer_origin("n8n-nodes-base.httpRequest"), CapabilityOrigin::Standard);
        assert_eq!(infer_origin("@n8n/n8n-nodes-langchain.agent"), CapabilityOrigin::Standard);
        assert_eq!(infer_origin("n8n-nodes-mcp.mcpClient"), CapabilityOrigin::Community);
        assert_eq!(infer_origin("myNode"), CapabilityOrigin::Custom);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("googleSheetsTrigger"), "Google Sheets Trigger");
        assert_eq!(display_name("httpRequest"), "Http Request");
        assert_eq!(display_name("slack"), "Slack");
    }

    #[test]
    fn test_node_name_from_package() {
        assert_eq!(node_name_from_package("n8n-nodes-mcp"), Some("mcp".to_string()));
        assert_eq!(node_name_from_package("n8n-nodes-text-manipulation"), Some("textManipulation".to_string()));
        assert_eq!(node_name_from_package("@acme/n8n-nodes-foo"), Some("foo".to_string()));
        assert_eq!(node_name_from_package("lodash"), None);
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("n8n-nodes-base.slack"));
        assert!(is_valid_identifier("@n8n/n8n-nodes-langchain.agent"));
        assert!(is_valid_identifier("slack"));
        assert!(!is_valid_identifier("n8n-nodes-base.sl ack"));
        assert!(!is_valid_identifier(".slack"));
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(infer_category("n8n-nodes-base.githubTrigger"), "trigger");
        assert_eq!(infer_category("@n8n/n8n-nodes-langchain.lmChatOpenAi"), "ai");
        assert_eq!(infer_category("n8n-nodes-base.mattermost"), "communication");
        assert_eq!(infer_category("n8n-nodes-base.postgres"), "data");
        assert_eq!(infer_category("n8n-nodes-base.xml"), "utility");
    }
}
