//! Built-in catalog of well-known nodes
//!
//! The catalog seeds discovery with identifiers that are very likely to exist and
//! enriches discovered descriptors with curated names, descriptions, categories,
//! priorities and credential references.

use crate::discovery::canonical::{BASE_PREFIX, LANGCHAIN_PREFIX};
use crate::discovery::types::{Candidate, CandidateSource, ResourceCost};
use std::collections::HashSet;

/// Curated metadata for a well-known node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Bare node name (canonical id)
    pub name: &'static str,
    /// Namespace prefix the node lives under
    pub prefix: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    /// Base priority 0-100
    pub priority: u8,
    pub credential_type: Option<&'static str>,
    pub cost: ResourceCost,
}

impl CatalogEntry {
    /// Full identifier including namespace
    pub fn node_type(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }
}

#[allow(clippy::too_many_arguments)]
const fn entry(
    name: &'static str,
    prefix: &'static str,
    display_name: &'static str,
    description: &'static str,
    category: &'static str,
    priority: u8,
    credential_type: Option<&'static str>,
    cost: ResourceCost,
) -> CatalogEntry {
    CatalogEntry {
        name,
        prefix,
        display_name,
        description,
        category,
        priority,
        credential_type,
        cost,
    }
}

use ResourceCost::{High, Low, Medium};

static CATALOG: &[CatalogEntry] = &[
    // Core
    entry("httpRequest", BASE_PREFIX, "HTTP Request", "Make HTTP requests to any REST API", "development", 95, None, Medium),
    entry("webhook", BASE_PREFIX, "Webhook", "Start a workflow when an HTTP request is received", "trigger", 95, None, Low),
    entry("code", BASE_PREFIX, "Code", "Run custom JavaScript or Python code", "development", 90, None, Medium),
    entry("set", BASE_PREFIX, "Edit Fields (Set)", "Add, modify or remove item fields", "utility", 85, None, Low),
    entry("if", BASE_PREFIX, "If", "Route items based on a condition", "utility", 85, None, Low),
    entry("switch", BASE_PREFIX, "Switch", "Route items to different branches by rules", "utility", 80, None, Low),
    entry("merge", BASE_PREFIX, "Merge", "Merge data from multiple streams", "utility", 80, None, Low),
    entry("filter", BASE_PREFIX, "Filter", "Remove items that do not match a condition", "utility", 75, None, Low),
    entry("splitInBatches", BASE_PREFIX, "Loop Over Items", "Split items into batches and loop over them", "utility", 70, None, Low),
    entry("wait", BASE_PREFIX, "Wait", "Pause execution for a time or until a webhook call", "utility", 65, None, Low),
    entry("noOp", BASE_PREFIX, "No Operation", "Pass items through unchanged", "utility", 30, None, Low),
    entry("stopAndError", BASE_PREFIX, "Stop and Error", "Stop the workflow with an error", "utility", 55, None, Low),
    entry("executeWorkflow", BASE_PREFIX, "Execute Workflow", "Run another workflow as a sub-workflow", "development", 70, None, Medium),
    entry("respondToWebhook", BASE_PREFIX, "Respond to Webhook", "Return data to the caller of a webhook", "development", 70, None, Low),
    entry("aggregate", BASE_PREFIX, "Aggregate", "Combine fields of many items into one", "data", 65, None, Low),
    entry("itemLists", BASE_PREFIX, "Item Lists", "Split, sort, limit and summarize item lists", "data", 60, None, Low),
    entry("dateTime", BASE_PREFIX, "Date & Time", "Format and manipulate dates", "utility", 60, None, Low),
    entry("crypto", BASE_PREFIX, "Crypto", "Hash, sign and encrypt values", "utility", 45, None, Low),
    entry("xml", BASE_PREFIX, "XML", "Convert between XML and JSON", "utility", 40, None, Low),
    entry("html", BASE_PREFIX, "HTML", "Extract content from or generate HTML", "utility", 50, None, Low),
    entry("markdown", BASE_PREFIX, "Markdown", "Convert between Markdown and HTML", "utility", 40, None, Low),
    entry("compression", BASE_PREFIX, "Compression", "Compress and decompress files", "utility", 35, None, Medium),
    entry("readWriteFile", BASE_PREFIX, "Read/Write Files from Disk", "Read or write files on the host", "utility", 50, None, Medium),
    entry("executeCommand", BASE_PREFIX, "Execute Command", "Run shell commands on the host", "development", 45, None, High),
    entry("ssh", BASE_PREFIX, "SSH", "Run commands and transfer files over SSH", "development", 45, Some("sshPassword"), Medium),
    entry("ftp", BASE_PREFIX, "FTP", "Transfer files over FTP or SFTP", "development", 40, Some("ftp"), Medium),
    entry("graphql", BASE_PREFIX, "GraphQL", "Query a GraphQL endpoint", "development", 55, None, Medium),
    // Triggers
    entry("manualTrigger", BASE_PREFIX, "Manual Trigger", "Start a workflow manually", "trigger", 80, None, Low),
    entry("scheduleTrigger", BASE_PREFIX, "Schedule Trigger", "Start a workflow on a schedule", "trigger", 85, None, Low),
    entry("emailReadImap", BASE_PREFIX, "Email Trigger (IMAP)", "Start a workflow when an email arrives", "trigger", 55, Some("imap"), Medium),
    entry("errorTrigger", BASE_PREFIX, "Error Trigger", "Start a workflow when another workflow fails", "trigger", 60, None, Low),
    entry("formTrigger", BASE_PREFIX, "Form Trigger", "Start a workflow from a hosted form submission", "trigger", 60, None, Low),
    // Communication
    entry("slack", BASE_PREFIX, "Slack", "Send messages and manage channels in Slack", "communication", 85, Some("slackApi"), Low),
    entry("discord", BASE_PREFIX, "Discord", "Send messages to Discord channels", "communication", 70, Some("discordWebhookApi"), Low),
    entry("telegram", BASE_PREFIX, "Telegram", "Send and manage Telegram messages", "communication", 70, Some("telegramApi"), Low),
    entry("gmail", BASE_PREFIX, "Gmail", "Send, read and label Gmail messages", "communication", 80, Some("gmailOAuth2"), Low),
    entry("emailSend", BASE_PREFIX, "Send Email", "Send email over SMTP", "communication", 75, Some("smtp"), Low),
    entry("microsoftTeams", BASE_PREFIX, "Microsoft Teams", "Post messages to Microsoft Teams", "communication", 65, Some("microsoftTeamsOAuth2Api"), Low),
    entry("twilio", BASE_PREFIX, "Twilio", "Send SMS and WhatsApp messages via Twilio", "communication", 55, Some("twilioApi"), Low),
    entry("mattermost", BASE_PREFIX, "Mattermost", "Post messages to Mattermost", "communication", 45, Some("mattermostApi"), Low),
    // Data
    entry("googleSheets", BASE_PREFIX, "Google Sheets", "Read and write Google Sheets rows", "data", 85, Some("googleSheetsOAuth2Api"), Medium),
    entry("postgres", BASE_PREFIX, "Postgres", "Query and modify a PostgreSQL database", "data", 75, Some("postgres"), Medium),
    entry("mySql", BASE_PREFIX, "MySQL", "Query and modify a MySQL database", "data", 70, Some("mySql"), Medium),
    entry("mongoDb", BASE_PREFIX, "MongoDB", "Query and modify MongoDB collections", "data", 65, Some("mongoDb"), Medium),
    entry("redis", BASE_PREFIX, "Redis", "Read and write Redis keys", "data", 60, Some("redis"), Low),
    entry("airtable", BASE_PREFIX, "Airtable", "Read and write Airtable records", "data", 70, Some("airtableTokenApi"), Medium),
    entry("supabase", BASE_PREFIX, "Supabase", "Manage rows in a Supabase database", "data", 60, Some("supabaseApi"), Medium),
    entry("spreadsheetFile", BASE_PREFIX, "Spreadsheet File", "Read and write CSV and spreadsheet files", "data", 55, None, Medium),
    // Development
    entry("github", BASE_PREFIX, "GitHub", "Manage GitHub issues, repositories and releases", "development", 75, Some("githubApi"), Low),
    entry("gitlab", BASE_PREFIX, "GitLab", "Manage GitLab issues and repositories", "development", 60, Some("gitlabApi"), Low),
    entry("jira", BASE_PREFIX, "Jira Software", "Create and update Jira issues", "development", 65, Some("jiraSoftwareCloudApi"), Low),
    // Productivity
    entry("notion", BASE_PREFIX, "Notion", "Manage Notion pages and databases", "productivity", 75, Some("notionApi"), Low),
    entry("googleDrive", BASE_PREFIX, "Google Drive", "Upload, download and manage Drive files", "productivity", 70, Some("googleDriveOAuth2Api"), Medium),
    entry("googleCalendar", BASE_PREFIX, "Google Calendar", "Create and list calendar events", "productivity", 65, Some("googleCalendarOAuth2Api"), Low),
    entry("trello", BASE_PREFIX, "Trello", "Manage Trello boards, lists and cards", "productivity", 55, Some("trelloApi"), Low),
    entry("asana", BASE_PREFIX, "Asana", "Manage Asana tasks and projects", "productivity", 55, Some("asanaApi"), Low),
    entry("hubspot", BASE_PREFIX, "HubSpot", "Manage HubSpot contacts, deals and companies", "productivity", 60, Some("hubspotApi"), Low),
    // AI
    entry("agent", LANGCHAIN_PREFIX, "AI Agent", "Run an LLM agent that can call tools", "ai", 90, None, High),
    entry("chainLlm", LANGCHAIN_PREFIX, "Basic LLM Chain", "Prompt a language model", "ai", 75, None, High),
    entry("lmChatOpenAi", LANGCHAIN_PREFIX, "OpenAI Chat Model", "OpenAI chat model for AI nodes", "ai", 80, Some("openAiApi"), High),
    entry("lmChatAnthropic", LANGCHAIN_PREFIX, "Anthropic Chat Model", "Anthropic chat model for AI nodes", "ai", 75, Some("anthropicApi"), High),
    entry("embeddingsOpenAi", LANGCHAIN_PREFIX, "Embeddings OpenAI", "Generate embeddings with OpenAI", "ai", 60, Some("openAiApi"), High),
    entry("memoryBufferWindow", LANGCHAIN_PREFIX, "Window Buffer Memory", "Keep recent chat history for an agent", "ai", 55, None, Low),
    entry("chatTrigger", LANGCHAIN_PREFIX, "Chat Trigger", "Start a workflow from a chat message", "trigger", 70, None, Low),
];

/// Name fragments of services that are commonly available but not in the catalog
pub const COMMON_FRAGMENTS: &[&str] = &[
    "activeCampaign", "bitbucket", "box", "clickUp", "clockify", "contentful", "dropbox",
    "elasticsearch", "facebookGraphApi", "freshdesk", "googleBigQuery", "googleDocs", "googleTasks",
    "helpScout", "intercom", "kafka", "linear", "mailchimp", "mailgun", "matrix", "microsoftExcel",
    "microsoftOutlook", "microsoftSql", "mondayCom", "mqtt", "oneDrive", "pipedrive", "rabbitmq",
    "s3", "salesforce", "sendGrid", "shopify", "snowflake", "stripe", "todoist", "typeform",
    "webflow", "wooCommerce", "wordpress", "zendesk", "zoom",
];

/// Suffix variants tried for each generated fragment
pub const FRAGMENT_VARIANTS: &[&str] = &["", "Trigger"];

/// Package name prefix used by community node packages
pub const COMMUNITY_PACKAGE_PREFIX: &str = "n8n-nodes-";

/// Namespace a generated fragment is tried under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternNamespace {
    /// A fixed package prefix such as `n8n-nodes-base.`
    Fixed(&'static str),
    /// A community package named after the fragment, `n8n-nodes-<fragment>.`
    CommunityPackage,
}

impl PatternNamespace {
    pub fn prefix_for(&self, fragment: &str) -> String {
        match self {
            PatternNamespace::Fixed(prefix) => prefix.to_string(),
            PatternNamespace::CommunityPackage => {
                format!("{}{}.", COMMUNITY_PACKAGE_PREFIX, fragment.to_lowercase())
            }
        }
    }
}

/// Namespaces combined with generated fragments
pub const PATTERN_NAMESPACES: &[PatternNamespace] =
    &[PatternNamespace::Fixed(BASE_PREFIX), PatternNamespace::CommunityPackage];

/// All catalog entries
pub fn catalog() -> &'static [CatalogEntry] {
    CATALOG
}

/// Look up a catalog entry by canonical id
pub fn lookup(canonical_id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.name == canonical_id)
}

/// Catalog entries as discovery candidates
pub fn catalog_candidates() -> Vec<Candidate> {
    CATALOG
        .iter()
        .map(|entry| Candidate::new(entry.node_type(), CandidateSource::Catalog))
        .collect()
}

/// Combine common fragments, variants and namespaces into candidates,
/// skipping anything the catalog already covers, capped at `max`
pub fn generate_pattern_candidates(max: usize) -> Vec<Candidate> {
    let known: HashSet<&str> = CATALOG.iter().map(|entry| entry.name).collect();
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    'outer: for fragment in COMMON_FRAGMENTS {
        for variant in FRAGMENT_VARIANTS {
            let name = format!("{}{}", fragment, variant);
            if known.contains(name.as_str()) {
                continue;
            }
            for namespace in PATTERN_NAMESPACES {
                if candidates.len() >= max {
                    break 'outer;
                }
                let node_type = format!("{}{}", namespace.prefix_for(fragment), name);
                if seen.insert(node_type.clone()) {
                    candidates.push(Candidate::new(node_type, CandidateSource::Pattern));
                }
            }
        }
    }

    candidates
}
