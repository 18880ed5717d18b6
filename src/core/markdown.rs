//! Plain Markdown transcript of a conversation.

use crate::core::conversation::MessageRecord;
use crate::core::message::Role;
use chrono::NaiveDate;

/// Which roles to include and whether to prefix each block with its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub assistant: bool,
    pub user: bool,
    pub system: bool,
    pub labels: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            assistant: true,
            user: true,
            system: false,
            labels: false,
        }
    }
}

impl ExtractOptions {
    fn includes(&self, role: Role, content: &str) -> bool {
        match role {
            Role::Assistant => self.assistant,
            Role::User => self.user && !content.is_empty(),
            Role::System => self.system,
            Role::App => false,
        }
    }
}

/// Render records as Markdown: each included message trimmed and followed by
/// a blank line. Records with unknown roles are skipped.
pub fn extract_markdown(records: &[MessageRecord], options: &ExtractOptions) -> String {
    let mut markdown = String::new();

    for record in records {
        let Ok(role) = Role::try_from(record.role.as_str()) else {
            continue;
        };
        if !options.includes(role, &record.content) {
            continue;
        }

        if options.labels {
            markdown.push_str("**");
            markdown.push_str(role.label());
            markdown.push_str(":** ");
        }
        markdown.push_str(record.content.trim());
        markdown.push_str("\n\n");
    }

    markdown
}

/// Default file name for a Markdown extract made on `date`.
pub fn extract_file_name(date: NaiveDate) -> String {
    format!("rpchat-extract-{date}.md")
}
