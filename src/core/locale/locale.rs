// Localized message templates.
//
// Templates use `{name}` placeholders filled by `render`. Only English
// defaults ship with the bot; translations are supplied by the caller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Locale {
    /// {user}, {reason}, {ban_delay_min}
    pub spam_restrict_notice: String,
    /// {user}, {user_id}, {chat}, {reason}
    pub audit_log_spam_restricted: String,
    /// {chat_id}
    pub chat_added_to_moderate: String,
    pub chat_removed_from_moderate: String,
    pub chat_not_moderated: String,
    pub chat_already_moderated: String,
    /// {chat_id}, {chat_name}, {user}
    pub audit_log_chat_set: String,
    /// {old_chat_name}, {old_chat_id}, {new_chat_name}, {new_chat_id}, {user}
    pub audit_log_chat_updated: String,
    /// {user}
    pub audit_log_chat_removed: String,
    pub audit_log_chat_not_found: String,
    /// {user_id}, {error}
    pub ban_failed: String,
    /// {user_id}
    pub ban_success: String,
    /// {banned_user}, {banned_by}, {message}, {chat}
    pub audit_log_user_banned_by_reply: String,
    /// {banned_id}, {banned_by}, {chat}
    pub audit_log_user_banned_by_id: String,
    pub ban_user_not_found: String,
    pub ban_admin_refused: String,
    pub ban_community_not_found: String,
    /// {community_id}
    pub ban_community_success: String,
    /// {community_id}, {error}
    pub ban_community_failed: String,
    /// {community_id}
    pub community_already_banned: String,
    /// {community_id}, {banned_by}, {chat}
    pub audit_log_community_banned_by_id: String,
    pub audit_log_community_not_found: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            spam_restrict_notice: "{user}, your message looks like spam ({reason}) and you can no longer write here. \
If this is a mistake, contact any admin of this chat. You will be removed in {ban_delay_min} minutes."
                .to_string(),
            audit_log_spam_restricted: "Restricted {user} (`{user_id}`) in {chat}: {reason}".to_string(),
            chat_added_to_moderate: "Chat `{chat_id}` is now moderated.".to_string(),
            chat_removed_from_moderate: "Chat `{chat_id}` is no longer moderated.".to_string(),
            chat_not_moderated: "Chat `{chat_id}` is not moderated.".to_string(),
            chat_already_moderated: "Chat `{chat_id}` is already moderated.".to_string(),
            audit_log_chat_set: "{user} made {chat_name} (`{chat_id}`) the audit log chat.".to_string(),
            audit_log_chat_updated: "{user} moved the audit log from {old_chat_name} (`{old_chat_id}`) to {new_chat_name} (`{new_chat_id}`).".to_string(),
            audit_log_chat_removed: "{user} disabled the audit log.".to_string(),
            audit_log_chat_not_found: "No audit log chat is set.".to_string(),
            ban_failed: "Failed to ban `{user_id}`: {error}".to_string(),
            ban_success: "User `{user_id}` has been banned.".to_string(),
            audit_log_user_banned_by_reply: "{banned_by} banned {banned_user} in {chat}. Message: {message}".to_string(),
            audit_log_user_banned_by_id: "{banned_by} banned `{banned_id}` in {chat}.".to_string(),
            ban_user_not_found: "Reply to a message or pass a user id to ban.".to_string(),
            ban_admin_refused: "Admins cannot be banned.".to_string(),
            ban_community_not_found: "Reply to a forwarded message or pass a channel id to ban.".to_string(),
            ban_community_success: "Content from `{community_id}` is now banned.".to_string(),
            ban_community_failed: "Failed to ban `{community_id}`: {error}".to_string(),
            community_already_banned: "`{community_id}` is already banned.".to_string(),
            audit_log_community_banned_by_id: "{banned_by} banned content from `{community_id}` in {chat}.".to_string(),
            audit_log_community_not_found: "Community ban requested without a target.".to_string(),
        }
    }
}

/// Characters with meaning in Telegram's legacy Markdown.
const MARKDOWN_MARKERS: [char; 4] = ['_', '*', '`', '['];

/// Escape user-supplied text so it renders literally in a Markdown message.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_MARKERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Link text cannot carry escapes, so markers (and `]`) are dropped instead.
pub fn link_text(text: &str) -> String {
    text.chars()
        .filter(|c| !MARKDOWN_MARKERS.contains(c) && *c != ']')
        .collect()
}

/// Fill `{name}` placeholders. Unknown placeholders are left untouched.
pub fn render(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let text = render(
            "Failed to ban `{user_id}`: {error}",
            &[("user_id", "42".to_string()), ("error", "no rights".to_string())],
        );
        assert_eq!(text, "Failed to ban `42`: no rights");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        assert_eq!(render("{a} {b}", &[("a", "x".to_string())]), "x {b}");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("john_doe"), "john\\_doe");
        assert_eq!(escape_markdown("*bold* `code` [link]"), "\\*bold\\* \\`code\\` \\[link]");
        assert_eq!(escape_markdown("plain text 82%"), "plain text 82%");
    }

    #[test]
    fn test_link_text_drops_markers() {
        assert_eq!(link_text("john_doe"), "johndoe");
        assert_eq!(link_text("[admin]*"), "admin");
    }

    #[test]
    fn test_partial_locale_uses_defaults() {
        let locale: Locale =
            serde_json::from_str(r#"{"ban_success": "Done: {user_id}"}"#).unwrap();
        assert_eq!(locale.ban_success, "Done: {user_id}");
        assert_eq!(locale.ban_failed, Locale::default().ban_failed);
    }
}
