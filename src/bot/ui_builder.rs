//! UI Builder module for creating keyboards and formatting captions

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, UserId};
use teloxide::utils::html::escape;
use tracing::warn;

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import search types
use crate::pinterest::SearchResult;

/// Callback data prefix of the "show more" button
pub const SHOW_MORE_PREFIX: &str = "more_";

/// Longest query, description or title shown in a caption, in characters.
/// Keeps captions under Telegram's 1024 character limit.
pub const MAX_FRAGMENT_CHARS: usize = 300;

/// Where the search term of a result set came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOrigin {
    /// Produced by the image tagger from a photo
    Described(String),
    /// Typed by the user
    Typed(String),
}

impl QueryOrigin {
    pub fn text(&self) -> &str {
        match self {
            QueryOrigin::Described(text) | QueryOrigin::Typed(text) => text,
        }
    }
}

/// A button attached under a result photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultButton {
    Link { text: String, url: String },
    ShowMore { text: String, data: String },
}

/// A photo message ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoReply {
    pub image_url: String,
    /// HTML caption
    pub caption: String,
    /// One button per keyboard row
    pub buttons: Vec<ResultButton>,
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

fn fragment(text: &str) -> String {
    escape(&truncate_chars(text, MAX_FRAGMENT_CHARS))
}

/// Caption of the first result: the query or description, then the title
pub fn search_caption(origin: &QueryOrigin, first: &SearchResult, language_code: Option<&str>) -> String {
    let label_key = match origin {
        QueryOrigin::Described(_) => "label-description",
        QueryOrigin::Typed(_) => "label-query",
    };

    format!(
        "🔍 <b>{}</b>\n\n📝 <b>{}</b> {}\n\n📌 <b>{}</b> {}",
        escape(&t_lang("results-title", language_code)),
        escape(&t_lang(label_key, language_code)),
        fragment(origin.text()),
        escape(&t_lang("label-title", language_code)),
        fragment(&first.title)
    )
}

/// Caption of an extra result sent by "show more"; `index` is the position in the result list
pub fn extra_result_caption(index: usize, result: &SearchResult, language_code: Option<&str>) -> String {
    let number = (index + 1).to_string();
    format!(
        "📸 <b>{}</b>\n\n📌 <b>{}</b> {}",
        escape(&t_args_lang("result-number", &[("number", number.as_str())], language_code)),
        escape(&t_lang("label-title", language_code)),
        fragment(&result.title)
    )
}

/// Callback data of the "show more" button for `user_id`
pub fn show_more_data(user_id: UserId) -> String {
    format!("{SHOW_MORE_PREFIX}{}", user_id.0)
}

/// Parse "show more" callback data back into the user id it was created for
pub fn parse_show_more_data(data: &str) -> Option<UserId> {
    data.strip_prefix(SHOW_MORE_PREFIX)?.parse().ok().map(UserId)
}

/// Buttons for a result: a link button when the pin has a link, and a
/// "show more" button when `show_more_for` is set
pub fn result_buttons(
    result: &SearchResult,
    show_more_for: Option<UserId>,
    language_code: Option<&str>,
) -> Vec<ResultButton> {
    let mut buttons = Vec::new();

    if !result.link.is_empty() {
        buttons.push(ResultButton::Link {
            text: t_lang("button-link", language_code),
            url: result.link.clone(),
        });
    }

    if let Some(user_id) = show_more_for {
        buttons.push(ResultButton::ShowMore {
            text: t_lang("button-show-more", language_code),
            data: show_more_data(user_id),
        });
    }

    buttons
}

/// Build the first-result reply. The "show more" button only appears when
/// there is more than one result.
pub fn first_result_reply(
    origin: &QueryOrigin,
    results: &[SearchResult],
    user_id: UserId,
    language_code: Option<&str>,
) -> Option<PhotoReply> {
    let first = results.first()?;
    let show_more_for = (results.len() > 1).then_some(user_id);

    Some(PhotoReply {
        image_url: first.image_url.clone(),
        caption: search_caption(origin, first, language_code),
        buttons: result_buttons(first, show_more_for, language_code),
    })
}

/// Build the reply for the result at `index` of a stored list
pub fn extra_result_reply(index: usize, result: &SearchResult, language_code: Option<&str>) -> PhotoReply {
    PhotoReply {
        image_url: result.image_url.clone(),
        caption: extra_result_caption(index, result, language_code),
        buttons: result_buttons(result, None, language_code),
    }
}

/// Create a single-column inline keyboard, or `None` when there is nothing to show.
///
/// Link buttons whose URL Telegram would reject are dropped.
pub fn create_result_keyboard(buttons: &[ResultButton]) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .iter()
        .filter_map(|button| match button {
            ResultButton::Link { text, url } => match reqwest::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                    Some(InlineKeyboardButton::url(text.clone(), parsed))
                }
                _ => {
                    warn!(url = %url, "Dropping link button with unusable URL");
                    None
                }
            },
            ResultButton::ShowMore { text, data } => {
                Some(InlineKeyboardButton::callback(text.clone(), data.clone()))
            }
        })
        .map(|button| vec![button])
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn pin(title: &str, link: &str) -> SearchResult {
        SearchResult {
            image_url: "https://i.pinimg.com/orig.jpg".to_string(),
            title: title.to_string(),
            link: link.to_string(),
        }
    }

    #[test]
    fn test_show_more_data_round_trip() {
        assert_eq!(show_more_data(UserId(123456)), "more_123456");
        assert_eq!(parse_show_more_data("more_123456"), Some(UserId(123456)));
        assert_eq!(parse_show_more_data("more_abc"), None);
        assert_eq!(parse_show_more_data("edit_1"), None);
    }

    #[test]
    fn test_caption_escapes_html() {
        let caption = search_caption(
            &QueryOrigin::Typed("<b>cats</b> & dogs".to_string()),
            &pin("Tom & Jerry", ""),
            Some("en"),
        );
        assert!(caption.contains("&lt;b&gt;cats&lt;/b&gt; &amp; dogs"));
        assert!(caption.contains("Tom &amp; Jerry"));
        assert!(caption.contains("Query:"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let title = "x".repeat(MAX_FRAGMENT_CHARS + 50);
        let caption = extra_result_caption(1, &pin(&title, ""), Some("en"));
        assert!(caption.contains("Result 2:"));
        assert!(caption.contains('…'));
        assert!(!caption.contains(&title));
    }

    #[test]
    fn test_keyboard_rows() {
        let buttons = vec![
            ResultButton::Link {
                text: "link".to_string(),
                url: "https://example.com/pin".to_string(),
            },
            ResultButton::ShowMore {
                text: "more".to_string(),
                data: "more_1".to_string(),
            },
        ];
        let keyboard = create_result_keyboard(&buttons).unwrap();

        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert!(keyboard.inline_keyboard.iter().all(|row| row.len() == 1));
        assert!(matches!(
            keyboard.inline_keyboard[0][0].kind,
            InlineKeyboardButtonKind::Url(_)
        ));
        assert!(matches!(
            &keyboard.inline_keyboard[1][0].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "more_1"
        ));
    }

    #[test]
    fn test_keyboard_drops_unusable_links() {
        let buttons = vec![ResultButton::Link {
            text: "link".to_string(),
            url: "/pin/123/".to_string(),
        }];
        assert!(create_result_keyboard(&buttons).is_none());
        assert!(create_result_keyboard(&[]).is_none());
    }

    #[test]
    fn test_first_result_reply_single_result_has_no_show_more() {
        let results = vec![pin("Only", "")];
        let reply = first_result_reply(
            &QueryOrigin::Typed("cats".to_string()),
            &results,
            UserId(1),
            Some("en"),
        )
        .unwrap();
        assert!(reply.buttons.is_empty());
    }
}
