use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::approval::{Ack, Decision};
use crate::conversation::replies;
use crate::error::NotifyError;
use crate::model::participant::ParticipantId;
use crate::notify::{Controls, MessageRef, NotificationPort};
use crate::telegram::types::{
    AnswerCallbackQuery, ApiResponse, DeleteWebhook, EditMessageText, GetUpdates,
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, Message, ReplyKeyboardMarkup,
    ReplyMarkup, SendMessage, Update,
};
use crate::utils::callback_data;

/// Extra time on top of the long-poll timeout before the HTTP call gives up.
const HTTP_GRACE: Duration = Duration::from_secs(10);

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Not `Debug`: `base_url` embeds the bot token.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(poll_timeout + HTTP_GRACE)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, NotifyError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Error replies carry a JSON body too, so the status code is not checked.
        // Errors drop the URL: it contains the token.
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(params)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?
            .json()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(NotifyError::Api {
                code: response.error_code.unwrap_or_default(),
                description: response
                    .description
                    .unwrap_or_else(|| format!("{} returned no result", method)),
            }),
        }
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, NotifyError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: ALLOWED_UPDATES,
            },
        )
        .await
    }

    /// Discards updates queued while the bot was offline.
    pub async fn drop_pending_updates(&self) -> Result<(), NotifyError> {
        self.call::<_, bool>(
            "deleteWebhook",
            &DeleteWebhook {
                drop_pending_updates: true,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn answer_callback(&self, query_id: &str, ack: &Ack) -> Result<(), NotifyError> {
        self.call::<_, bool>(
            "answerCallbackQuery",
            &AnswerCallbackQuery {
                callback_query_id: query_id,
                text: ack.text.as_deref(),
                show_alert: ack.alert,
            },
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationPort for TelegramClient {
    async fn send_message(
        &self,
        to: ParticipantId,
        text: &str,
        controls: Option<Controls>,
    ) -> Result<(), NotifyError> {
        let params = SendMessage {
            chat_id: to.0,
            text,
            reply_markup: controls.as_ref().map(markup),
        };
        self.call::<_, Message>("sendMessage", &params).await?;
        Ok(())
    }

    async fn edit_message(&self, message: MessageRef, text: &str) -> Result<(), NotifyError> {
        let params = EditMessageText {
            chat_id: message.chat.0,
            message_id: message.message_id,
            text,
        };
        // Answers with the edited message, or `true` for inline messages.
        self.call::<_, serde_json::Value>("editMessageText", &params)
            .await?;
        Ok(())
    }
}

pub fn markup(controls: &Controls) -> ReplyMarkup {
    match controls {
        Controls::MainMenu => ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
            keyboard: vec![
                vec![
                    KeyboardButton::new(replies::LEAVE_BUTTON),
                    KeyboardButton::new(replies::ABSENCE_BUTTON),
                ],
                vec![KeyboardButton::new(replies::HELP_BUTTON)],
            ],
            resize_keyboard: true,
            one_time_keyboard: false,
        }),
        Controls::Confirm => ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
            keyboard: vec![vec![
                KeyboardButton::new(replies::CONFIRM_YES_BUTTON),
                KeyboardButton::new(replies::CONFIRM_NO_BUTTON),
            ]],
            resize_keyboard: true,
            one_time_keyboard: true,
        }),
        Controls::Decision(id) => ReplyMarkup::Inline(InlineKeyboardMarkup {
            inline_keyboard: vec![vec![
                InlineKeyboardButton {
                    text: replies::APPROVE_BUTTON.to_string(),
                    callback_data: callback_data::encode(Decision::Approve, id),
                },
                InlineKeyboardButton {
                    text: replies::DENY_BUTTON.to_string(),
                    callback_data: callback_data::encode(Decision::Deny, id),
                },
            ]],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::RequestId;
    use serde_json::json;

    #[test]
    fn decision_controls_become_inline_buttons() {
        let markup = markup(&Controls::Decision(RequestId::new("00ff00ff00ff00ff")));
        assert_eq!(
            serde_json::to_value(markup).unwrap(),
            json!({
                "inline_keyboard": [[
                    { "text": "✅ Approva", "callback_data": "approve:00ff00ff00ff00ff" },
                    { "text": "❌ Rifiuta", "callback_data": "deny:00ff00ff00ff00ff" }
                ]]
            })
        );
    }

    #[test]
    fn confirm_keyboard_is_one_shot() {
        let value = serde_json::to_value(markup(&Controls::Confirm)).unwrap();
        assert_eq!(value["one_time_keyboard"], true);
        assert_eq!(value["keyboard"][0][0]["text"], "Sì 👍");
    }

    #[test]
    fn plain_message_has_no_markup_field() {
        let params = SendMessage {
            chat_id: 42,
            text: "ciao",
            reply_markup: None,
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({ "chat_id": 42, "text": "ciao" })
        );
    }

    #[test]
    fn bot_url_includes_token() {
        let client =
            TelegramClient::new("https://api.telegram.org/", "123:abc", Duration::from_secs(30)).unwrap();
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:abc");
    }
}
