use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::conversation::replies;
use crate::conversation::session::{Advance, Reply, Session};
use crate::error::NotifyError;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::request::{NewRequest, Request, RequestKind};
use crate::notify::{Controls, NotificationPort};
use crate::store::RequestStore;
use crate::utils::text::{command, normalize};

/// Routes requesters' text messages through their conversation.
///
/// Sessions live only in memory; at most one per participant. Inbound events
/// of one participant are expected one at a time, different participants may
/// be served concurrently.
pub struct ConversationEngine {
    store: Arc<RequestStore>,
    notifier: Arc<dyn NotificationPort>,
    approver: Option<ParticipantId>,
    sessions: Mutex<HashMap<ParticipantId, Session>>,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<RequestStore>,
        notifier: Arc<dyn NotificationPort>,
        approver: Option<ParticipantId>,
    ) -> Self {
        Self {
            store,
            notifier,
            approver,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn on_text_input(&self, from: &Participant, text: &str) {
        if let Some(name) = command(text) {
            return match name.as_str() {
                "start" => self.reply(from.id, welcome(from)).await,
                "help" | "aiuto" => self.reply(from.id, Reply::text(replies::HELP)).await,
                "annulla" | "cancel" => self.cancel(from).await,
                _ => self.unrecognized(from.id).await,
            };
        }

        let normalized = normalize(text);
        match normalized.as_str() {
            "aiuto" => return self.reply(from.id, Reply::text(replies::HELP)).await,
            "annulla" => return self.cancel(from).await,
            _ => {}
        }

        match self.take_session(from.id) {
            Some(session) => self.advance(from, session, text).await,
            None => match entry_trigger(&normalized) {
                Some(kind) => {
                    let (session, reply) = Session::start(kind);
                    info!(participant = %from.id, kind = %kind, "Conversation started");
                    self.put_session(from.id, session);
                    self.reply(from.id, reply).await;
                }
                None => self.unrecognized(from.id).await,
            },
        }
    }

    async fn advance(&self, from: &Participant, session: Session, text: &str) {
        let step = session.step_name();

        match session.advance(text) {
            Advance::Continue(next, reply) => {
                self.put_session(from.id, next);
                self.reply(from.id, reply).await;
            }
            Advance::Discard(notice) => {
                info!(participant = %from.id, step, "Conversation discarded at confirmation");
                self.reply(from.id, Reply::with_controls(notice, Controls::MainMenu))
                    .await;
            }
            Advance::Submit { details, reason } => {
                self.submit(from, NewRequest::new(from, details, reason)).await;
            }
        }
    }

    /// Stores the request, alerts the approver, then tells the requester.
    /// Nothing is announced as sent unless the store accepted it.
    async fn submit(&self, from: &Participant, new: NewRequest) {
        let kind = new.details.kind();

        let request = match self.store.create(new).await {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, participant = %from.id, "Failed to store request");
                self.reply(
                    from.id,
                    Reply::with_controls(replies::SUBMIT_FAILED, Controls::MainMenu),
                )
                .await;
                return;
            }
        };

        if let Err(e) = self.alert_approver(&request).await {
            error!(error = %e, request_id = %request.id, "Failed to notify the approver");
            self.reply(from.id, Reply::text(replies::MANAGER_UNREACHABLE))
                .await;
        }

        self.reply(
            from.id,
            Reply::with_controls(replies::submitted(kind), Controls::MainMenu),
        )
        .await;
    }

    async fn alert_approver(&self, request: &Request) -> Result<(), NotifyError> {
        let approver = self.approver.ok_or(NotifyError::NotConfigured)?;

        self.notifier
            .send_message(
                approver,
                &replies::approver_alert(request),
                Some(Controls::Decision(request.id.clone())),
            )
            .await?;

        info!(request_id = %request.id, "Approver notified");
        Ok(())
    }

    async fn cancel(&self, from: &Participant) {
        match self.take_session(from.id) {
            Some(session) => {
                info!(
                    participant = %from.id,
                    kind = %session.kind(),
                    step = session.step_name(),
                    "Conversation cancelled"
                );
                self.reply(
                    from.id,
                    Reply::with_controls(replies::CANCELLED, Controls::MainMenu),
                )
                .await;
            }
            None => self.unrecognized(from.id).await,
        }
    }

    async fn unrecognized(&self, to: ParticipantId) {
        self.reply(
            to,
            Reply::with_controls(replies::UNKNOWN_INPUT, Controls::MainMenu),
        )
        .await;
    }

    async fn reply(&self, to: ParticipantId, reply: Reply) {
        if let Err(e) = self
            .notifier
            .send_message(to, &reply.text, reply.controls)
            .await
        {
            warn!(error = %e, participant = %to, "Failed to deliver reply");
        }
    }

    fn take_session(&self, id: ParticipantId) -> Option<Session> {
        self.sessions
            .lock()
            .expect("session map poisoned")
            .remove(&id)
    }

    fn put_session(&self, id: ParticipantId, session: Session) {
        self.sessions
            .lock()
            .expect("session map poisoned")
            .insert(id, session);
    }

    #[cfg(test)]
    fn session(&self, id: ParticipantId) -> Option<Session> {
        self.sessions
            .lock()
            .expect("session map poisoned")
            .get(&id)
            .cloned()
    }
}

fn welcome(from: &Participant) -> Reply {
    Reply::with_controls(replies::welcome(&from.first_name), Controls::MainMenu)
}

fn entry_trigger(normalized: &str) -> Option<RequestKind> {
    match normalized {
        "chiedi ferie" | "ferie" => Some(RequestKind::Leave),
        "chiedi permesso" | "permesso" => Some(RequestKind::ShortAbsence),
        _ => None,
    }
}
