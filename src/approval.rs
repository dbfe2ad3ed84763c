use std::sync::Arc;

use chrono::Utc;
use strum_macros::EnumString;
use tracing::{error, info, warn};

use crate::error::DecisionError;
use crate::model::participant::ParticipantId;
use crate::model::request::{Request, RequestId, RequestStatus};
use crate::notify::{MessageRef, NotificationPort};
use crate::store::RequestStore;
use crate::utils::callback_data;

const UNAUTHORIZED: &str = "⚠️ Non sei autorizzato a eseguire questa azione.";
const MALFORMED: &str = "⚠️ Errore nel formato del comando.";
const STORE_DOWN: &str = "⚠️ Impossibile salvare la decisione, riprova tra poco.";

/// Action tag carried by the approve/deny buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    pub fn status(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Deny => RequestStatus::Denied,
        }
    }
}

/// The approver's message the pressed buttons belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSurface {
    pub message: MessageRef,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    pub actor: ParticipantId,
    pub data: String,
    /// Missing when the transport no longer has the original message.
    pub surface: Option<ControlSurface>,
}

/// Short answer to the actor who pressed a button.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ack {
    pub text: Option<String>,
    /// Show as a modal alert rather than a toast.
    pub alert: bool,
}

impl Ack {
    fn toast(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            alert: false,
        }
    }

    fn alert(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            alert: true,
        }
    }
}

/// Applies approver decisions and tells both sides about them.
pub struct ApprovalCoordinator {
    store: Arc<RequestStore>,
    notifier: Arc<dyn NotificationPort>,
    approver: Option<ParticipantId>,
}

impl ApprovalCoordinator {
    pub fn new(
        store: Arc<RequestStore>,
        notifier: Arc<dyn NotificationPort>,
        approver: Option<ParticipantId>,
    ) -> Self {
        Self {
            store,
            notifier,
            approver,
        }
    }

    fn is_approver(&self, actor: ParticipantId) -> bool {
        self.approver == Some(actor)
    }

    /// Moves a pending request to its final status and informs the requester.
    ///
    /// The decision is authoritative once persisted: a failed delivery to the
    /// requester is logged and does not undo it.
    pub async fn decide(
        &self,
        actor: ParticipantId,
        id: &RequestId,
        decision: Decision,
    ) -> Result<Request, DecisionError> {
        if !self.is_approver(actor) {
            warn!(actor = %actor, request_id = %id, "Decision attempted by a non-approver");
            return Err(DecisionError::Unauthorized(actor));
        }

        let request = self
            .store
            .update_status(id, decision.status(), Utc::now())
            .await?;
        info!(request_id = %id, decision = %decision, "Decision applied");

        if let Err(e) = self
            .notifier
            .send_message(request.requester_id, &requester_outcome(&request), None)
            .await
        {
            error!(
                error = %e,
                request_id = %id,
                requester = %request.requester_id,
                "Failed to deliver the outcome to the requester"
            );
        }

        Ok(request)
    }

    /// Handles an approve/deny button press end to end and returns the
    /// answer for the actor.
    pub async fn on_button_press(&self, press: ButtonPress) -> Ack {
        if !self.is_approver(press.actor) {
            warn!(actor = %press.actor, data = %press.data, "Button pressed by a non-approver");
            return Ack::alert(UNAUTHORIZED);
        }

        let (decision, id) = match callback_data::decode(&press.data) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, data = %press.data, "Malformed button payload");
                self.annotate(press.surface.as_ref(), MALFORMED).await;
                return Ack::toast(MALFORMED);
            }
        };

        match self.decide(press.actor, &id, decision).await {
            Ok(request) => {
                self.annotate(press.surface.as_ref(), &outcome_line(&request))
                    .await;
                Ack::default()
            }
            Err(DecisionError::NotFound(id)) => {
                warn!(request_id = %id, "Decision on an unknown request");
                let notice = not_found(&id);
                self.annotate(press.surface.as_ref(), &notice).await;
                Ack::toast(notice)
            }
            Err(DecisionError::AlreadyDecided { id, status }) => {
                info!(request_id = %id, status = %status, "Repeated decision ignored");
                Ack::toast(already_decided(&id, status))
            }
            Err(DecisionError::Unauthorized(_)) => Ack::alert(UNAUTHORIZED),
            Err(DecisionError::StoreUnavailable(e)) => {
                error!(error = %e, request_id = %id, "Decision could not be persisted");
                Ack::alert(STORE_DOWN)
            }
        }
    }

    /// Appends `notice` to the approver's message so earlier content stays
    /// visible. Best effort.
    async fn annotate(&self, surface: Option<&ControlSurface>, notice: &str) {
        let Some(surface) = surface else {
            return;
        };

        let text = format!("{}\n\n{}", surface.text, notice);
        if let Err(e) = self.notifier.edit_message(surface.message, &text).await {
            warn!(error = %e, "Failed to annotate the approver message");
        }
    }
}

fn requester_outcome(request: &Request) -> String {
    let kind = request.kind().label().to_lowercase();
    match request.status {
        RequestStatus::Approved => format!(
            "🎉 Buone notizie! La tua richiesta di {} (ID: {}) è stata APPROVATA!",
            kind, request.id
        ),
        _ => format!(
            "😔 La tua richiesta di {} (ID: {}) è stata RIFIUTATA.",
            kind, request.id
        ),
    }
}

fn outcome_line(request: &Request) -> String {
    match request.status {
        RequestStatus::Approved => "--- ESITO: ✅ APPROVATA ---".to_string(),
        _ => "--- ESITO: ❌ RIFIUTATA ---".to_string(),
    }
}

fn not_found(id: &RequestId) -> String {
    format!("⚠️ Errore: Richiesta ID ({}) non trovata.", id)
}

fn already_decided(id: &RequestId, status: RequestStatus) -> String {
    let label = match status {
        RequestStatus::Approved => "approvata",
        RequestStatus::Denied => "rifiutata",
        RequestStatus::Pending => "in attesa",
    };
    format!("ℹ️ La richiesta {} è già stata {}.", id, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::participant::Participant;
    use crate::model::request::{NewRequest, RequestDetails};
    use crate::notify::testing::RecordingNotifier;
    use crate::store::DB_FILE;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const APPROVER: ParticipantId = ParticipantId(1000);
    const REQUESTER: ParticipantId = ParticipantId(42);
    const INTRUDER: ParticipantId = ParticipantId(666);

    struct Harness {
        _dir: TempDir,
        store: Arc<RequestStore>,
        notifier: Arc<RecordingNotifier>,
        coordinator: ApprovalCoordinator,
    }

    async fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RequestStore::open(dir.path().join(DB_FILE)).await);
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = ApprovalCoordinator::new(store.clone(), notifier.clone(), Some(APPROVER));
        Harness {
            _dir: dir,
            store,
            notifier,
            coordinator,
        }
    }

    async fn pending_absence(store: &RequestStore) -> Request {
        let who = Participant::new(REQUESTER, "Lucia", None);
        store
            .create(NewRequest::new(
                &who,
                RequestDetails::ShortAbsence {
                    date: NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(),
                    duration: "2 ore".into(),
                },
                None,
            ))
            .await
            .unwrap()
    }

    fn surface() -> ControlSurface {
        ControlSurface {
            message: MessageRef {
                chat: APPROVER,
                message_id: 77,
            },
            text: "🔔 Nuova richiesta di Permesso da Lucia".into(),
        }
    }

    fn press(actor: ParticipantId, data: String) -> ButtonPress {
        ButtonPress {
            actor,
            data,
            surface: Some(surface()),
        }
    }

    #[tokio::test]
    async fn deny_updates_store_and_tells_both_sides() {
        let h = harness().await;
        let request = pending_absence(&h.store).await;

        let ack = h
            .coordinator
            .on_button_press(press(APPROVER, callback_data::encode(Decision::Deny, &request.id)))
            .await;
        assert_eq!(ack, Ack::default());

        let stored = h.store.get(&request.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Denied);
        assert!(stored.decided_at.is_some());

        let notice = h.notifier.last_to(REQUESTER).unwrap();
        assert!(notice.text.contains("RIFIUTATA"));
        assert!(notice.text.contains(request.id.as_str()));

        let edits = h.notifier.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, surface().message);
        assert!(edits[0].1.starts_with(&surface().text));
        assert!(edits[0].1.ends_with("--- ESITO: ❌ RIFIUTATA ---"));
    }

    #[tokio::test]
    async fn second_decision_is_already_decided() {
        let h = harness().await;
        let request = pending_absence(&h.store).await;

        let first = h
            .coordinator
            .decide(APPROVER, &request.id, Decision::Approve)
            .await
            .unwrap();
        let second = h
            .coordinator
            .decide(APPROVER, &request.id, Decision::Approve)
            .await;

        assert!(matches!(
            second,
            Err(DecisionError::AlreadyDecided {
                status: RequestStatus::Approved,
                ..
            })
        ));
        let stored = h.store.get(&request.id).await.unwrap();
        assert_eq!(stored.decided_at, first.decided_at);
        assert_eq!(h.notifier.sent_to(REQUESTER).len(), 1);
    }

    #[tokio::test]
    async fn repeated_press_does_not_renotify() {
        let h = harness().await;
        let request = pending_absence(&h.store).await;
        let data = callback_data::encode(Decision::Approve, &request.id);

        h.coordinator.on_button_press(press(APPROVER, data.clone())).await;
        let ack = h.coordinator.on_button_press(press(APPROVER, data)).await;

        assert!(!ack.alert);
        assert!(ack.text.unwrap().contains("già stata approvata"));
        assert_eq!(h.notifier.sent_to(REQUESTER).len(), 1);
        assert_eq!(h.notifier.edits().len(), 1);
    }

    #[tokio::test]
    async fn non_approver_never_changes_anything() {
        let h = harness().await;
        let pending = pending_absence(&h.store).await;
        let decided = pending_absence(&h.store).await;
        h.coordinator
            .decide(APPROVER, &decided.id, Decision::Deny)
            .await
            .unwrap();
        h.notifier.clear();
        let before = h.store.snapshot().await;

        for id in [&pending.id, &decided.id] {
            for decision in [Decision::Approve, Decision::Deny] {
                let err = h.coordinator.decide(INTRUDER, id, decision).await.unwrap_err();
                assert!(matches!(err, DecisionError::Unauthorized(INTRUDER)));

                let ack = h
                    .coordinator
                    .on_button_press(press(INTRUDER, callback_data::encode(decision, id)))
                    .await;
                assert_eq!(ack, Ack::alert(UNAUTHORIZED));
            }
        }

        assert_eq!(h.store.snapshot().await, before);
        assert!(h.notifier.sent().is_empty());
        assert!(h.notifier.edits().is_empty());
    }

    #[tokio::test]
    async fn unknown_request_is_reported_to_approver() {
        let h = harness().await;
        pending_absence(&h.store).await;
        let before = h.store.snapshot().await;

        let ack = h
            .coordinator
            .on_button_press(press(APPROVER, "approve:deadbeef".into()))
            .await;

        assert_eq!(h.store.snapshot().await, before);
        assert!(ack.text.unwrap().contains("non trovata"));
        let edits = h.notifier.edits();
        assert_eq!(edits.len(), 1);
        assert!(edits[0].1.ends_with("⚠️ Errore: Richiesta ID (deadbeef) non trovata."));
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_changes_nothing() {
        let h = harness().await;
        let request = pending_absence(&h.store).await;

        let ack = h
            .coordinator
            .on_button_press(press(APPROVER, format!("approve_{}", request.id)))
            .await;

        assert_eq!(ack.text.as_deref(), Some(MALFORMED));
        assert_eq!(
            h.store.get(&request.id).await.unwrap().status,
            RequestStatus::Pending
        );
        assert!(h.notifier.edits()[0].1.ends_with(MALFORMED));
    }

    #[tokio::test]
    async fn undeliverable_outcome_keeps_the_decision() {
        let h = harness().await;
        let request = pending_absence(&h.store).await;
        h.notifier.make_unreachable(REQUESTER);

        let decided = h
            .coordinator
            .decide(APPROVER, &request.id, Decision::Approve)
            .await
            .unwrap();

        assert_eq!(decided.status, RequestStatus::Approved);
        let reloaded = RequestStore::load(h.store.path()).await;
        assert_eq!(reloaded[&request.id].status, RequestStatus::Approved);
    }

    #[tokio::test]
    async fn racing_decisions_apply_once() {
        let h = harness().await;
        let request = pending_absence(&h.store).await;

        let (a, b) = tokio::join!(
            h.coordinator.decide(APPROVER, &request.id, Decision::Approve),
            h.coordinator.decide(APPROVER, &request.id, Decision::Deny)
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(h.notifier.sent_to(REQUESTER).len(), 1);
    }
}
