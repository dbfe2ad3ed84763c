use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::approval::{ApprovalCoordinator, ButtonPress, ControlSurface};
use crate::conversation::ConversationEngine;
use crate::model::participant::{Participant, ParticipantId};
use crate::notify::MessageRef;
use crate::telegram::client::TelegramClient;
use crate::telegram::types::Update;

/// Pause before polling again after a failed `getUpdates`.
const RETRY_PAUSE: Duration = Duration::from_secs(5);

/// One inbound event, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text { from: Participant, text: String },
    Button { query_id: String, press: ButtonPress },
}

impl Inbound {
    pub fn from_update(update: Update) -> Option<Self> {
        if let Some(message) = update.message {
            let from = message.from.filter(|user| !user.is_bot)?;
            let text = message.text?;
            return Some(Inbound::Text {
                from: Participant::new(from.id, &from.first_name, from.last_name.as_deref()),
                text,
            });
        }

        let query = update.callback_query?;
        let data = query.data?;
        let surface = query.message.and_then(|message| {
            message.text.map(|text| ControlSurface {
                message: MessageRef {
                    chat: ParticipantId(message.chat.id),
                    message_id: message.message_id,
                },
                text,
            })
        });

        Some(Inbound::Button {
            query_id: query.id,
            press: ButtonPress {
                actor: ParticipantId(query.from.id),
                data,
                surface,
            },
        })
    }

    /// Whose lane the event runs in.
    pub fn participant(&self) -> ParticipantId {
        match self {
            Inbound::Text { from, .. } => from.id,
            Inbound::Button { press, .. } => press.actor,
        }
    }
}

#[derive(Clone)]
struct Handlers {
    engine: Arc<ConversationEngine>,
    coordinator: Arc<ApprovalCoordinator>,
    client: Arc<TelegramClient>,
}

impl Handlers {
    async fn handle(&self, inbound: Inbound) {
        match inbound {
            Inbound::Text { from, text } => self.engine.on_text_input(&from, &text).await,
            Inbound::Button { query_id, press } => {
                let ack = self.coordinator.on_button_press(press).await;
                if let Err(e) = self.client.answer_callback(&query_id, &ack).await {
                    warn!(error = %e, "Failed to answer button press");
                }
            }
        }
    }
}

type Lanes = Arc<Mutex<HashMap<ParticipantId, UnboundedSender<Inbound>>>>;

/// Long-polls the Bot API and fans updates out to per-participant lanes.
///
/// Each lane is a task draining its own queue, so one participant's events
/// run in arrival order while different participants proceed concurrently.
/// A lane removes itself once its queue is empty; the next event for that
/// participant starts a new one.
pub struct Dispatcher {
    handlers: Handlers,
    lanes: Lanes,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<ConversationEngine>,
        coordinator: Arc<ApprovalCoordinator>,
        client: Arc<TelegramClient>,
    ) -> Self {
        Self {
            handlers: Handlers {
                engine,
                coordinator,
                client,
            },
            lanes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn run(&self, poll_timeout_secs: u64) {
        if let Err(e) = self.handlers.client.drop_pending_updates().await {
            warn!(error = %e, "Failed to drop pending updates");
        }
        info!("Polling for updates...");

        let mut offset = 0;
        loop {
            let updates = match self
                .handlers
                .client
                .get_updates(offset, poll_timeout_secs)
                .await
            {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying");
                    tokio::time::sleep(RETRY_PAUSE).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let update_id = update.update_id;
                match Inbound::from_update(update) {
                    Some(inbound) => self.route(inbound),
                    None => debug!(update_id, "Ignoring update"),
                }
            }
        }
    }

    /// Queues `inbound` on its participant's lane. Sends happen under the
    /// lane map lock, which is what a lane checks before retiring.
    fn route(&self, inbound: Inbound) {
        let who = inbound.participant();
        let mut lanes = self.lanes.lock().expect("lane map poisoned");

        let lane = lanes.entry(who).or_insert_with(|| self.spawn_lane(who));
        if let Err(mpsc::error::SendError(inbound)) = lane.send(inbound) {
            // The lane task died without retiring; start a fresh one.
            let lane = self.spawn_lane(who);
            let _ = lane.send(inbound);
            lanes.insert(who, lane);
        }
    }

    fn spawn_lane(&self, who: ParticipantId) -> UnboundedSender<Inbound> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handlers = self.handlers.clone();
        let lanes = self.lanes.clone();

        tokio::spawn(async move {
            while let Some(inbound) = next_or_retire(&mut rx, &lanes, who) {
                handlers.handle(inbound).await;
            }
            debug!(participant = %who, "Lane retired");
        });

        tx
    }

    #[cfg(test)]
    fn lane_count(&self) -> usize {
        self.lanes.lock().expect("lane map poisoned").len()
    }
}

/// Next queued event, or `None` after removing the lane from the map when
/// nothing is left. The second look happens under the map lock, so an event
/// routed concurrently is either seen here or goes to a new lane.
fn next_or_retire(
    rx: &mut UnboundedReceiver<Inbound>,
    lanes: &Lanes,
    who: ParticipantId,
) -> Option<Inbound> {
    if let Ok(inbound) = rx.try_recv() {
        return Some(inbound);
    }

    let mut lanes = lanes.lock().expect("lane map poisoned");
    match rx.try_recv() {
        Ok(inbound) => Some(inbound),
        Err(_) => {
            lanes.remove(&who);
            None
        }
    }
}
