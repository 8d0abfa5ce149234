use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::{AppError, AppResult};
use crate::metrics::WS_CONNECTIONS;
use crate::state::AppState;
use crate::websocket::{publish, SubscriberId, Topic, WsEvent, WsInboundEvent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsParams {
    /// `group:{id}` or `chat:{id}`
    pub topic: String,
    pub user_id: i64,
}

/// Payload pushed to the client as a text frame.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct BroadcastMessage(String);

struct WsSession {
    topic: Topic,
    user_id: i64,
    subscriber_id: SubscriberId,
    rx: Option<UnboundedReceiver<String>>,
    hb: Instant,
    state: AppState,
}

impl WsSession {
    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let interval = Duration::from_secs(self.state.config.websocket.heartbeat_interval_secs);
        let timeout = Duration::from_secs(self.state.config.websocket.client_timeout_secs);

        ctx.run_interval(interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > timeout {
                tracing::warn!(user_id = act.user_id, topic = %act.topic, "websocket heartbeat timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let event = match serde_json::from_str::<WsInboundEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "unrecognised websocket event");
                ctx.text(WsEvent::error("Unrecognised event").to_json());
                return;
            }
        };

        match event {
            WsInboundEvent::Ping => ctx.text(WsEvent::Pong.to_json()),
            WsInboundEvent::Read { message_id } => {
                let Topic::Chat(chat_id) = self.topic else {
                    ctx.text(WsEvent::error("Read receipts are tracked for direct chats only").to_json());
                    return;
                };
                if message_id < 1 {
                    ctx.text(WsEvent::error("messageId must be positive").to_json());
                    return;
                }

                let state = self.state.clone();
                let user_id = self.user_id;
                let addr = ctx.address();
                actix::spawn(async move {
                    if let Err(e) = acknowledge_read(&state, chat_id, user_id, message_id).await {
                        tracing::error!(chat_id, user_id, error = %e, "websocket read acknowledgment failed");
                        addr.do_send(BroadcastMessage(WsEvent::error(e.to_string()).to_json()));
                    }
                });
            }
        }
    }
}

async fn acknowledge_read(
    state: &AppState,
    chat_id: i64,
    user_id: i64,
    message_id: i64,
) -> AppResult<()> {
    let mark = state
        .read_receipts
        .acknowledge(chat_id, user_id, message_id)
        .await?;
    publish(
        &state.registry,
        Topic::Chat(chat_id),
        &WsEvent::ReadReceipt {
            chat_id,
            user_id,
            last_read_message_id: mark.last_acknowledged_message_id,
        },
    )
    .await;
    Ok(())
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = self.user_id, topic = %self.topic, "websocket session started");
        WS_CONNECTIONS.inc();
        self.hb(ctx);

        // Bridge the registry channel into the actor mailbox. The loop ends
        // once the subscriber is removed and its sender dropped.
        if let Some(mut rx) = self.rx.take() {
            let addr = ctx.address();
            actix::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    addr.do_send(BroadcastMessage(msg));
                }
            });
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = self.user_id, topic = %self.topic, "websocket session stopped");
        WS_CONNECTIONS.dec();

        let registry = self.state.registry.clone();
        let topic = self.topic;
        let subscriber_id = self.subscriber_id;
        actix::spawn(async move {
            registry.remove_subscriber(topic, subscriber_id).await;
        });
    }
}

impl Handler<BroadcastMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: BroadcastMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                self.handle_text(&text, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                ctx.text(WsEvent::error("Binary frames are not supported").to_json());
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                tracing::warn!(user_id = self.user_id, error = %e, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}

/// The caller must belong to the group or chat behind `topic`.
async fn authorize(state: &AppState, topic: Topic, user_id: i64) -> AppResult<()> {
    match topic {
        Topic::Group(group_id) => {
            state.group_chats.require_member(group_id, user_id).await?;
        }
        Topic::Chat(chat_id) => {
            state.chats.require_participant(chat_id, user_id).await?;
        }
    }
    Ok(())
}

#[get("/ws")]
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsParams>,
) -> Result<HttpResponse, actix_web::Error> {
    let params = query.into_inner();
    let topic: Topic = params.topic.parse().map_err(AppError::BadRequest)?;
    authorize(&state, topic, params.user_id).await?;

    let (subscriber_id, rx) = state.registry.add_subscriber(topic).await;
    let session = WsSession {
        topic,
        user_id: params.user_id,
        subscriber_id,
        rx: Some(rx),
        hb: Instant::now(),
        state: state.get_ref().clone(),
    };

    // A failed handshake never starts the actor, so `stopped` won't clean up.
    match ws::start(session, &req, stream) {
        Ok(resp) => Ok(resp),
        Err(e) => {
            state.registry.remove_subscriber(topic, subscriber_id).await;
            Err(e)
        }
    }
}
