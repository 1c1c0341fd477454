//! Per-connection handler: hello handshake, command routing, change push.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `Hello` → register the gateway-asserted handle + admin flag
//!   2. Send `Welcome`
//!   3. Loop: push `Changed` notices from the engine's bus, and route
//!      incoming requests to engine operations, replying per request
//!
//! Authentication is the gateway's job — by the time a connection reaches
//! this process, the handle and `admin` flag in the `Hello` are trusted.

use std::sync::Arc;
use std::time::Duration;

use coinline_engine::{
    AcceptError, AdminError, Clock, EngineError, FinishError, JoinError,
    LeaveError, QueueEngine, SkipError,
};
use coinline_protocol::{
    ClientRequest, Codec, JsonCodec, PlayerHandle, ProtocolError, ServerEvent,
};
use coinline_store::StateStore;
use coinline_transport::{Connection, WebSocketConnection};

use crate::CoinlineError;
use crate::server::ServerShared;

/// How long a fresh connection has to send its `Hello`.
const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles a single observer connection from accept to close.
pub(crate) async fn handle_connection<S, C>(
    conn: WebSocketConnection,
    state: Arc<ServerShared<S, C>>,
) -> Result<(), CoinlineError>
where
    S: StateStore,
    C: Clock,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (handle, admin) = perform_hello(&conn, &state).await?;
    tracing::info!(%conn_id, player = %handle, admin, "observer connected");

    let mut feed = state.engine.subscribe();

    loop {
        tokio::select! {
            notice = feed.next() => {
                let Some(notice) = notice else { break };
                send_event(
                    &conn,
                    &state.codec,
                    &ServerEvent::Changed { seq: notice.seq },
                )
                .await?;
            }
            incoming = conn.recv() => {
                let data = match incoming {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, player = %handle, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };

                let request: ClientRequest = match state.codec.decode(&data) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode request");
                        send_event(
                            &conn,
                            &state.codec,
                            &error_event(400, "malformed request"),
                        )
                        .await?;
                        continue;
                    }
                };

                let reply = dispatch(&state.engine, &handle, admin, request).await;
                send_event(&conn, &state.codec, &reply).await?;
            }
        }
    }

    Ok(())
}

/// Performs the hello handshake: receive `Hello`, send `Welcome`.
async fn perform_hello<S, C>(
    conn: &WebSocketConnection,
    state: &Arc<ServerShared<S, C>>,
) -> Result<(PlayerHandle, bool), CoinlineError>
where
    S: StateStore,
    C: Clock,
{
    let data = match tokio::time::timeout(HELLO_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(CoinlineError::Protocol(ProtocolError::InvalidMessage(
                "connection closed before hello".into(),
            )));
        }
        Ok(Err(e)) => return Err(CoinlineError::Transport(e)),
        Err(_) => {
            return Err(CoinlineError::Protocol(ProtocolError::InvalidMessage(
                "hello timed out".into(),
            )));
        }
    };

    let request: ClientRequest = state.codec.decode(&data)?;
    let (handle, admin) = match request {
        ClientRequest::Hello { handle, admin } => (handle, admin),
        _ => {
            send_event(conn, &state.codec, &error_event(400, "expected Hello"))
                .await?;
            return Err(CoinlineError::Protocol(ProtocolError::InvalidMessage(
                "first message must be Hello".into(),
            )));
        }
    };

    send_event(
        conn,
        &state.codec,
        &ServerEvent::Welcome {
            handle: handle.clone(),
            admin,
            server_time: state.engine.now(),
        },
    )
    .await?;

    Ok((handle, admin))
}

/// Routes one request to the engine and shapes the reply.
async fn dispatch<S, C>(
    engine: &QueueEngine<S, C>,
    handle: &PlayerHandle,
    admin: bool,
    request: ClientRequest,
) -> ServerEvent
where
    S: StateStore,
    C: Clock,
{
    match request {
        ClientRequest::Hello { .. } => error_event(400, "already identified"),

        ClientRequest::Snapshot => match engine.snapshot().await {
            Ok(state) => ServerEvent::Snapshot { state },
            Err(e) => engine_error_event(&e),
        },

        ClientRequest::Join { machine } => {
            unit_reply(engine.join(&machine, handle).await)
        }
        ClientRequest::Accept { machine } => {
            unit_reply(engine.accept_turn(&machine, handle).await)
        }
        ClientRequest::Finish { machine } => {
            match engine.finish_turn(&machine, handle).await {
                Ok(played) => ServerEvent::Finished {
                    played_ms: played.as_millis() as u64,
                },
                Err(e) => engine_error_event(&e),
            }
        }
        ClientRequest::Skip { machine } => {
            unit_reply(engine.skip_turn(&machine, handle).await)
        }
        ClientRequest::Leave { machine } => {
            unit_reply(engine.leave(&machine, handle).await)
        }

        // -- Administrative requests --
        ClientRequest::SetPaused { paused } if admin => {
            unit_reply(engine.set_paused(paused).await)
        }
        ClientRequest::ForceSetHolder { machine, player } if admin => {
            unit_reply(engine.force_set_holder(&machine, &player).await)
        }
        ClientRequest::RemoveFromQueue { machine, player } if admin => {
            unit_reply(engine.remove_from_queue(&machine, &player).await)
        }
        ClientRequest::ReorderQueue { machine, order } if admin => {
            unit_reply(engine.reorder_queue(&machine, order).await)
        }
        ClientRequest::ResetStats { player } if admin => {
            unit_reply(engine.reset_stats(&player).await)
        }

        ClientRequest::SetPaused { .. }
        | ClientRequest::ForceSetHolder { .. }
        | ClientRequest::RemoveFromQueue { .. }
        | ClientRequest::ReorderQueue { .. }
        | ClientRequest::ResetStats { .. } => {
            error_event(403, "administrator only")
        }
    }
}

fn unit_reply(result: Result<(), EngineError>) -> ServerEvent {
    match result {
        Ok(()) => ServerEvent::Ok,
        Err(e) => engine_error_event(&e),
    }
}

fn engine_error_event(e: &EngineError) -> ServerEvent {
    ServerEvent::Error {
        code: error_code(e),
        message: e.to_string(),
    }
}

/// HTTP-style code for an engine failure: 404 for unknown ids, 500 for
/// persistence trouble, 409 for every precondition rejection.
fn error_code(e: &EngineError) -> u16 {
    match e {
        EngineError::Join(JoinError::UnknownMachine(_))
        | EngineError::Accept(AcceptError::UnknownMachine(_))
        | EngineError::Finish(FinishError::UnknownMachine(_))
        | EngineError::Skip(SkipError::UnknownMachine(_))
        | EngineError::Leave(LeaveError::UnknownMachine(_))
        | EngineError::Admin(AdminError::UnknownMachine(_))
        | EngineError::Admin(AdminError::UnknownPlayer(_))
        | EngineError::Admin(AdminError::NotPresent { .. }) => 404,
        EngineError::Store(_) => 500,
        _ => 409,
    }
}

fn error_event(code: u16, message: &str) -> ServerEvent {
    ServerEvent::Error {
        code,
        message: message.to_string(),
    }
}

async fn send_event(
    conn: &WebSocketConnection,
    codec: &JsonCodec,
    event: &ServerEvent,
) -> Result<(), CoinlineError> {
    let bytes = codec.encode(event)?;
    conn.send(&bytes).await?;
    Ok(())
}
