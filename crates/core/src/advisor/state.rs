use std::fmt::{self, Debug};

use tokio::sync::oneshot;
use tripwhisper_actor::{Actor, Message};

use super::AdvisorState;
use crate::error::ProviderError;
use crate::history::Message as HistoryMessage;
use crate::preferences::PreferenceSet;
use crate::session::ConversationSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisorStage {
    Idle,
    AwaitingReply,
}

type TurnResult = Result<Option<String>, ProviderError>;

#[derive(Debug)]
pub enum Operation {
    Turn {
        user_text: String,
        reply: oneshot::Sender<TurnResult>,
    },
    Configure {
        preferences: PreferenceSet,
        window_size: usize,
        reply: oneshot::Sender<()>,
    },
    Preferences {
        reply: oneshot::Sender<(PreferenceSet, usize)>,
    },
    History {
        reply: oneshot::Sender<Vec<HistoryMessage>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
}

impl AdvisorState {
    #[inline]
    fn enqueue(&mut self, op: Operation, handle: &Actor<Self>) {
        if self.current_stage != AdvisorStage::Idle {
            // A turn is in flight and owns the session. The operation
            // will be picked up when the turn finishes.
            self.pending_ops.push_back(op);
            return;
        }
        self.process_op_checked(op, handle);
    }

    fn process_pending_ops(&mut self, handle: &Actor<Self>) {
        while self.current_stage == AdvisorStage::Idle {
            let Some(op) = self.pending_ops.pop_front() else {
                break;
            };
            self.process_op_checked(op, handle);
        }
    }

    /// Process the operation, assuming the stage is checked.
    fn process_op_checked(&mut self, op: Operation, handle: &Actor<Self>) {
        let Some(session) = self.session.as_mut() else {
            error!("session is missing while idle");
            return;
        };

        // Replies are dropped silently if the caller has gone away.
        match op {
            Operation::Turn { user_text, reply } => {
                self.start_turn(user_text, reply, handle);
            }
            Operation::Configure {
                preferences,
                window_size,
                reply,
            } => {
                session.configure(preferences, window_size);
                reply.send(()).ok();
            }
            Operation::Preferences { reply } => {
                reply
                    .send((session.preferences().clone(), session.window_size()))
                    .ok();
            }
            Operation::History { reply } => {
                reply.send(session.history().to_vec()).ok();
            }
            Operation::Clear { reply } => {
                session.clear();
                reply.send(()).ok();
            }
        }
    }

    fn start_turn(
        &mut self,
        user_text: String,
        reply: oneshot::Sender<TurnResult>,
        handle: &Actor<Self>,
    ) {
        let Some(mut session) = self.session.take() else {
            error!("session is missing while idle");
            return;
        };
        self.current_stage = AdvisorStage::AwaitingReply;

        let turn = tokio::spawn(async move {
            let result = session.submit_turn(&user_text).await;
            (session, result)
        });
        self.turn_task = Some(turn.abort_handle());

        // The session is lost if the turn panics, so close the advisor
        // rather than leave it waiting for a reply that never comes.
        let handle = handle.clone();
        tokio::spawn(async move {
            match turn.await {
                Ok((session, result)) => {
                    handle
                        .send(TurnFinishedMessage {
                            session,
                            result,
                            reply,
                        })
                        .ok();
                }
                Err(err) if err.is_panic() => {
                    error!("turn panicked, closing the session");
                    handle.try_kill();
                    drop(reply);
                }
                Err(_) => trace!("turn aborted"),
            }
        });
    }
}

#[derive(Debug)]
pub struct Enqueue(pub Operation);

impl Message<AdvisorState> for Enqueue {
    fn handle(self, state: &mut AdvisorState, handle: &Actor<AdvisorState>) {
        state.enqueue(self.0, handle);
    }
}

struct TurnFinishedMessage {
    session: ConversationSession,
    result: TurnResult,
    reply: oneshot::Sender<TurnResult>,
}

impl Debug for TurnFinishedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnFinishedMessage")
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Message<AdvisorState> for TurnFinishedMessage {
    fn handle(self, state: &mut AdvisorState, handle: &Actor<AdvisorState>) {
        state.session = Some(self.session);
        state.turn_task = None;
        state.current_stage = AdvisorStage::Idle;
        self.reply.send(self.result).ok();
        state.process_pending_ops(handle);
    }
}
