//! Test doubles: a gateway whose replies are released by the test, and a
//! timer that only fires on demand.

use crate::gateway::{Gateway, GatewayError, GatewayFuture, Timer};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use shared::{
    ChatMessage, ChatRequest, FloatId, FloatLocation, FloatSummary, Measurement, ProfileId,
    ProfileSummary, TrajectoryPoint,
};
use std::cell::RefCell;
use std::time::Duration;

type Reply = Result<serde_json::Value, GatewayError>;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Floats,
    FloatDetail(FloatId),
    Profiles { float_id: FloatId, with_data_only: bool },
    Measurements(ProfileId),
    Locations { active_only: bool },
    Trajectory(FloatId),
    Chat(ChatRequest),
}

/// Records every call and keeps it pending until `respond` or `fail`.
#[derive(Default)]
pub struct ScriptedGateway {
    calls: RefCell<Vec<(Call, Option<oneshot::Sender<Reply>>)>>,
}

impl ScriptedGateway {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().iter().map(|(call, _)| call.clone()).collect()
    }

    /// Index of the most recent matching call.
    pub fn find(&self, call: &Call) -> Option<usize> {
        self.calls.borrow().iter().rposition(|(recorded, _)| recorded == call)
    }

    pub fn respond(&self, index: usize, value: serde_json::Value) {
        self.settle(index, Ok(value));
    }

    pub fn fail(&self, index: usize, error: GatewayError) {
        self.settle(index, Err(error));
    }

    fn settle(&self, index: usize, reply: Reply) {
        let sender = self.calls.borrow_mut()[index]
            .1
            .take()
            .expect("call already settled");
        let _ = sender.send(reply);
    }

    fn record<T: DeserializeOwned + 'static>(&self, call: Call) -> GatewayFuture<T> {
        let (sender, receiver) = oneshot::channel();
        self.calls.borrow_mut().push((call, Some(sender)));
        async move {
            let value = receiver
                .await
                .map_err(|_| GatewayError::Transport("request dropped".to_string()))??;
            Ok::<T, GatewayError>(serde_json::from_value(value)?)
        }
        .boxed_local()
    }
}

impl Gateway for ScriptedGateway {
    fn floats(&self) -> GatewayFuture<Vec<FloatSummary>> {
        self.record(Call::Floats)
    }

    fn float_detail(&self, float_id: &FloatId) -> GatewayFuture<FloatSummary> {
        self.record(Call::FloatDetail(float_id.clone()))
    }

    fn profiles(&self, float_id: &FloatId, with_data_only: bool) -> GatewayFuture<Vec<ProfileSummary>> {
        self.record(Call::Profiles {
            float_id: float_id.clone(),
            with_data_only,
        })
    }

    fn measurements(&self, profile_id: ProfileId) -> GatewayFuture<Vec<Measurement>> {
        self.record(Call::Measurements(profile_id))
    }

    fn locations(&self, active_only: bool) -> GatewayFuture<Vec<FloatLocation>> {
        self.record(Call::Locations { active_only })
    }

    fn trajectory(&self, float_id: &FloatId) -> GatewayFuture<Vec<TrajectoryPoint>> {
        self.record(Call::Trajectory(float_id.clone()))
    }

    fn chat(&self, request: ChatRequest) -> GatewayFuture<ChatMessage> {
        self.record(Call::Chat(request))
    }
}

#[derive(Default)]
pub struct ManualTimer {
    pending: RefCell<Vec<oneshot::Sender<()>>>,
}

impl ManualTimer {
    pub fn fire_all(&self) {
        for sender in self.pending.borrow_mut().drain(..) {
            let _ = sender.send(());
        }
    }
}

impl Timer for ManualTimer {
    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().push(sender);
        async move {
            let _ = receiver.await;
        }
        .boxed_local()
    }
}
