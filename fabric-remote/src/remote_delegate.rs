/*
 *   Copyright (c) 2024 Fabric Contributors
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! L3 remote wrapper (spec §4.3).

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use fabric_core::{Delegate, FabricError, FabricResult};

use crate::dispatcher::Dispatcher;
use crate::envelope::{FrameHeader, ACK_ID};
use crate::serializer::Serializer;

/// Wraps an L1 [`Delegate`] with a remote id, a [`Serializer`], and a
/// [`Dispatcher`] (spec §4.3). One instance plays both roles the spec
/// describes: calling [`RemoteDelegate::invoke`] is the *send* path;
/// feeding received bytes to [`RemoteDelegate::on_receive`] is the
/// *receive* path, which invokes the locally-bound delegate (if any) and
/// optionally emits an ACK.
///
/// Not itself thread-safe (spec §5: "the wrapper is not itself
/// thread-safe; callers that invoke from multiple threads must route
/// calls through a single thread").
pub struct RemoteDelegate<Args, R, S> {
    remote_id: u16,
    local: Option<Delegate<Args, R>>,
    serializer: S,
    dispatcher: Arc<dyn Dispatcher>,
    error_channel: Option<Delegate<(FabricError,), ()>>,
    seq_counter: AtomicU16,
    auto_ack: bool,
}

impl<Args, R, S> RemoteDelegate<Args, R, S>
where
    S: Serializer<Args>,
{
    #[must_use]
    pub fn new(remote_id: u16, serializer: S, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            remote_id,
            local: None,
            serializer,
            dispatcher,
            error_channel: None,
            seq_counter: AtomicU16::new(0),
            auto_ack: true,
        }
    }

    /// Binds the receiver-side target: incoming frames for this id invoke
    /// this delegate.
    #[must_use]
    pub fn with_local(mut self, local: Delegate<Args, R>) -> Self {
        self.local = Some(local);
        self
    }

    #[must_use]
    pub fn with_error_channel(mut self, error_channel: Delegate<(FabricError,), ()>) -> Self {
        self.error_channel = Some(error_channel);
        self
    }

    #[must_use]
    pub fn with_auto_ack(mut self, auto_ack: bool) -> Self {
        self.auto_ack = auto_ack;
        self
    }

    fn report_error(&self, err: FabricError) {
        if let Some(channel) = &self.error_channel {
            let _ = channel.invoke((err,));
        }
    }

    /// Send path (spec §4.3): serialize `args`, frame them behind the L8
    /// header with the next sequence number, and hand the frame to the
    /// dispatcher.
    ///
    /// # Errors
    /// Propagates serializer failures and `DispatchFailed` from a
    /// non-zero dispatcher status; both are also reported through the
    /// error channel if one is bound.
    pub fn invoke(&self, args: Args) -> FabricResult<()> {
        let seq_num = self.seq_counter.fetch_add(1, Ordering::Relaxed);
        let payload = self.serializer.write(&args).inspect_err(|e| {
            self.report_error(e.clone());
        })?;

        let header = FrameHeader {
            marker: crate::envelope::MARKER,
            remote_id: self.remote_id,
            seq_num,
            length: u16::try_from(payload.len()).unwrap_or(u16::MAX),
        };
        let frame = header.encode_frame(&payload);

        let status = self.dispatcher.send(&frame, self.remote_id);
        if status != 0 {
            let err = FabricError::DispatchFailed {
                remote_id: self.remote_id,
                status,
            };
            self.report_error(err.clone());
            return Err(err);
        }
        Ok(())
    }

    /// Receive path (spec §4.3): decode the header, reconstruct
    /// arguments, invoke the bound local delegate, and optionally produce
    /// an ACK frame for the caller to dispatch.
    ///
    /// # Errors
    /// `FramingError` if the marker doesn't match; `DecodeFailed` if the
    /// payload doesn't deserialize into `Args`.
    pub fn on_receive(&self, frame: &[u8]) -> FabricResult<Option<Vec<u8>>>
    where
        R: Default,
    {
        let header = FrameHeader::decode(frame).inspect_err(|e| {
            self.report_error(e.clone());
        })?;
        let payload_end = crate::envelope::HEADER_LEN + header.length as usize;
        let payload = frame
            .get(crate::envelope::HEADER_LEN..payload_end)
            .unwrap_or(&[]);

        let args = self
            .serializer
            .read(header.remote_id, payload)
            .inspect_err(|e| {
                self.report_error(e.clone());
            })?;

        if let Some(local) = &self.local {
            if let Err(err) = local.invoke(args) {
                self.report_error(err);
            }
        }

        if !header.is_ack() && self.auto_ack {
            return Ok(Some(FrameHeader::ack(header.seq_num).encode().to_vec()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::LoopbackDispatcher;
    use crate::serializer::JsonSerializer;
    use serde::{Deserialize, Serialize};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
    struct Payload {
        x: i32,
        y: i32,
        msg: String,
    }

    #[test]
    fn s6_send_produces_literal_frame_bytes() {
        let dispatcher = Arc::new(LoopbackDispatcher::new());
        let remote: RemoteDelegate<(Payload,), (), JsonSerializer<(Payload,)>> =
            RemoteDelegate::new(1, JsonSerializer::new(), dispatcher.clone());

        let payload = Payload {
            x: 1,
            y: 2,
            msg: "Hello!".to_string(),
        };
        remote.invoke((payload.clone(),)).unwrap();

        let sent = dispatcher.drain();
        assert_eq!(sent.len(), 1);
        let (remote_id, frame) = &sent[0];
        assert_eq!(*remote_id, 1);
        assert_eq!(&frame[0..4], &[0x55, 0xAA, 0x00, 0x01]);
        assert_eq!(&frame[4..6], &[0x00, 0x00]); // first sequence number
        let length = u16::from_be_bytes([frame[6], frame[7]]);
        assert_eq!(frame.len(), 8 + length as usize);

        let decoded: (Payload,) = serde_json::from_slice(&frame[8..]).unwrap();
        assert_eq!(decoded.0, payload);
    }

    #[test]
    fn receive_invokes_target_and_emits_ack() {
        let dispatcher = Arc::new(LoopbackDispatcher::new());
        let observed: Rc<RefCell<Option<Payload>>> = Rc::new(RefCell::new(None));
        let observed_inner = observed.clone();

        let local: Delegate<(Payload,), ()> =
            Delegate::bind_callable(move |p: Payload| *observed_inner.borrow_mut() = Some(p));

        let remote: RemoteDelegate<(Payload,), (), JsonSerializer<(Payload,)>> =
            RemoteDelegate::new(1, JsonSerializer::new(), dispatcher).with_local(local);

        let payload = Payload {
            x: 1,
            y: 2,
            msg: "Hello!".to_string(),
        };
        let header = FrameHeader {
            marker: crate::envelope::MARKER,
            remote_id: 1,
            seq_num: 0,
            length: 0,
        };
        let body = serde_json::to_vec(&(payload.clone(),)).unwrap();
        let frame = FrameHeader {
            length: u16::try_from(body.len()).unwrap(),
            ..header
        }
        .encode_frame(&body);

        let ack = remote.on_receive(&frame).unwrap().unwrap();
        assert_eq!(ack, [0x55, 0xAA, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(*observed.borrow(), Some(payload));
    }

    #[test]
    fn bad_marker_is_framing_error() {
        let dispatcher = Arc::new(LoopbackDispatcher::new());
        let remote: RemoteDelegate<(Payload,), (), JsonSerializer<(Payload,)>> =
            RemoteDelegate::new(1, JsonSerializer::new(), dispatcher);
        let bad = [0u8; 8];
        assert!(matches!(
            remote.on_receive(&bad),
            Err(FabricError::FramingError { .. })
        ));
    }
}
