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

use std::sync::Weak;

use crate::signal::SignalInner;

/// A handle identifying one (signal, delegate) pair (spec §3, §4.5).
///
/// Holds only a [`Weak`] reference to the signal's subscriber list, never
/// a strong one: a `Connection` must never be what keeps a `Signal` alive
/// (spec §9's cyclic-reference note). `Connection` is the plain,
/// manual-disconnect flavor and is `Clone` (several observers may hold a
/// handle to the same subscription). See [`ScopedConnection`] for the
/// move-only, disconnect-on-drop flavor.
///
/// State machine:
/// ```text
/// [Connected] --disconnect()--> [Disconnected]  (terminal)
/// [Connected] --signal dropped--> [Inert]        (terminal)
/// ```
/// Both terminal states look the same from the outside: `is_connected()`
/// returns `false` and `disconnect()` becomes a harmless no-op.
pub struct Connection<Args> {
    signal: Weak<SignalInner<Args>>,
    slot_id: u64,
}

impl<Args> Connection<Args> {
    pub(crate) fn new(signal: Weak<SignalInner<Args>>, slot_id: u64) -> Self {
        Self { signal, slot_id }
    }

    /// Removes the subscription. A no-op if already disconnected or if the
    /// signal no longer exists (Inert).
    pub fn disconnect(&self) {
        if let Some(inner) = self.signal.upgrade() {
            inner.remove(self.slot_id);
        }
    }

    /// `false` once disconnected, once the signal has dropped its last
    /// strong reference, or if the subscriber removed itself during its
    /// own invocation.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.signal
            .upgrade()
            .is_some_and(|inner| inner.contains(self.slot_id))
    }
}

impl<Args> Clone for Connection<Args> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            slot_id: self.slot_id,
        }
    }
}

/// Move-only RAII wrapper around a [`Connection`]: disconnects when
/// dropped (spec §4.5 "Scoped Connection adds destructor-triggered
/// `disconnect`").
pub struct ScopedConnection<Args> {
    connection: Option<Connection<Args>>,
}

impl<Args> ScopedConnection<Args> {
    #[must_use]
    pub(crate) fn new(connection: Connection<Args>) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    /// Disconnects early, before the scope ends.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.disconnect();
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(Connection::is_connected)
    }
}

impl<Args> Drop for ScopedConnection<Args> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
