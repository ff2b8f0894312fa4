// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! "Model changed" subscriber registries.
//!
//! Every range parameter, sweep model and sweep plan owns one [`Listeners`]
//! registry, created together with the model. Parents forward the events of
//! their children by subscribing a [`Listeners::forwarder`] on each child when
//! they are constructed.
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
  next_id: u64,
  callbacks: Vec<(ListenerId, Callback)>,
}

/// A list of callbacks invoked on every observable change of the owning model.
#[derive(Default)]
pub struct Listeners {
  inner: Arc<Mutex<Registry>>,
}

impl Listeners {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe<F>(&self, callback: F) -> ListenerId
  where
    F: Fn() + Send + Sync + 'static,
  {
    let mut registry = self.lock();
    let id = ListenerId(registry.next_id);
    registry.next_id += 1;
    registry.callbacks.push((id, Arc::new(callback)));
    id
  }

  /// Returns `false` if `id` was not subscribed.
  pub fn unsubscribe(&self, id: ListenerId) -> bool {
    let mut registry = self.lock();
    let before = registry.callbacks.len();
    registry.callbacks.retain(|(other, _)| *other != id);
    registry.callbacks.len() != before
  }

  pub fn len(&self) -> usize {
    self.lock().callbacks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Invokes every subscriber once.
  ///
  /// Callbacks are called outside the lock, so a subscriber may subscribe or
  /// unsubscribe without deadlocking.
  pub fn notify(&self) {
    let callbacks: Vec<Callback> = self
      .lock()
      .callbacks
      .iter()
      .map(|(_, callback)| Arc::clone(callback))
      .collect();
    for callback in callbacks {
      callback();
    }
  }

  /// A callback that re-emits events into this registry.
  pub fn forwarder(&self) -> impl Fn() + Send + Sync + 'static {
    let inner = Arc::clone(&self.inner);
    move || {
      Listeners {
        inner: Arc::clone(&inner),
      }
      .notify()
    }
  }

  fn lock(&self) -> MutexGuard<'_, Registry> {
    // A panicking subscriber must not disable notification for everyone else.
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl std::fmt::Debug for Listeners {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Listeners")
      .field("subscribers", &self.len())
      .finish()
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use std::sync::atomic::AtomicUsize;
  use std::sync::atomic::Ordering;

  /// Subscribes a counter to `listeners` and returns it.
  pub(crate) fn counter(listeners: &Listeners) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    listeners.subscribe(move || {
      handle.fetch_add(1, Ordering::SeqCst);
    });
    count
  }

  #[test]
  fn notify_reaches_every_subscriber() {
    let listeners = Listeners::new();
    let a = counter(&listeners);
    let b = counter(&listeners);
    listeners.notify();
    listeners.notify();
    assert_eq!(a.load(Ordering::SeqCst), 2);
    assert_eq!(b.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn unsubscribe_stops_delivery() {
    let listeners = Listeners::new();
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    let id = listeners.subscribe(move || {
      handle.fetch_add(1, Ordering::SeqCst);
    });
    assert!(listeners.unsubscribe(id));
    assert!(!listeners.unsubscribe(id));
    listeners.notify();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(listeners.is_empty());
  }

  #[test]
  fn forwarder_relays_child_events() {
    let parent = Listeners::new();
    let child = Listeners::new();
    let count = counter(&parent);
    child.subscribe(parent.forwarder());
    child.notify();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }
}
