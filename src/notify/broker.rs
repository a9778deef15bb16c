//! Subscription registry keyed by notification identifier.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::{FwkError, FwkResult};
use crate::id::EntityId;

/// A single subscription record.
///
/// `source_id` is the entity whose notifications the subscriber wants;
/// [`EntityId::none`] subscribes to the notification type from any source.
/// While an acknowledged fan-out is in flight, `cookie` holds the cookie of
/// the notification event sent to this subscriber.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Matched against the notifying entity, or none for any source.
    pub source_id: EntityId,
    /// The entity receiving the notification events.
    pub subscriber_id: EntityId,
    /// Cookie of the in-flight acknowledged notification, if any.
    pub cookie: Option<u32>,
}

/// Key: (module index, notification index) of the notification identifier.
type NotificationKey = (usize, usize);

fn key_of(notification_id: EntityId) -> NotificationKey {
    (notification_id.module_idx(), notification_id.notification_idx())
}

/// Subscription lists for every notification type, in subscribe order.
///
/// Owned exclusively by the main context; fan-out order over a list is the
/// order subscriptions were made.
#[derive(Default)]
pub(crate) struct NotificationBroker {
    table: BTreeMap<NotificationKey, Vec<Subscription>>,
}

impl NotificationBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription record.
    ///
    /// # Errors
    ///
    /// [`FwkError::State`] if the same (source, subscriber) pair is already
    /// subscribed to this notification.
    pub fn subscribe(
        &mut self,
        notification_id: EntityId,
        source_id: EntityId,
        subscriber_id: EntityId,
    ) -> FwkResult {
        let list = self.table.entry(key_of(notification_id)).or_default();
        if list
            .iter()
            .any(|s| s.source_id == source_id && s.subscriber_id == subscriber_id)
        {
            return Err(FwkError::State);
        }
        list.push(Subscription {
            source_id,
            subscriber_id,
            cookie: None,
        });
        Ok(())
    }

    /// Removes a subscription record.
    ///
    /// # Errors
    ///
    /// [`FwkError::Param`] if no such record exists.
    pub fn unsubscribe(
        &mut self,
        notification_id: EntityId,
        source_id: EntityId,
        subscriber_id: EntityId,
    ) -> FwkResult {
        let list = self
            .table
            .get_mut(&key_of(notification_id))
            .ok_or(FwkError::Param)?;
        let pos = list
            .iter()
            .position(|s| s.source_id == source_id && s.subscriber_id == subscriber_id)
            .ok_or(FwkError::Param)?;
        list.remove(pos);
        Ok(())
    }

    /// Positions and subscriber identifiers of the records matching a
    /// notification from `source_id`, in fan-out order.
    pub fn matches(
        &self,
        notification_id: EntityId,
        source_id: EntityId,
    ) -> Vec<(usize, EntityId)> {
        self.table
            .get(&key_of(notification_id))
            .map(|list| {
                list.iter()
                    .enumerate()
                    .filter(|(_, s)| s.source_id.is_none() || s.source_id == source_id)
                    .map(|(pos, s)| (pos, s.subscriber_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of records a notification from `source_id` would fan out to.
    pub fn subscriber_count(&self, notification_id: EntityId, source_id: EntityId) -> usize {
        self.matches(notification_id, source_id).len()
    }

    /// Records the cookie of an acknowledged notification sent to the
    /// record at `pos`.
    pub fn mark_pending(&mut self, notification_id: EntityId, pos: usize, cookie: u32) {
        if let Some(sub) = self
            .table
            .get_mut(&key_of(notification_id))
            .and_then(|list| list.get_mut(pos))
        {
            sub.cookie = Some(cookie);
        }
    }

    /// Clears the pending cookie matched by a subscriber's response event.
    ///
    /// Returns `true` if a record was waiting on this (subscriber, cookie).
    pub fn acknowledge(
        &mut self,
        notification_id: EntityId,
        subscriber_id: EntityId,
        cookie: u32,
    ) -> bool {
        if let Some(sub) = self.table.get_mut(&key_of(notification_id)).and_then(|list| {
            list.iter_mut()
                .find(|s| s.subscriber_id == subscriber_id && s.cookie == Some(cookie))
        }) {
            sub.cookie = None;
            true
        } else {
            false
        }
    }

    /// Number of records still awaiting a response for this notification
    /// from `source_id`.
    pub fn pending_response_count(
        &self,
        notification_id: EntityId,
        source_id: EntityId,
    ) -> usize {
        self.table
            .get(&key_of(notification_id))
            .map(|list| {
                list.iter()
                    .filter(|s| {
                        (s.source_id.is_none() || s.source_id == source_id)
                            && s.cookie.is_some()
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}
