//! Notification subscription and fan-out.
//!
//! Notifications coordinate state transitions across modules: a source
//! entity publishes a notification type it declared, and every subscriber
//! receives its own notification event through the ordinary dispatch path.
//!
//! ```text
//! ┌──────────┐ subscribe(notification, source)   ┌────────────────────┐
//! │ Module B │ ─────────────────────────────────>│ NotificationBroker │
//! └──────────┘                                   │  per-notification  │
//! ┌──────────┐ notify(notification, params)      │ subscription lists │
//! │ Module A │ ─────────────────────────────────>└─────────┬──────────┘
//! └──────────┘                                             │ one event
//!      ▲                                                   ▼ per match
//! ┌────┴────────────── response events ─────────┐  ┌───────────────┐
//! │ (when the notifier requested acknowledgment)│<─│  event queue  │
//! └─────────────────────────────────────────────┘  └───────────────┘
//! ```
//!
//! The broker is pure bookkeeping owned by the main context; enqueueing the
//! fan-out events is the runtime's job (`Runtime::notify`). When a notifier
//! requests acknowledgment, each matched record transiently carries the
//! cookie of the event sent to its subscriber, cleared again when that
//! subscriber's response is dispatched; the notifier counts outstanding
//! responses itself from the fan-out count `notify` returns.

mod broker;

pub use broker::Subscription;
pub(crate) use broker::NotificationBroker;
