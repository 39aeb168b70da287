//! # Events Module
//!
//! Progress events and operator notifications.
//!
//! ## Design
//! The scanner emits events through channels, allowing any UI
//! (CLI, GUI, web) to subscribe. Notifications travel on the same channel;
//! [`EventSender`] is the default [`NotificationSink`].
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Scan(ScanEvent::AlbumFound { path, .. }) => println!("{}", path.display()),
//!             Event::Notification(n) if n.negative => eprintln!("{}", n.content),
//!             _ => {}
//!         }
//!     }
//! });
//!
//! let scanner = AlbumScanner::builder().store(store).events(sender).build();
//! ```

mod channel;
mod notification;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use notification::{Notification, NotificationKind, NotificationSink};
pub use types::*;
