//! nzcrop-node: host-side adapter around [`nzcrop_core`].
//!
//! Decodes raw image messages, drives the lazy input subscription, crops
//! each frame, and logs dropped frames through the `log` facade. The host
//! owns transport and the executor; it calls
//! [`CropNonZeroNode::on_publisher_matched`] when the output subscriber
//! count changes and [`CropNonZeroNode::handle_image`] per frame, then
//! publishes whatever comes back.

pub mod config;
pub mod message;
pub mod node;
pub mod subscription;

pub use config::{ConfigError, NodeConfig};
pub use message::{Header, ImageMessage, MessageError, Time};
pub use node::{CropNonZeroNode, FrameError};
pub use subscription::{LazySubscription, SubscriptionEvent, SubscriptionState};
