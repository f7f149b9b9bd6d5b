//! The crop-non-zero node: lazy subscription plus per-frame cropping.
//!
//! A failing frame is logged and dropped; the node keeps running.

use log::{debug, error, info};
use nzcrop_core::{CropError, NonZeroCropper};

use crate::config::NodeConfig;
use crate::message::{ImageMessage, MessageError};
use crate::subscription::{LazySubscription, SubscriptionEvent, SubscriptionState};

/// Why a frame produced no output.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The encoding names more than one channel.
    #[error("only single-channel images are accepted, got [{encoding}]")]
    NotSingleChannel {
        /// Encoding of the rejected frame.
        encoding: String,
    },

    /// The message could not be turned into a pixel buffer.
    #[error("failed to decode image: {0}")]
    Decode(#[source] MessageError),

    /// The cropper found nothing to keep or refused the input.
    #[error("failed to crop image: {0}")]
    Crop(#[from] CropError),

    /// The cropped buffer could not be written back into a message.
    #[error("failed to encode cropped image: {0}")]
    Encode(#[source] MessageError),
}

/// Crops every incoming frame to its largest non-zero region.
#[derive(Debug, Clone)]
pub struct CropNonZeroNode {
    config: NodeConfig,
    cropper: NonZeroCropper,
    subscription: LazySubscription,
}

impl CropNonZeroNode {
    /// Create an inactive node.
    #[must_use]
    pub const fn new(config: NodeConfig) -> Self {
        Self {
            cropper: NonZeroCropper::new(config.crop),
            config,
            subscription: LazySubscription::new(),
        }
    }

    /// The configuration the node was built with.
    #[must_use]
    pub const fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Whether the node is currently listening to its input.
    #[must_use]
    pub const fn subscription_state(&self) -> SubscriptionState {
        self.subscription.state()
    }

    /// Report a change in the number of output subscribers.
    ///
    /// Returns what the host should do with the input subscription.
    pub fn on_publisher_matched(&mut self, subscriber_count: usize) -> Option<SubscriptionEvent> {
        let event = self.subscription.on_matched(subscriber_count);
        match event {
            Some(SubscriptionEvent::Subscribe) => info!(
                "{} has subscribers, subscribing to {} ({} transport)",
                self.config.output_topic, self.config.input_topic, self.config.image_transport
            ),
            Some(SubscriptionEvent::Unsubscribe) => info!(
                "{} has no subscribers, unsubscribing from {}",
                self.config.output_topic, self.config.input_topic
            ),
            None => {}
        }
        event
    }

    /// Handle one incoming frame.
    ///
    /// Returns the message to publish, or `None` if the frame was dropped.
    /// Frames arriving while inactive are dropped silently; failures are
    /// logged at error level.
    #[must_use]
    pub fn handle_image(&self, msg: ImageMessage) -> Option<ImageMessage> {
        if !self.subscription.is_active() {
            debug!("dropping frame from {}: no subscribers", msg.header.frame_id);
            return None;
        }
        match self.process(msg) {
            Ok(out) => {
                debug!(
                    "cropped {} to {}x{} [{}]",
                    out.header.frame_id, out.width, out.height, out.encoding
                );
                Some(out)
            }
            Err(e) => {
                error!("{e}");
                None
            }
        }
    }

    /// Crop one frame regardless of subscription state.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::NotSingleChannel`] for multi-channel
    /// encodings, otherwise the decode, crop, or encode failure.
    pub fn process(&self, msg: ImageMessage) -> Result<ImageMessage, FrameError> {
        let format = msg.format().map_err(FrameError::Decode)?;
        if !format.is_single_channel() {
            return Err(FrameError::NotSingleChannel {
                encoding: msg.encoding,
            });
        }
        let buffer = msg.to_buffer().map_err(FrameError::Decode)?;
        let ImageMessage {
            header, encoding, ..
        } = msg;
        let cropped = self.cropper.crop(buffer, header)?;
        debug!(
            "{}: kept region at ({}, {}) of size {}x{}",
            cropped.header.frame_id,
            cropped.rect.x,
            cropped.rect.y,
            cropped.rect.width,
            cropped.rect.height
        );
        ImageMessage::from_cropped(cropped, encoding).map_err(FrameError::Encode)
    }
}
