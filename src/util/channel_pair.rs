// Copyright (c) 2024 Mike Tsao. All rights reserved.

use crossbeam_channel::{Receiver, Sender};

/// A convenience struct to bundle both halves of a [crossbeam_channel]
/// together.
#[derive(Debug)]
pub struct ChannelPair<T> {
    /// The sending half.
    pub sender: Sender<T>,
    /// The receiving half.
    pub receiver: Receiver<T>,
}
impl<T> Default for ChannelPair<T> {
    fn default() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }
}
impl<T> ChannelPair<T> {
    /// Everything currently queued, without blocking.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_takes_everything_queued() {
        let pair = ChannelPair::<u8>::default();
        let _ = pair.sender.send(1);
        let _ = pair.sender.send(2);
        assert_eq!(pair.drain(), vec![1, 2]);
        assert!(pair.drain().is_empty());
    }
}
