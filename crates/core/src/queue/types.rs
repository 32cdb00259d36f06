/// A message handed out by [`super::MessageQueue::receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Stable id of the message across redeliveries.
    pub message_id: String,
    /// Serialized payload.
    pub body: String,
    /// Token identifying this particular delivery; required to delete it.
    pub receipt: String,
    /// How many times the message has been received, this delivery included.
    pub receive_count: u32,
}
