//! Merges runs of caption-less media messages into the next captioned
//! message from the same author.

use crate::platform::RawMessage;
use serde::Serialize;
use std::collections::VecDeque;

/// A captioned message plus the caption-less messages merged into it, in
/// delivery order. This is the unit the read API serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingGroup {
    pub primary: RawMessage,
    pub follow_ons: Vec<RawMessage>,
}

impl ListingGroup {
    pub fn id(&self) -> i64 {
        self.primary.id
    }

    /// The primary message followed by its follow-ons.
    pub fn messages(&self) -> impl Iterator<Item = &RawMessage> {
        std::iter::once(&self.primary).chain(self.follow_ons.iter())
    }
}

#[derive(Debug)]
pub enum GroupingStep {
    /// Caption-less message held until a captioned one claims it.
    Buffered,
    /// Message without an author; never grouped or persisted.
    Dropped,
    Flushed(ListingGroup),
}

/// Two-state processor: buffering while caption-less messages are pending,
/// flushed once a captioned message has claimed (or sealed) them.
#[derive(Debug, Default)]
pub struct FollowOnGrouper {
    pending: VecDeque<RawMessage>,
    unanchored: Vec<RawMessage>,
}

impl FollowOnGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_buffering(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn push(&mut self, message: RawMessage) -> GroupingStep {
        let Some(author_id) = message.author_id() else {
            return GroupingStep::Dropped;
        };
        if !message.has_body() {
            self.pending.push_back(message);
            return GroupingStep::Buffered;
        }

        // Everything pending is caption-less, so only the author can break the run.
        let run = self
            .pending
            .iter()
            .rev()
            .take_while(|pending| pending.author_id() == Some(author_id))
            .count();
        let follow_ons: Vec<RawMessage> = self.pending.split_off(self.pending.len() - run).into();

        // Whatever the run did not claim now sits behind a captioned message
        // and can never become contiguous with a later one.
        self.unanchored.extend(self.pending.drain(..));

        GroupingStep::Flushed(ListingGroup {
            primary: message,
            follow_ons,
        })
    }

    /// Ends the stream and hands back every message no group claimed.
    pub fn finish(mut self) -> Vec<RawMessage> {
        self.unanchored.extend(self.pending.drain(..));
        self.unanchored
    }
}

/// Groups an ordered history in one go. Unclaimed messages are discarded.
pub fn group_messages<I>(messages: I) -> Vec<ListingGroup>
where
    I: IntoIterator<Item = RawMessage>,
{
    let mut grouper = FollowOnGrouper::new();
    let mut groups = Vec::new();
    for message in messages {
        if let GroupingStep::Flushed(group) = grouper.push(message) {
            groups.push(group);
        }
    }
    groups
}
