use chrono::{DateTime, Utc};
use stowage_core::Query;
use stowage_db::{define_query, define_resource, Expression as _, SelectQuery};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelMessage {
    pub id: String,
    pub channel_name: String,
    pub posted_date: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

define_resource!(
    ChannelMessage as channel_message {
        table: "Message",
        columns: {
            #[primary_key]
            ID(id): String => "id",
            CHANNEL_NAME(channel_name): String => "channelName",
            POSTED_DATE(posted_date): DateTime<Utc> => "postedDate",
            AUTHOR(author): String => "author",
            TEXT(text): String => "text"
        }
    }
);

impl ChannelMessage {
    /// A message posted now, with an id derived from the posting time.
    pub fn new(channel: &str, author: &str, text: &str) -> Self {
        let posted_date = Utc::now();
        let id = format!(
            "{channel}-{}",
            posted_date
                .timestamp_nanos_opt()
                .unwrap_or_else(|| posted_date.timestamp_micros())
        );
        Self {
            id,
            channel_name: channel.to_string(),
            posted_date,
            author: author.to_string(),
            text: text.to_string(),
        }
    }
}

/// The newest messages in one channel.
#[derive(Debug)]
pub struct RecentChannelMessages {
    pub channel_name: String,
    pub limit: u32,
}

impl Default for RecentChannelMessages {
    fn default() -> Self {
        Self {
            channel_name: String::new(),
            limit: 20,
        }
    }
}

define_query!(
    RecentChannelMessages as recent_channel_messages {
        name: "RecentChannelMessages",
        params: {
            CHANNEL_NAME(channel_name): String => "channelName",
            LIMIT(limit): u32 => "limit"
        }
    }
);

impl Query for RecentChannelMessages {
    type Item = ChannelMessage;

    fn build(&self, select: SelectQuery<ChannelMessage>) -> SelectQuery<ChannelMessage> {
        select
            .filter(channel_message::CHANNEL_NAME.eq(self.channel_name.as_str()))
            .order_by_desc(channel_message::POSTED_DATE)
            .limit(self.limit)
    }
}
