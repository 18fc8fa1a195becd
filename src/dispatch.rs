// ====================================================================================
// src/dispatch.rs - 入站消息分发
// ====================================================================================
use crate::{
    codec,
    models::{Envelope, FeedEntry, PartialRoomState},
    room::{RoomState, RoomStateAggregator},
    sink::{DEFAULT_USER_NAME, FeedSink, PresentationSink},
};

const DOCUMENT_TITLE_SUFFIX: &str = " - Bilibili Live";

// 一次页面会话的全部可变状态：房间快照 + 信息流 + 展示目标
pub struct Session<F, P> {
    room: RoomStateAggregator,
    feed: F,
    presentation: P,
}

impl<F: FeedSink, P: PresentationSink> Session<F, P> {
    pub fn new(feed: F, presentation: P) -> Self {
        Self { room: RoomStateAggregator::new(), feed, presentation }
    }

    pub fn room(&self) -> &RoomState {
        self.room.state()
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    // 解码失败只记录日志并丢弃该帧
    pub fn handle_frame(&mut self, raw: &str) {
        match codec::decode(raw) {
            Ok(envelope) => self.dispatch(envelope),
            Err(e) => tracing::warn!("Discarding malformed frame: {} (raw: {})", e, raw),
        }
    }

    pub fn dispatch(&mut self, envelope: Envelope) {
        tracing::debug!("Dispatching {} message", envelope.kind());
        match envelope {
            Envelope::Danmu(data) => self.feed.append(FeedEntry::Danmu {
                user_name: user_name_or_default(data.user_name),
                user_level: data.user_level,
                content: data.content.unwrap_or_default(),
            }),
            Envelope::Gift(data) => self.feed.append(FeedEntry::Gift {
                user_name: user_name_or_default(data.user_name),
                gift_name: data.gift_name,
                gift_count: data.gift_count,
            }),
            Envelope::SuperChat(data) => self.feed.append(FeedEntry::SuperChat {
                user_name: user_name_or_default(data.user_name),
                price: data.price,
                content: data.content.unwrap_or_default(),
            }),
            Envelope::RoomInfo(update) => {
                if let Some(title) = &update.title {
                    self.presentation.set_document_title(format!("{}{}", title, DOCUMENT_TITLE_SUFFIX));
                }
                self.room.merge(update, &mut self.presentation);
            }
            Envelope::StatsUpdate(update) => self.room.merge(update, &mut self.presentation),
            Envelope::Unknown { kind, payload } => {
                tracing::info!("Ignoring unknown message type {}: {}", kind, payload)
            }
        }
    }

    // 初始快照与 room_info 走同一条合并路径
    pub fn apply_snapshot(&mut self, snapshot: PartialRoomState) {
        self.dispatch(Envelope::RoomInfo(snapshot));
    }
}

fn user_name_or_default(name: Option<String>) -> String {
    match name {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_USER_NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomField;
    use crate::sink::{Feed, StatusBoard};

    fn session() -> Session<Feed, StatusBoard> {
        Session::new(Feed::default(), StatusBoard::default())
    }

    #[test]
    fn danmu_defaults_missing_user_and_content() {
        let mut s = session();
        s.handle_frame(r#"{"type":"danmu","data":{}}"#);
        assert_eq!(
            s.feed().entries(),
            &[FeedEntry::Danmu { user_name: "User".into(), user_level: None, content: String::new() }]
        );
    }

    #[test]
    fn feed_entries_follow_arrival_order() {
        let mut s = session();
        s.handle_frame(r#"{"type":"danmu","data":{"userName":"a","content":"first"}}"#);
        s.handle_frame(r#"{"type":"gift","data":{"userName":"b","giftName":"rose","giftCount":2}}"#);
        s.handle_frame(r#"{"type":"super_chat","data":{"userName":"c","price":30,"content":"third"}}"#);

        assert_eq!(
            s.feed().entries(),
            &[
                FeedEntry::Danmu { user_name: "a".into(), user_level: None, content: "first".into() },
                FeedEntry::Gift { user_name: "b".into(), gift_name: Some("rose".into()), gift_count: Some(2) },
                FeedEntry::SuperChat { user_name: "c".into(), price: Some(30.0), content: "third".into() },
            ]
        );
    }

    #[test]
    fn gift_without_name_or_count_is_rendered_partially() {
        let mut s = session();
        s.handle_frame(r#"{"type":"gift","data":{"userName":"b"}}"#);
        assert_eq!(
            s.feed().entries(),
            &[FeedEntry::Gift { user_name: "b".into(), gift_name: None, gift_count: None }]
        );
    }

    #[test]
    fn unknown_kind_has_no_observable_effect() {
        let mut s = session();
        s.handle_frame(r#"{"type":"guard_buy","data":{"title":"X","likes":5}}"#);
        assert!(s.feed().entries().is_empty());
        assert_eq!(s.room(), &RoomState::default());
        assert_eq!(s.presentation().field(RoomField::Title), None);
    }

    #[test]
    fn malformed_frame_is_absorbed() {
        let mut s = session();
        s.handle_frame("not json at all");
        s.handle_frame(r#"{"type":"stats_update","data":{"likes":-1}}"#);
        assert!(s.feed().entries().is_empty());
        assert_eq!(s.room(), &RoomState::default());
    }

    #[test]
    fn room_info_and_stats_update_share_merge_semantics() {
        let mut s = session();
        s.handle_frame(r#"{"type":"room_info","data":{"title":"A","onlineCount":10}}"#);
        s.handle_frame(r#"{"type":"stats_update","data":{"onlineCount":20}}"#);

        let room = s.room();
        assert_eq!(room.title(), Some("A"));
        assert_eq!(room.online_count(), Some(20));
        assert_eq!(room.streamer_name(), None);
        assert_eq!(room.popularity(), None);
        assert_eq!(room.likes(), None);
        assert_eq!(s.presentation().document_title(), Some("A - Bilibili Live"));
        assert_eq!(s.presentation().field(RoomField::OnlineCount), Some("20"));
    }

    #[test]
    fn only_room_info_touches_document_title() {
        let mut s = session();
        s.handle_frame(r#"{"type":"stats_update","data":{"title":"B"}}"#);
        assert_eq!(s.room().title(), Some("B"));
        assert_eq!(s.presentation().document_title(), None);
    }

    #[test]
    fn snapshot_merges_like_room_info() {
        let mut s = session();
        s.apply_snapshot(PartialRoomState { streamer_name: Some("kiki".into()), ..Default::default() });
        assert_eq!(s.room().streamer_name(), Some("kiki"));
        assert_eq!(s.presentation().field(RoomField::StreamerName), Some("Streamer: kiki"));
    }
}
