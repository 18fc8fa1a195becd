// ====================================================================================
// src/sink.rs - 信息流与展示输出
// ====================================================================================
use crate::models::{FeedEntry, RoomField};
use std::collections::HashMap;
use std::io::Write;

pub const DEFAULT_USER_NAME: &str = "User";

/// 信息流的追加目标，条目顺序即到达顺序。
pub trait FeedSink {
    fn append(&mut self, entry: FeedEntry);
}

/// 房间信息字段的展示目标。
pub trait PresentationSink {
    fn set_field(&mut self, field: RoomField, text: String);
    fn set_document_title(&mut self, title: String);
}

// 内存中的信息流，只追加不淘汰
#[derive(Debug, Default)]
pub struct Feed {
    entries: Vec<FeedEntry>,
}

impl Feed {
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn system_messages(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                FeedEntry::System { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl FeedSink for Feed {
    fn append(&mut self, entry: FeedEntry) {
        self.entries.push(entry);
    }
}

// 记录每个字段最近一次展示的文本
#[derive(Debug, Default)]
pub struct StatusBoard {
    fields: HashMap<RoomField, String>,
    document_title: Option<String>,
}

impl StatusBoard {
    pub fn field(&self, field: RoomField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn document_title(&self) -> Option<&str> {
        self.document_title.as_deref()
    }
}

impl PresentationSink for StatusBoard {
    fn set_field(&mut self, field: RoomField, text: String) {
        self.fields.insert(field, text);
    }

    fn set_document_title(&mut self, title: String) {
        self.document_title = Some(title);
    }
}

/// 把条目渲染成一行文本。缺失的礼物字段原样显示为 `?`。
pub fn render_entry(entry: &FeedEntry) -> String {
    match entry {
        FeedEntry::Danmu { user_name, user_level, content } => match user_level {
            Some(level) if *level > 0 => format!("{} LV{}: {}", user_name, level, content),
            _ => format!("{}: {}", user_name, content),
        },
        FeedEntry::Gift { user_name, gift_name, gift_count } => format!(
            "{} sent {} x{}",
            user_name,
            gift_name.as_deref().unwrap_or("?"),
            gift_count.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()),
        ),
        FeedEntry::SuperChat { user_name, price, content } => format!(
            "{} [¥{}] {}",
            user_name,
            price.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string()),
            content,
        ),
        FeedEntry::System { message } => format!("-- {} --", message),
    }
}

fn field_label(field: RoomField) -> &'static str {
    match field {
        RoomField::Title => "title",
        RoomField::StreamerName => "streamer",
        RoomField::OnlineCount => "online",
        RoomField::Popularity => "popularity",
        RoomField::Likes => "likes",
    }
}

// 终端输出，同时充当信息流和展示目标
pub struct TerminalSink<W: Write> {
    out: W,
    show_timestamp: bool,
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout(show_timestamp: bool) -> Self {
        Self { out: std::io::stdout(), show_timestamp }
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, show_timestamp: bool) -> Self {
        Self { out, show_timestamp }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        let result = if self.show_timestamp {
            let now = chrono::Local::now().format("%H:%M:%S");
            writeln!(self.out, "[{}] {}", now, line)
        } else {
            writeln!(self.out, "{}", line)
        };
        if let Err(e) = result.and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write> FeedSink for TerminalSink<W> {
    fn append(&mut self, entry: FeedEntry) {
        let line = render_entry(&entry);
        self.write_line(&line);
    }
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn set_field(&mut self, field: RoomField, text: String) {
        let line = format!("* {}: {}", field_label(field), text);
        self.write_line(&line);
    }

    fn set_document_title(&mut self, title: String) {
        // 终端标题: OSC 0
        if let Err(e) = write!(self.out, "\x1b]0;{}\x07", title) {
            tracing::debug!("Failed to set terminal title: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn danmu_level_is_omitted_when_absent_or_zero() {
        let with_level = FeedEntry::Danmu { user_name: "a".into(), user_level: Some(12), content: "hi".into() };
        let zero = FeedEntry::Danmu { user_name: "a".into(), user_level: Some(0), content: "hi".into() };
        assert_eq!(render_entry(&with_level), "a LV12: hi");
        assert_eq!(render_entry(&zero), "a: hi");
    }

    #[test]
    fn partial_gift_renders_placeholders() {
        let gift = FeedEntry::Gift { user_name: "b".into(), gift_name: None, gift_count: Some(3) };
        assert_eq!(render_entry(&gift), "b sent ? x3");
    }

    #[test]
    fn super_chat_shows_price() {
        let sc = FeedEntry::SuperChat { user_name: "c".into(), price: Some(30.0), content: "gg".into() };
        assert_eq!(render_entry(&sc), "c [¥30] gg");
    }

    #[test]
    fn terminal_sink_writes_one_line_per_entry() {
        let mut sink = TerminalSink::new(Vec::new(), false);
        sink.append(FeedEntry::system("connected"));
        sink.set_field(RoomField::OnlineCount, "1,000".into());
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "-- connected --\n* online: 1,000\n");
    }

    #[test]
    fn feed_preserves_arrival_order() {
        let mut feed = Feed::default();
        feed.append(FeedEntry::system("one"));
        feed.append(FeedEntry::system("two"));
        assert_eq!(feed.system_messages(), vec!["one", "two"]);
    }
}
