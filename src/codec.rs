// ====================================================================================
// src/codec.rs - 入站帧解码
// ====================================================================================
use crate::{error::DecodeError, models::Envelope};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 将一帧文本解析为 `Envelope`。
///
/// 外层必须是 `{ "type": string, "data": object }`。未知的 `type` 不算错误，
/// 解码为 `Envelope::Unknown`；缺失 `data` 时按空对象处理。
pub fn decode(raw: &str) -> Result<Envelope, DecodeError> {
    let Value::Object(mut frame) = serde_json::from_str::<Value>(raw)? else {
        return Err(DecodeError::NotAnObject);
    };
    let kind = match frame.remove("type") {
        Some(Value::String(kind)) => kind,
        _ => return Err(DecodeError::MissingType),
    };
    // 数组等非对象 payload 也会被 serde 的结构体反序列化接受，这里先拦掉
    let data = match frame.remove("data") {
        Some(Value::Null) | None => Value::Object(Default::default()),
        Some(data @ Value::Object(_)) => data,
        Some(_) => return Err(DecodeError::DataNotAnObject { kind }),
    };

    let decoded = match kind.as_str() {
        "danmu" => Envelope::Danmu(payload("danmu", data)?),
        "room_info" => Envelope::RoomInfo(payload("room_info", data)?),
        "gift" => Envelope::Gift(payload("gift", data)?),
        "super_chat" => Envelope::SuperChat(payload("super_chat", data)?),
        "stats_update" => Envelope::StatsUpdate(payload("stats_update", data)?),
        _ => Envelope::Unknown { kind, payload: data },
    };
    Ok(decoded)
}

fn payload<T: DeserializeOwned>(kind: &'static str, data: Value) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|source| DecodeError::Payload { kind, source })
}
