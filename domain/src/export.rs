//! 推流凭据导出为纯文本。

use chrono::{DateTime, Local, Utc};

use crate::StreamCredentials;

/// `stream_info_<房间号>_<ISO 时间，冒号和点替换为横线>.txt`
pub fn report_file_name(room_id: &str, at: DateTime<Utc>) -> String {
    let stamp = at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string().replace([':', '.'], "-");
    format!("stream_info_{}_{}.txt", room_id, stamp)
}

pub fn report_contents(room_id: &str, stream: &StreamCredentials, at: DateTime<Local>) -> String {
    format!(
        "直播间号: {}\n推流地址: {}\n推流密钥: {}\n生成时间: {}",
        room_id,
        stream.addr,
        stream.code,
        at.format("%Y/%m/%d %H:%M:%S")
    )
}
