//! Edge TTS Client - 调用 Edge 浏览器 "Read Aloud" 的云端合成服务
//!
//! 实现 SynthesisProviderPort trait。
//!
//! 外部 API:
//! - 目录: GET https://speech.platform.bing.com/.../voices/list（JSON 数组）
//! - 合成: WebSocket，先发 speech.config，再发 SSML；音频以二进制帧返回，
//!   帧头前 2 字节是大端的头部长度，头部含 `Path:audio` 的帧带 MP3 数据，
//!   文本帧出现 `Path:turn.end` 表示一条流结束
//! - 接入需要 Sec-MS-GEC DRM token：对 5 分钟对齐的 Windows 文件时间刻度
//!   拼接固定 client token 做 SHA-256，取大写十六进制

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use crate::application::ports::{
    ChunkKind, RawVoice, SynthesisChunk, SynthesisError, SynthesisProviderPort, SynthesisStream,
};

const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";
/// 1601-01-01 与 1970-01-01 之间的秒数
const WIN_EPOCH: u64 = 11_644_473_600;

const VOICES_URL: &str =
    "https://speech.platform.bing.com/consumer/speech/synthesize/readaloud/voices/list";
const SYNTH_URL: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1";

const ORIGIN: &str = "chrome-extension://jdiccldimpdaibmpdkjnbmckianbfold";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36 Edg/143.0.0.0";

/// 生成 Sec-MS-GEC token
///
/// 1. 取当前 unix 秒数，加 Windows 纪元偏移
/// 2. 向下取整到 300 秒边界
/// 3. 换算为 100 纳秒刻度
/// 4. SHA-256("{ticks}{TRUSTED_CLIENT_TOKEN}") 的大写十六进制
fn generate_sec_ms_gec() -> String {
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let mut ticks = unix_secs + WIN_EPOCH;
    ticks -= ticks % 300;
    let ticks_100ns = ticks as u128 * 10_000_000;
    let mut hasher = Sha256::new();
    hasher.update(format!("{}{}", ticks_100ns, TRUSTED_CLIENT_TOKEN).as_bytes());
    hex::encode_upper(hasher.finalize())
}

/// SSML 特殊字符转义
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 从音色 id 推出 SSML 的 xml:lang（`ja-JP-NanamiNeural` → `ja-JP`）
fn lang_of(voice_id: &str) -> &str {
    let mut dashes = voice_id.match_indices('-');
    match (dashes.next(), dashes.next()) {
        (Some(_), Some((idx, _))) => &voice_id[..idx],
        _ => voice_id,
    }
}

fn build_ssml(text: &str, voice_id: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{}'>\
         <voice name='{}'>\
         <prosody rate='+0%' pitch='+0Hz'>{}</prosody>\
         </voice>\
         </speak>",
        lang_of(voice_id),
        voice_id,
        xml_escape(text)
    )
}

/// 解析一个二进制帧
///
/// 前 2 字节是大端头部长度；头部含 `Path:audio` 的是音频帧，其余按
/// 元数据处理。畸形帧返回 None。
fn parse_binary_frame(data: &[u8]) -> Option<SynthesisChunk> {
    if data.len() < 2 {
        return None;
    }
    let header_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    if header_len + 2 > data.len() {
        return None;
    }
    let header = &data[2..2 + header_len];
    let is_audio = header
        .windows(b"Path:audio".len())
        .any(|w| w == b"Path:audio");
    let payload = data[2 + header_len..].to_vec();
    Some(SynthesisChunk {
        kind: if is_audio {
            ChunkKind::Audio
        } else {
            ChunkKind::Metadata
        },
        data: payload,
    })
}

/// 目录接口返回的条目
#[derive(Debug, Deserialize)]
struct VoiceListEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ShortName")]
    short_name: String,
    #[serde(rename = "Locale")]
    locale: String,
}

/// 过滤到目标 locale 并映射到端口类型
fn filter_locale(entries: Vec<VoiceListEntry>, locale: &str) -> Vec<RawVoice> {
    entries
        .into_iter()
        .filter(|e| e.locale == locale)
        .map(|e| RawVoice {
            label: e.name,
            short_id: e.short_name,
            locale: e.locale,
        })
        .collect()
}

/// Edge TTS 客户端配置
#[derive(Debug, Clone)]
pub struct EdgeTtsClientConfig {
    /// 单次合成的超时时间（秒），约束连接与整条流的读取
    pub timeout_secs: u64,
}

impl Default for EdgeTtsClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl EdgeTtsClientConfig {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

/// Edge TTS 客户端
pub struct EdgeTtsClient {
    client: reqwest::Client,
    config: EdgeTtsClientConfig,
}

impl EdgeTtsClient {
    pub fn new(config: EdgeTtsClientConfig) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn with_default_config() -> Result<Self, SynthesisError> {
        Self::new(EdgeTtsClientConfig::default())
    }

    fn voices_url(&self) -> String {
        format!(
            "{}?trustedclienttoken={}&Sec-MS-GEC={}&Sec-MS-GEC-Version=1-143.0.3650.75",
            VOICES_URL,
            TRUSTED_CLIENT_TOKEN,
            generate_sec_ms_gec()
        )
    }

    fn synth_url(&self) -> String {
        format!(
            "{}?TrustedClientToken={}&ConnectionId={}&Sec-MS-GEC={}&Sec-MS-GEC-Version=1-143.0.3650.75",
            SYNTH_URL,
            TRUSTED_CLIENT_TOKEN,
            uuid::Uuid::new_v4().as_simple(),
            generate_sec_ms_gec()
        )
    }
}

#[async_trait]
impl SynthesisProviderPort for EdgeTtsClient {
    async fn list_voices(&self, locale: &str) -> Result<Vec<RawVoice>, SynthesisError> {
        let response = self
            .client
            .get(self.voices_url())
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else {
                    SynthesisError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::ProviderError(format!(
                "voice list returned HTTP {}",
                status
            )));
        }

        let entries: Vec<VoiceListEntry> = response
            .json()
            .await
            .map_err(|e| SynthesisError::ProtocolError(format!("bad voice list: {}", e)))?;

        let voices = filter_locale(entries, locale);
        tracing::debug!(locale = %locale, count = voices.len(), "Voice list fetched");
        Ok(voices)
    }

    async fn open_stream(
        &self,
        text: &str,
        voice_id: &str,
    ) -> Result<SynthesisStream, SynthesisError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let mut request = self
            .synth_url()
            .into_client_request()
            .map_err(|e| SynthesisError::ProtocolError(e.to_string()))?;
        {
            let headers = request.headers_mut();
            headers.insert("Origin", HeaderValue::from_static(ORIGIN));
            headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
        }

        let (mut ws, _response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| SynthesisError::Timeout)?
            .map_err(|e| SynthesisError::NetworkError(format!("websocket connect: {}", e)))?;

        let config_msg =
            "X-Timestamp:Thu Jan 01 1970 00:00:00 GMT+0000 (Coordinated Universal Time)\r\n\
             Content-Type:application/json; charset=utf-8\r\n\
             Path:speech.config\r\n\r\n\
             {\"context\":{\"synthesis\":{\"audio\":{\"metadataoptions\":\
             {\"sentenceBoundaryEnabled\":\"false\",\"wordBoundaryEnabled\":\"false\"},\
             \"outputFormat\":\"audio-24khz-48kbitrate-mono-mp3\"}}}}";
        ws.send(Message::Text(config_msg.to_string()))
            .await
            .map_err(|e| SynthesisError::NetworkError(format!("send speech.config: {}", e)))?;

        let ssml_msg = format!(
            "X-RequestId:{}\r\n\
             Content-Type:application/ssml+xml\r\n\
             X-Timestamp:Thu Jan 01 1970 00:00:00 GMT+0000 (Coordinated Universal Time)Z\r\n\
             Path:ssml\r\n\r\n\
             {}",
            uuid::Uuid::new_v4().as_simple(),
            build_ssml(text, voice_id)
        );
        ws.send(Message::Text(ssml_msg))
            .await
            .map_err(|e| SynthesisError::NetworkError(format!("send ssml: {}", e)))?;

        // 读取侧搬到后台任务，分片经有界 channel 惰性交给消费者
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let frame = match tokio::time::timeout_at(deadline, ws.next()).await {
                    Err(_) => {
                        let _ = tx.send(Err(SynthesisError::Timeout)).await;
                        return;
                    }
                    Ok(None) => return, // 连接关闭
                    Ok(Some(Err(e))) => {
                        let _ = tx
                            .send(Err(SynthesisError::NetworkError(e.to_string())))
                            .await;
                        return;
                    }
                    Ok(Some(Ok(frame))) => frame,
                };

                match frame {
                    Message::Text(text) => {
                        if text.contains("Path:turn.end") {
                            return; // 流正常结束
                        }
                        let chunk = SynthesisChunk {
                            kind: ChunkKind::Metadata,
                            data: text.into_bytes(),
                        };
                        if tx.send(Ok(chunk)).await.is_err() {
                            return; // 消费者不再读
                        }
                    }
                    Message::Binary(data) => {
                        if let Some(chunk) = parse_binary_frame(&data) {
                            if tx.send(Ok(chunk)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Message::Close(_) => return,
                    // Ping/Pong 由 tungstenite 处理
                    _ => {}
                }
            }
        });

        Ok(SynthesisStream::from_channel(rx))
    }
}
