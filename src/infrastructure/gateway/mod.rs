//! Chat Gateway - 聊天平台 WebSocket 客户端
//!
//! 聊天平台本体（连接管理、命令注册、语音传输）是外部协作者；这里
//! 只是一层薄胶水：收事件、发回执、转发语音控制与音频帧。
//!
//! - protocol: 网关线上协议的 serde 类型
//! - voice_session: 语音会话句柄与会话注册表
//! - ws_gateway: 连接与分发循环

mod protocol;
mod voice_session;
mod ws_gateway;

pub use protocol::{AutocompleteChoice, GatewayCommand, GatewayEvent, InteractionCommand, OutboundFrame};
pub use voice_session::{SessionRegistry, WsVoiceSession};
pub use ws_gateway::{ChatGateway, GatewayDeps};
