//! Yomiage - 聊天转语音朗读 bot
//!
//! 架构（六边形）:
//! - Domain: text, voice/ (文本归一化与音色目录)
//! - Application: playback (队列 + 控制器), intake, commands, queries, ports
//! - Infrastructure: gateway (WebSocket 客户端), adapters (Edge TTS), memory

use std::sync::Arc;

use tokio::sync::mpsc;
use yomiage::application::{
    load_catalog, JoinHandler, LeaveHandler, MessageIntake, PlaybackController,
    SelectSpeakerHandler, SpeakerAutocompleteHandler, SpeechSynthesizer,
};
use yomiage::config::{load_config, print_config};
use yomiage::infrastructure::adapters::{EdgeTtsClient, EdgeTtsClientConfig};
use yomiage::infrastructure::gateway::{ChatGateway, GatewayDeps, SessionRegistry};
use yomiage::infrastructure::memory::InMemoryGuildConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},yomiage={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Yomiage - 聊天转语音朗读 bot");
    print_config(&config);

    // 创建 Edge TTS 客户端
    let tts_config = EdgeTtsClientConfig::new(config.tts.timeout_secs);
    let provider = Arc::new(EdgeTtsClient::new(tts_config)?);

    // 拉取音色目录（拉不到就空目录启动，目录相关命令降级）
    let catalog = Arc::new(load_catalog(provider.as_ref(), &config.tts.locale).await);
    tracing::info!(voices = catalog.len(), "Voice catalog loaded");

    // 每服务器音色选择（进程内存储，重启即回到默认音色）
    let guild_config = Arc::new(InMemoryGuildConfig::new());

    // 播放控制器与消息入口
    let controller = Arc::new(PlaybackController::new(
        SpeechSynthesizer::new(provider),
        catalog.clone(),
        guild_config.clone(),
    ));
    let intake = Arc::new(MessageIntake::new(
        controller.clone(),
        config.gateway.prefix_char(),
    ));

    // 出站帧通道与语音会话注册表
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let registry = Arc::new(SessionRegistry::new(outbound_tx.clone()));

    // 命令处理器
    let deps = GatewayDeps {
        controller: controller.clone(),
        intake,
        join: JoinHandler::new(
            registry.clone(),
            controller.clone(),
            guild_config.clone(),
            catalog.clone(),
        ),
        leave: LeaveHandler::new(controller),
        speaker: SelectSpeakerHandler::new(catalog.clone(), guild_config.clone()),
        autocomplete: SpeakerAutocompleteHandler::new(catalog.clone()),
        guild_config,
        catalog,
    };

    let gateway = ChatGateway::new(
        config.gateway.clone(),
        registry,
        outbound_tx,
        outbound_rx,
        deps,
    );

    tracing::info!("Starting gateway client...");

    // 网关循环自带重连，只有退出信号能结束进程
    tokio::select! {
        _ = gateway.run() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Received shutdown signal");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
