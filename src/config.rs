#[derive(Debug, Clone)]
pub struct Config {
    // 应用信息
    pub app_name: &'static str,
    pub app_version: &'static str,

    // 音频配置（静态部分）
    pub capture_device: &'static str,
    pub playback_device: &'static str,
    pub sample_rate: u32,
    pub frame_size: usize,
    pub playback_period_size: usize,

    // 网络配置
    pub channel_url: &'static str,
    pub num_url: &'static str,

    // 客户端标识（动态部分，可在运行时修改）
    pub client_id: String,

    // 接收流配置
    pub stream_sink: &'static str,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            capture_device: env!("CAPTURE_DEVICE"),
            playback_device: env!("PLAYBACK_DEVICE"),
            sample_rate: env!("SAMPLE_RATE")
                .parse()
                .map_err(|_| "Failed to parse SAMPLE_RATE")?,
            frame_size: env!("FRAME_SIZE")
                .parse()
                .map_err(|_| "Failed to parse FRAME_SIZE")?,
            playback_period_size: env!("PLAYBACK_PERIOD_SIZE")
                .parse()
                .map_err(|_| "Failed to parse PLAYBACK_PERIOD_SIZE")?,

            channel_url: env!("CHANNEL_URL"),
            num_url: env!("NUM_URL"),

            // 客户端标识初始化为config.toml中的值
            client_id: env!("CLIENT_ID").to_string(),

            stream_sink: env!("STREAM_SINK"),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_time_values_parse() {
        let config = Config::new().unwrap();
        assert_eq!(config.frame_size, 2048);
        assert!(config.channel_url.starts_with("ws://"));
        assert!(!config.app_name.is_empty());
    }
}
