use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    audio: Audio,
    network: Network,
    stream: Stream,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Audio {
    capture_device: String,
    playback_device: String,
    sample_rate: u32,
    frame_size: usize,
    playback_period_size: usize,
}

#[derive(Deserialize)]
struct Network {
    channel_url: String,
    num_url: String,
    client_id: String,
}

#[derive(Deserialize)]
struct Stream {
    sink: String,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 应用信息
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 音频配置
    println!("cargo:rustc-env=CAPTURE_DEVICE={}", config.audio.capture_device);
    println!("cargo:rustc-env=PLAYBACK_DEVICE={}", config.audio.playback_device);
    println!("cargo:rustc-env=SAMPLE_RATE={}", config.audio.sample_rate);
    println!("cargo:rustc-env=FRAME_SIZE={}", config.audio.frame_size);
    println!(
        "cargo:rustc-env=PLAYBACK_PERIOD_SIZE={}",
        config.audio.playback_period_size
    );

    // 网络配置
    println!("cargo:rustc-env=CHANNEL_URL={}", config.network.channel_url);
    println!("cargo:rustc-env=NUM_URL={}", config.network.num_url);
    println!("cargo:rustc-env=CLIENT_ID={}", config.network.client_id);

    // 接收流配置
    println!("cargo:rustc-env=STREAM_SINK={}", config.stream.sink);
}
