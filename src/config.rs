// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default = "default_public_root")]
    public_root: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_local")]
    local: bool,
    #[serde(default = "default_max_request_size")]
    max_request_size: usize,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_public_root() -> String {
    "public".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_local() -> bool {
    true
}

fn default_max_request_size() -> usize {
    1048576 // 1MB
}

impl Config {
    pub fn new() -> Self {
        Self {
            data_dir: default_data_dir(),
            public_root: default_public_root(),
            port: default_port(),
            worker_threads: 0,
            local: default_local(),
            max_request_size: default_max_request_size(),
        }
    }

    /// 读取 TOML 配置。文件缺失或格式错误时退回默认配置，不会中止启动
    pub fn from_toml(filename: &str) -> Self {
        let raw_config = match fs::read_to_string(filename) {
            Ok(s) => Self::from_toml_str(&s),
            Err(e) => {
                error!("无法读取配置文件{}：{}，使用默认配置", filename, e);
                Config::new()
            }
        };
        raw_config.normalized()
    }

    pub fn from_toml_str(s: &str) -> Self {
        match toml::from_str(s) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}，使用默认配置", e);
                Config::new()
            }
        }
    }

    fn normalized(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.max_request_size == 0 {
            warn!("max_request_size被设置为0，这将拒绝所有请求，因此该值将被改为1MB。");
            self.max_request_size = default_max_request_size();
        }
        self
    }

    /// 测试用：指定数据目录与静态目录
    pub fn with_dirs(data_dir: &str, public_root: &str) -> Self {
        Self {
            data_dir: data_dir.to_string(),
            public_root: public_root.to_string(),
            ..Self::new()
        }
        .normalized()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    pub fn public_root(&self) -> &str {
        &self.public_root
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }
}
