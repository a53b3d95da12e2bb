// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 文本文件服务
//!
//! 在单个数据目录上提供文本文件的增删改查：
//! - `/` 列出文件，`/create` 创建，`/files/:filename` 查看、修改、删除
//! - 每个请求先经过守卫管线（文件名格式、存在性、正文字段），再交给处理函数
//! - 静态目录中的资源优先直接返回
//! - 后台管理控制台（CLI 指令交互）

use fileserver::{server, AppState, Config};

use log::{error, info};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    process::ExitCode,
    sync::{Arc, Mutex},
};

fn main() -> ExitCode {
    // 1. 日志系统：通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 运行参数
    let config = Config::from_toml("config/development.toml");
    info!("配置文件已载入");
    info!("数据目录: {}", config.data_dir());
    info!("静态目录: {}", config.public_root());

    // 3. 工作线程数由配置决定
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建tokio运行时：{}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::open(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("无法打开数据目录：{}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(serve(state))
}

async fn serve(state: Arc<AppState>) -> ExitCode {
    // 支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
    let port: u16 = state.config().port();
    let address = match state.config().local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);

    let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return ExitCode::FAILURE;
        }
    };
    info!("端口{}绑定完成", port);

    // shutdown_flag: 停机标志，主循环在下一个连接到来时退出
    // active_connection: 当前并发连接数
    let shutdown_flag = Arc::new(Mutex::new(false));
    let active_connection = Arc::new(Mutex::new(0u32));

    tokio::spawn(console(
        Arc::clone(&shutdown_flag),
        Arc::clone(&active_connection),
    ));

    server::run(listener, state, shutdown_flag, active_connection).await;
    ExitCode::SUCCESS
}

/// 交互式管理控制台，读取标准输入中的运维指令
async fn console(shutdown_flag: Arc<Mutex<bool>>, active_connection: Arc<Mutex<u32>>) {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let cmd = input.trim();
        match cmd {
            "stop" => {
                *shutdown_flag.lock().unwrap_or_else(|p| p.into_inner()) = true;
                println!("停机指令已激活，服务器将在处理完下一个请求后关闭...");
                break;
            }
            "help" => {
                println!("== Fileserver Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("help   - 显示此帮助信息");
                println!("=====================");
            }
            "status" => {
                let active_count = *active_connection.lock().unwrap_or_else(|p| p.into_inner());
                println!("== Fileserver 状态 ===");
                println!("当前活跃连接数: {}", active_count);
                println!("=====================");
            }
            "" => {}
            _ => {
                println!("无效的命令：{}", cmd);
            }
        }
    }
}
