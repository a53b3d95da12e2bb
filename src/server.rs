// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 连接处理
//!
//! 接收循环为每个 TCP 连接派生一个 tokio 任务。每个连接只处理一个请求，
//! 响应带 `Connection: close`。

use crate::{
    config::Config,
    exception::Exception,
    handler,
    param::HttpRequestMethod,
    request::{expected_len, Request},
    response::Response,
    router::{route, strip_query},
    store::{DirStore, FileStore},
    util::{is_safe_relative, percent_decode},
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

/// 所有连接共享的状态
pub struct AppState {
    config: Config,
    store: Arc<dyn FileStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn FileStore>) -> Self {
        Self { config, store }
    }

    /// 以配置中的数据目录打开 [`DirStore`]
    pub fn open(config: Config) -> Result<Self, Exception> {
        let store = DirStore::open(config.data_dir())?;
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn FileStore {
        self.store.as_ref()
    }
}

// 锁中毒时仍取出内部数据，计数器与停机标志不会处于不一致状态
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 活跃连接计数。任务结束（包括 panic 展开）时在 `Drop` 中减一
struct ConnectionCount(Arc<Mutex<u32>>);

impl ConnectionCount {
    fn enter(counter: Arc<Mutex<u32>>) -> Self {
        *lock(&counter) += 1;
        Self(counter)
    }
}

impl Drop for ConnectionCount {
    fn drop(&mut self) {
        let mut count = lock(&self.0);
        *count = count.saturating_sub(1);
    }
}

/// 主事件循环：持续接收新连接并分发到 tokio 线程池
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown_flag: Arc<Mutex<bool>>,
    active_connection: Arc<Mutex<u32>>,
) {
    let mut id: u128 = 0;
    loop {
        if *lock(&shutdown_flag) {
            info!("主循环接收到停机指令，正在退出...");
            break;
        }

        let (mut stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("接收TCP连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let state = Arc::clone(&state);
        let active_connection = Arc::clone(&active_connection);
        tokio::spawn(async move {
            let _counted = ConnectionCount::enter(active_connection);
            handle_connection(&mut stream, id, &state).await;
        });
        id += 1;
    }
}

/// 读取完整的请求报文。对端在发送任何数据前关闭连接时返回 `Ok(None)`
async fn read_request(
    stream: &mut TcpStream,
    id: u128,
    limit: usize,
) -> Result<Option<Vec<u8>>, Exception> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = vec![0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(n) => n,
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return Ok(None);
            }
        };
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if buffer.len() > limit {
            return Err(Exception::RequestTooLarge);
        }
        if let Some(expected) = expected_len(&buffer)? {
            if expected > limit {
                return Err(Exception::RequestTooLarge);
            }
            if buffer.len() >= expected {
                break;
            }
        }
    }
    match buffer.is_empty() {
        true => Ok(None),
        false => Ok(Some(buffer)),
    }
}

/// 在静态目录中查找请求的文件，只接受普通文件
fn static_file(public_root: &str, target: &str) -> Option<PathBuf> {
    let decoded = percent_decode(strip_query(target), false);
    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() || !is_safe_relative(Path::new(relative)) {
        return None;
    }
    let path = Path::new(public_root).join(relative);
    match path.is_file() {
        true => Some(path),
        false => None,
    }
}

/// 单个连接的完整生命周期：读取、解析、路由、处理、渲染、写回
pub async fn handle_connection(stream: &mut TcpStream, id: u128, state: &AppState) {
    let buffer = match read_request(stream, id, state.config.max_request_size()).await {
        Ok(Some(buffer)) => buffer,
        Ok(None) => return,
        Err(e) => {
            warn!(
                "[ID{}]无法接收请求报文：{}（上限{}字节）",
                id,
                e,
                state.config.max_request_size()
            );
            write_response(stream, id, &Response::from_exception(e, id)).await;
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，共{}字节", id, buffer.len());

    let start_time = Instant::now();

    let request = match Request::try_from(&buffer, id) {
        Ok(req) => req,
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {}", id, e);
            write_response(stream, id, &Response::from_exception(e, id)).await;
            return;
        }
    };
    debug!("[ID{}]成功解析HTTP请求", id);

    let readable = matches!(
        request.method(),
        HttpRequestMethod::Get | HttpRequestMethod::Head
    );
    let response = match static_file(state.config.public_root(), request.path()) {
        Some(path) if readable => {
            debug!("[ID{}]命中静态资源：{}", id, path.display());
            Response::from_file(&path, &request, id)
        }
        _ => {
            let route = route(request.method(), request.path());
            debug!("[ID{}]路由解析完毕：{:?}", id, route);
            let outcome = handler::handle(id, &route, &request, state.store());
            Response::from_outcome(&outcome, &request, id)
        }
    };

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}, ",
        id,
        request.version(),
        request.path(),
        request.method(),
        response.status_code(),
        response.information(),
        request.user_agent(),
    );

    write_response(stream, id, &response).await;
}

async fn write_response(stream: &mut TcpStream, id: u128, response: &Response) {
    let response_bytes = response.as_bytes();
    debug!("[ID{}]发送响应，长度: {}", id, response_bytes.len());
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
}
